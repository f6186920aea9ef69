//! Loading and compiling routes files end to end.

use std::io::Write;
use std::path::Path;

use restroute::config::{load_routes, ConfigError};
use restroute::routing::{RouteTable, Verb};

fn demo_path() -> &'static Path {
    Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/demos/routes.toml"))
}

#[test]
fn demo_file_compiles() {
    let (config, tree) = load_routes(demo_path()).unwrap();
    assert!(!config.router.eager);

    let entries = tree.entries();
    let paths: Vec<(Verb, &str)> = entries.iter().map(|e| (e.verb, e.path.as_str())).collect();
    assert_eq!(
        paths,
        vec![
            (Verb::Get, ""),
            // blog: except edit, create
            (Verb::Get, "blog"),
            (Verb::Get, "blog/<id>"),
            (Verb::Post, "blog"),
            (Verb::Put, "blog/<id>"),
            (Verb::Delete, "blog/<id>"),
            // blog.comment: only index, read, save, like
            (Verb::Get, "blog/<blog_id>/comment"),
            (Verb::Get, "blog/<blog_id>/comment/<cid>"),
            (Verb::Post, "blog/<blog_id>/comment"),
            (Verb::Post, "blog/<blog_id>/comment/<cid>/like"),
            // api/user: inherits except create, edit
            (Verb::Get, "api/user"),
            (Verb::Get, "api/user/<uid>"),
            (Verb::Post, "api/user"),
            (Verb::Put, "api/user/<uid>"),
            (Verb::Delete, "api/user/<uid>"),
            // api/v2/order.item: replaced table
            (Verb::Get, "api/v2/order/<order_id>/item"),
            (Verb::Get, "api/v2/order/<order_id>/item/<id>"),
        ]
    );

    assert_eq!(entries[0].domain.as_deref(), Some("www.example.com"));
    assert!(!entries[0].complete_match);
    assert_eq!(entries[2].model.as_ref().unwrap().to_string(), "app\\model\\Blog");
    assert_eq!(entries[3].validate.as_ref().unwrap().to_string(), "app\\validate\\Blog");
    assert!(entries[1].model.is_none());
    assert_eq!(entries[16].target, "api/v2/item/detail");
    assert_eq!(entries[16].domain.as_deref(), Some("api.example.com"));
    assert!(entries[1..].iter().all(|e| e.complete_match));
}

#[test]
fn json_output_is_stable() {
    let (_, first) = load_routes(demo_path()).unwrap();
    let (_, second) = load_routes(demo_path()).unwrap();
    assert_eq!(
        serde_json::to_string(&first.entries()).unwrap(),
        serde_json::to_string(&second.entries()).unwrap()
    );

    let value = serde_json::to_value(&first.entries()).unwrap();
    assert_eq!(value[1]["verb"], "get");
    assert_eq!(value[1]["action"], "index");
}

#[test]
fn broken_resource_is_reported() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
        [[resources]]
        name = "blog"
        route = "index/blog"
        only = [1, 2]
        "#
    )
    .unwrap();

    // Shape errors in `only` are caught by serde before compilation.
    let err = load_routes(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn malformed_pass_through_option_fails_compilation() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
        [router]
        options = {{ var = "not-a-table" }}

        [[resources]]
        name = "blog"
        route = "index/blog"
        "#
    )
    .unwrap();

    let err = load_routes(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Compile(_)), "{err}");
}

#[test]
fn reload_swaps_whole_table() {
    let (_, tree) = load_routes(demo_path()).unwrap();
    let table = RouteTable::new(tree);
    let before = table.load();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
        [[resources]]
        name = "shop"
        route = "index/shop"
        only = ["index"]
        "#
    )
    .unwrap();
    let (_, next) = load_routes(file.path()).unwrap();
    table.swap(next);

    assert_eq!(before.rule_count(), 17);
    assert_eq!(table.load().rule_count(), 1);
}
