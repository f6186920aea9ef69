//! restroute: REST resource route table compiler.
//!
//! # Architecture Overview
//!
//! ```text
//!   routes.toml ──▶ config (load, validate) ──▶ routing::RouteBuilder
//!                                                    │
//!                         ┌──────────────────────────┘
//!                         ▼
//!        resource expansion (nesting, only/except, var, bindings)
//!                         │
//!                         ▼
//!        RuleTree (groups + rules, ordered) ──▶ RouteTable (arc-swap)
//!                                                    ▲
//!   watcher (notify) ── recompiled tree ─────────────┘
//! ```

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};

use restroute::config::load_config;
use restroute::config::watcher::ConfigWatcher;
use restroute::observability::logging::{self, LogHandle};
use restroute::routing::{RouteBuilder, RouteTable, RuleTree};
use restroute::RoutesConfig;

#[derive(Parser)]
#[command(name = "restroute")]
#[command(about = "Compile REST resource declarations into a route table", long_about = None)]
struct Cli {
    /// Log level, overriding the routes file (RUST_LOG overrides both).
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a routes file and print the rule table
    Compile {
        path: PathBuf,

        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Compile a routes file, then recompile and swap on every change
    Watch { path: PathBuf },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let log = logging::init(cli.log_level.as_deref());

    match cli.command {
        Commands::Compile { path, format } => {
            let tree = compile(&path, &log)?;
            match format {
                Format::Text => print_table(&tree),
                Format::Json => println!("{}", serde_json::to_string_pretty(&tree.entries())?),
            }
        }
        Commands::Watch { path } => {
            let tree = compile(&path, &log)?;
            print_table(&tree);
            let table = RouteTable::new(tree);

            let (watcher, mut updates) = ConfigWatcher::new(&path);
            let _watcher = watcher.run()?;

            loop {
                tokio::select! {
                    Some(tree) = updates.recv() => {
                        table.swap(tree);
                        print_table(&table.load());
                    }
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
            tracing::info!("Watch stopped");
        }
    }

    Ok(())
}

fn compile(path: &Path, log: &LogHandle) -> Result<RuleTree, Box<dyn std::error::Error>> {
    let config: RoutesConfig = load_config(path)?;
    log.set_level(&config.observability.log_level);

    tracing::info!(
        path = ?path,
        eager = config.router.eager,
        resources = config.resources.len(),
        groups = config.groups.len(),
        "Routes file loaded"
    );

    Ok(RouteBuilder::from_config(&config)?)
}

fn print_table(tree: &RuleTree) {
    for entry in tree.entries() {
        let mut line = format!(
            "{:<7} /{:<40} {}",
            entry.verb.to_string(),
            entry.path,
            entry.target
        );
        if let Some(domain) = &entry.domain {
            line.push_str(&format!("  @{}", domain));
        }
        if entry.complete_match {
            line.push_str("  [exact]");
        }
        if let Some(model) = &entry.model {
            line.push_str(&format!("  model={}", model));
        }
        if let Some(validate) = &entry.validate {
            line.push_str(&format!("  validate={}", validate));
        }
        println!("{}", line);
    }
}
