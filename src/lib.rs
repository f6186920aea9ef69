//! REST resource route table compiler.
//!
//! Expands resource declarations (`blog`, `blog.comment`, ...) and their REST
//! action tables into an ordered tree of concrete rules that an external
//! matcher can dispatch on.
//!
//! ```
//! use restroute::routing::{RouteBuilder, Verb};
//!
//! let mut router = RouteBuilder::new();
//! router
//!     .resource("post.comment", "index/comment")?
//!     .only(["index", "read"])
//!     .vars([("comment", "cid")])
//!     .register()?;
//! let tree = router.finish()?;
//!
//! let entries = tree.entries();
//! assert_eq!(entries[1].verb, Verb::Get);
//! assert_eq!(entries[1].path, "post/<post_id>/comment/<cid>");
//! assert_eq!(entries[1].target, "index/comment/read");
//! # Ok::<(), restroute::routing::ConfigurationError>(())
//! ```

pub mod config;
pub mod observability;
pub mod routing;

pub use config::schema::RoutesConfig;
pub use routing::{RouteBuilder, RouteTable, RuleTree};
