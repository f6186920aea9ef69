//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route declarations (builder calls or RoutesConfig)
//!     → router.rs   (active group, eager/lazy resource registration)
//!     → resource.rs (dotted name → nested prefix, only/except, var)
//!     → binder.rs   (resource_model / resource_validate)
//!     → tree.rs     (ordered groups + rules, inherited domain/options)
//!     → table.rs    (Arc-swapped, read by request dispatch)
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable afterwards
//! - Deterministic: the same declarations always yield the same tree
//! - Insertion order is match priority, so it is preserved everywhere
//! - A failing resource never leaves partial rules behind

pub mod binder;
pub mod error;
pub mod options;
pub mod resource;
pub mod rest;
pub mod router;
pub mod rule;
pub mod table;
pub mod tree;

pub use binder::AttributeBinder;
pub use error::{ConfigurationError, RouteResult};
pub use options::{OptionSet, ResolvedOptions};
pub use resource::{ResourceCompiler, ResourceSpec};
pub use rest::{RestAction, RestTable};
pub use router::{ResourceBuilder, RouteBuilder};
pub use rule::{BindingKind, BindingSpec, RuleNode, Verb};
pub use table::RouteTable;
pub use tree::{Child, ChildRef, GroupId, RouteEntry, RuleGroup, RuleId, RuleTree};
