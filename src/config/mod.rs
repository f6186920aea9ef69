//! Routes configuration subsystem.
//!
//! # Data Flow
//! ```text
//! routes file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RoutesConfig (validated, immutable)
//!     → RouteBuilder::from_config → RuleTree
//!
//! On change:
//!     watcher.rs detects change
//!     → loader.rs loads and compiles the new file
//!     → atomic swap of the shared RouteTable
//! ```
//!
//! # Design Decisions
//! - A file is accepted whole or not at all
//! - All fields have defaults to allow minimal files
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, load_routes, parse_config, ConfigError};
pub use schema::{GroupConfig, ResourceConfig, RestEntryConfig, RoutesConfig, RuleConfig};
