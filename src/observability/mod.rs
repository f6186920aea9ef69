//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! routing / config produce tracing events:
//!     debug: every expanded rule (resource, action, verb, pattern, target)
//!     info:  resource compiled, routes compiled, table swapped
//!     warn/error: suspicious declarations, rejected reloads
//!     → logging.rs (subscriber, reloadable filter, stderr)
//! ```

pub mod logging;
