//! Structured logging.
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Installed before the routes file is read, so load and validation
//!   warnings are not lost
//! - `RUST_LOG` wins over `--log-level`, which wins over the routes file;
//!   the file's level is applied afterwards through a reload handle
//! - Library code only emits events; installing a subscriber is the binary's job

use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry};

/// Level used until the routes file says otherwise.
const BOOT_LEVEL: &str = "info";

/// Filter used when `RUST_LOG` is unset.
pub fn default_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(format!("restroute={}", level)).unwrap_or_else(|_| EnvFilter::new("restroute=info"))
}

/// Handle on the installed filter.
pub struct LogHandle {
    handle: reload::Handle<EnvFilter, Registry>,
    fixed: bool,
}

impl LogHandle {
    /// Whether `RUST_LOG` or an explicit level pinned the filter.
    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    /// Re-level to `level` unless the filter is pinned.
    pub fn set_level(&self, level: &str) {
        if self.fixed {
            return;
        }
        match self.handle.reload(default_filter(level)) {
            Ok(()) => tracing::debug!(level = %level, "Log level applied"),
            Err(err) => tracing::debug!(error = %err, "Log level not applied"),
        }
    }
}

/// Install the global subscriber, writing to stderr. A second call leaves
/// the first subscriber in place; its handle then re-levels nothing.
pub fn init(level: Option<&str>) -> LogHandle {
    let (filter, fixed) = match (EnvFilter::try_from_default_env(), level) {
        (Ok(filter), _) => (filter, true),
        (Err(_), Some(level)) => (default_filter(level), true),
        (Err(_), None) => (default_filter(BOOT_LEVEL), false),
    };
    let (filter, handle) = reload::Layer::new(filter);

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();

    if result.is_err() {
        tracing::debug!("Logging already initialized");
    }
    LogHandle { handle, fixed }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        assert_eq!(default_filter("debug").to_string(), "restroute=debug");
    }

    #[test]
    fn test_explicit_level_pins_filter() {
        let log = init(Some("debug"));
        assert!(log.is_fixed());
        log.set_level("error");
    }

    #[test]
    fn test_init_twice() {
        let first = init(None);
        let second = init(Some("debug"));
        first.set_level("warn");
        second.set_level("trace");
    }
}
