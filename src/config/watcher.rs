//! Routes file watcher for hot reload.
//!
//! Each change is loaded, validated and compiled in the watcher callback;
//! only a complete tree is handed to the receiver. A broken edit is logged
//! and the current table stays in service.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_routes;
use crate::routing::tree::RuleTree;

/// Watches a routes file and emits freshly compiled trees.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<RuleTree>,
}

impl ConfigWatcher {
    /// Create a watcher and the receiver for compiled trees.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<RuleTree>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. The returned handle must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    tracing::info!(path = ?path, "Routes file changed, recompiling");
                    match load_routes(&path) {
                        Ok((_, tree)) => {
                            if tx.send(tree).is_err() {
                                tracing::debug!("Route table receiver dropped");
                            }
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Reload rejected, keeping current routes");
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Routes watcher started");
        Ok(watcher)
    }
}
