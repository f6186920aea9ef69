//! Shared, swappable route table.
//!
//! Request handlers read the current tree without locking. A reload compiles
//! a complete new tree first and only then swaps it in, so readers see either
//! the old table or the new one, never a partially built one.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::routing::tree::RuleTree;

/// Lock-free holder of the active [`RuleTree`].
#[derive(Debug)]
pub struct RouteTable {
    current: ArcSwap<RuleTree>,
}

impl RouteTable {
    pub fn new(tree: RuleTree) -> Self {
        Self {
            current: ArcSwap::from_pointee(tree),
        }
    }

    /// Snapshot of the active tree. Stays valid across later swaps.
    pub fn load(&self) -> Arc<RuleTree> {
        self.current.load_full()
    }

    /// Install a freshly compiled tree, returning the one it replaced.
    pub fn swap(&self, tree: RuleTree) -> Arc<RuleTree> {
        let rules = tree.rule_count();
        let previous = self.current.swap(Arc::new(tree));
        tracing::info!(
            previous_rules = previous.rule_count(),
            rules,
            "Route table swapped"
        );
        previous
    }
}
