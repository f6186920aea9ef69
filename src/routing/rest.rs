//! REST action tables.
//!
//! A table maps action keys to `(verb, path suffix, action name)` in
//! declaration order. Order matters: it becomes the insertion order of the
//! emitted rules, and therefore match priority. `create` sits ahead of
//! `read` in the default table so `/create` is never captured as an `<id>`.

use serde::{Deserialize, Serialize};

use crate::routing::rule::Verb;

/// Placeholder substituted by `var` overrides in action suffixes.
pub const ID_PLACEHOLDER: &str = "<id>";

/// One entry of a REST action table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestAction {
    pub verb: Verb,
    /// Path suffix appended to the resource prefix, e.g. `/<id>/edit`.
    #[serde(default)]
    pub suffix: String,
    /// Method name appended to the resource's target path.
    pub action: String,
}

impl RestAction {
    pub fn new(verb: Verb, suffix: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            verb,
            suffix: suffix.into(),
            action: action.into(),
        }
    }
}

/// Ordered mapping of action key to [`RestAction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestTable {
    entries: Vec<(String, RestAction)>,
}

impl RestTable {
    /// An empty table.
    pub fn empty() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&RestAction> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, a)| a)
    }

    /// Add or override one action.
    ///
    /// An existing key keeps its position; a new key is appended.
    pub fn set(&mut self, key: impl Into<String>, action: RestAction) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = action,
            None => self.entries.push((key, action)),
        }
    }

    /// Remove an action, returning it if it was present.
    pub fn remove(&mut self, key: &str) -> Option<RestAction> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    /// Merge `other` into this table with [`RestTable::set`] semantics.
    pub fn merge(&mut self, other: RestTable) {
        for (key, action) in other.entries {
            self.set(key, action);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RestAction)> {
        self.entries.iter().map(|(k, a)| (k.as_str(), a))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl Default for RestTable {
    /// The seven conventional resource actions.
    fn default() -> Self {
        [
            ("index", RestAction::new(Verb::Get, "", "index")),
            ("create", RestAction::new(Verb::Get, "/create", "create")),
            ("edit", RestAction::new(Verb::Get, "/<id>/edit", "edit")),
            ("read", RestAction::new(Verb::Get, "/<id>", "read")),
            ("save", RestAction::new(Verb::Post, "", "save")),
            ("update", RestAction::new(Verb::Put, "/<id>", "update")),
            ("delete", RestAction::new(Verb::Delete, "/<id>", "delete")),
        ]
        .into_iter()
        .collect()
    }
}

impl<K: Into<String>> FromIterator<(K, RestAction)> for RestTable {
    fn from_iter<I: IntoIterator<Item = (K, RestAction)>>(iter: I) -> Self {
        let mut table = RestTable::empty();
        for (key, action) in iter {
            table.set(key, action);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_order() {
        let table = RestTable::default();
        let keys: Vec<&str> = table.keys().collect();
        assert_eq!(
            keys,
            vec!["index", "create", "edit", "read", "save", "update", "delete"]
        );
        assert_eq!(table.get("update").unwrap().verb, Verb::Put);
        assert_eq!(table.get("edit").unwrap().suffix, "/<id>/edit");
    }

    #[test]
    fn test_set_overrides_in_place() {
        let mut table = RestTable::default();
        table.set("read", RestAction::new(Verb::Get, "/<id>/show", "show"));
        table.set("archive", RestAction::new(Verb::Post, "/<id>/archive", "archive"));

        let keys: Vec<&str> = table.keys().collect();
        assert_eq!(keys[3], "read");
        assert_eq!(keys.last(), Some(&"archive"));
        assert_eq!(table.get("read").unwrap().action, "show");
        assert_eq!(table.len(), 8);
    }

    #[test]
    fn test_merge_and_remove() {
        let mut table = RestTable::default();
        let patch: RestTable = [("update", RestAction::new(Verb::Patch, "/<id>", "update"))]
            .into_iter()
            .collect();
        table.merge(patch);
        assert_eq!(table.get("update").unwrap().verb, Verb::Patch);
        assert_eq!(table.len(), 7);

        assert!(table.remove("delete").is_some());
        assert!(table.remove("delete").is_none());
        assert_eq!(table.len(), 6);
    }
}
