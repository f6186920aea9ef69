//! Group option sets.
//!
//! Options are stored loosely (key → JSON value) so that arbitrary
//! pass-through options survive compilation untouched. The handful of keys the
//! resource compiler understands are read back through [`ResolvedOptions`],
//! which checks their shape once per resource.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::routing::error::{ConfigurationError, RouteResult};
use crate::routing::rule::BindingSpec;

pub const ONLY: &str = "only";
pub const EXCEPT: &str = "except";
pub const VAR: &str = "var";
pub const RESOURCE_MODEL: &str = "resource_model";
pub const RESOURCE_VALIDATE: &str = "resource_validate";
pub const COMPLETE_MATCH: &str = "complete_match";

/// Options declared directly on one group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionSet {
    values: BTreeMap<String, Value>,
}

impl OptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for OptionSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = OptionSet::new();
        for (k, v) in iter {
            set.set(k, v);
        }
        set
    }
}

/// The compiler-relevant options of one resource, after inheritance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedOptions {
    pub only: Option<BTreeSet<String>>,
    pub except: BTreeSet<String>,
    pub vars: BTreeMap<String, String>,
    pub models: BTreeMap<String, BindingSpec>,
    pub validates: BTreeMap<String, BindingSpec>,
    pub complete_match: bool,
}

impl ResolvedOptions {
    /// Resolve every known key through `lookup`, which is expected to apply
    /// group inheritance. Absent keys fall back to defaults.
    pub fn resolve<'a, F>(lookup: F) -> RouteResult<Self>
    where
        F: Fn(&str) -> Option<&'a Value>,
    {
        Ok(Self {
            only: lookup(ONLY).map(|v| string_set(ONLY, v)).transpose()?,
            except: lookup(EXCEPT)
                .map(|v| string_set(EXCEPT, v))
                .transpose()?
                .unwrap_or_default(),
            vars: lookup(VAR)
                .map(|v| string_map(VAR, v))
                .transpose()?
                .unwrap_or_default(),
            models: lookup(RESOURCE_MODEL)
                .map(|v| binding_map(RESOURCE_MODEL, v))
                .transpose()?
                .unwrap_or_default(),
            validates: lookup(RESOURCE_VALIDATE)
                .map(|v| binding_map(RESOURCE_VALIDATE, v))
                .transpose()?
                .unwrap_or_default(),
            complete_match: match lookup(COMPLETE_MATCH) {
                None | Some(Value::Null) => false,
                Some(Value::Bool(b)) => *b,
                Some(_) => return Err(invalid(COMPLETE_MATCH, "expected a boolean")),
            },
        })
    }

    /// Whether the action `key` survives only/except filtering.
    ///
    /// Excluded keys always lose; a non-empty `only` admits nothing else.
    pub fn permits(&self, key: &str) -> bool {
        if self.except.contains(key) {
            return false;
        }
        match &self.only {
            Some(only) if !only.is_empty() => only.contains(key),
            _ => true,
        }
    }

    /// Path-parameter name override for a resource segment.
    pub fn var(&self, segment: &str) -> Option<&str> {
        self.vars.get(segment).map(String::as_str)
    }
}

fn invalid(key: &str, reason: &str) -> ConfigurationError {
    ConfigurationError::InvalidOption {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn string_set(key: &str, value: &Value) -> RouteResult<BTreeSet<String>> {
    match value {
        Value::Null => Ok(BTreeSet::new()),
        Value::String(s) => Ok(split_list(s)),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| invalid(key, "expected a list of action keys"))
            })
            .collect(),
        _ => Err(invalid(key, "expected a list of action keys")),
    }
}

/// `"index, read"` → `{index, read}`.
fn split_list(s: &str) -> BTreeSet<String> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

fn string_map(key: &str, value: &Value) -> RouteResult<BTreeMap<String, String>> {
    let Value::Object(map) = value else {
        return Err(invalid(key, "expected a table of name overrides"));
    };
    map.iter()
        .map(|(k, v)| match v.as_str() {
            Some(name) if !name.is_empty() => Ok((k.clone(), name.to_string())),
            _ => Err(invalid(key, "override names must be non-empty strings")),
        })
        .collect()
}

fn binding_map(key: &str, value: &Value) -> RouteResult<BTreeMap<String, BindingSpec>> {
    let Value::Object(map) = value else {
        return Err(invalid(key, "expected a table keyed by action"));
    };
    Ok(map
        .iter()
        .map(|(k, v)| (k.clone(), BindingSpec::new(v.clone())))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolve(set: &OptionSet) -> RouteResult<ResolvedOptions> {
        ResolvedOptions::resolve(|k| set.get(k))
    }

    #[test]
    fn test_absent_options_use_defaults() {
        let resolved = resolve(&OptionSet::new()).unwrap();
        assert_eq!(resolved, ResolvedOptions::default());
        assert!(resolved.permits("index"));
    }

    #[test]
    fn test_only_and_except_filtering() {
        let set: OptionSet = [(ONLY, json!(["index", "read"])), (EXCEPT, json!(["read"]))]
            .into_iter()
            .collect();
        let resolved = resolve(&set).unwrap();
        assert!(resolved.permits("index"));
        assert!(!resolved.permits("read"));
        assert!(!resolved.permits("update"));
    }

    #[test]
    fn test_empty_only_admits_everything() {
        let set: OptionSet = [(ONLY, json!([]))].into_iter().collect();
        assert!(resolve(&set).unwrap().permits("delete"));
    }

    #[test]
    fn test_comma_separated_list() {
        let set: OptionSet = [(EXCEPT, json!("edit, create"))].into_iter().collect();
        let resolved = resolve(&set).unwrap();
        assert!(!resolved.permits("create"));
        assert!(!resolved.permits("edit"));
        assert!(resolved.permits("read"));
    }

    #[test]
    fn test_malformed_options_rejected() {
        let set: OptionSet = [(ONLY, json!([1, 2]))].into_iter().collect();
        assert!(matches!(
            resolve(&set),
            Err(ConfigurationError::InvalidOption { key, .. }) if key == ONLY
        ));

        let set: OptionSet = [(VAR, json!({"blog": ""}))].into_iter().collect();
        assert!(resolve(&set).is_err());

        let set: OptionSet = [(COMPLETE_MATCH, json!("yes"))].into_iter().collect();
        assert!(resolve(&set).is_err());
    }

    #[test]
    fn test_bindings_are_opaque() {
        let set: OptionSet = [(RESOURCE_MODEL, json!({"read": ["Blog", "id", true]}))]
            .into_iter()
            .collect();
        let resolved = resolve(&set).unwrap();
        assert_eq!(
            resolved.models["read"].as_value(),
            &json!(["Blog", "id", true])
        );
    }
}
