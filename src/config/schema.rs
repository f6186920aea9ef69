//! Routes file schema.
//!
//! Everything derives Serde so a routes file deserializes directly. All
//! sections have defaults, so an empty file is a valid (empty) route table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::routing::rule::Verb;

/// Root of a routes file.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RoutesConfig {
    /// Logging settings for the CLI.
    pub observability: ObservabilityConfig,

    /// Root group settings.
    pub router: RouterConfig,

    /// Plain rules on the root group.
    pub rules: Vec<RuleConfig>,

    /// Resources on the root group.
    pub resources: Vec<ResourceConfig>,

    /// Nested groups.
    pub groups: Vec<GroupConfig>,
}

/// Root group and compilation mode.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Compile resources as they are declared instead of at the end.
    pub eager: bool,

    /// Domain every rule inherits unless a group overrides it.
    pub domain: Option<String>,

    /// Options inherited by every group.
    pub options: BTreeMap<String, Value>,
}

/// A named group of rules, resources and further groups.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GroupConfig {
    /// Path segment contributed by the group.
    pub name: String,

    #[serde(default)]
    pub domain: Option<String>,

    #[serde(default)]
    pub options: BTreeMap<String, Value>,

    #[serde(default)]
    pub rules: Vec<RuleConfig>,

    #[serde(default)]
    pub resources: Vec<ResourceConfig>,

    #[serde(default)]
    pub groups: Vec<GroupConfig>,
}

/// A single explicit rule.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RuleConfig {
    /// HTTP verb (default: any).
    #[serde(default = "default_verb")]
    pub verb: Verb,

    /// Path pattern relative to the group.
    #[serde(default)]
    pub pattern: String,

    /// Dispatch target.
    pub target: String,
}

fn default_verb() -> Verb {
    Verb::Any
}

/// A REST resource declaration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResourceConfig {
    /// Resource name, dotted for nesting (e.g. "blog.comment").
    pub name: String,

    /// Dispatch target prefix (e.g. "index/blog").
    pub route: String,

    /// Emit only these action keys.
    #[serde(default)]
    pub only: Option<Vec<String>>,

    /// Never emit these action keys.
    #[serde(default)]
    pub except: Vec<String>,

    /// Path-parameter names per resource segment.
    #[serde(default)]
    pub vars: BTreeMap<String, String>,

    /// Model bindings keyed by action.
    #[serde(default)]
    pub model: BTreeMap<String, Value>,

    /// Validator bindings keyed by action.
    #[serde(default)]
    pub validate: BTreeMap<String, Value>,

    /// Extra or overriding REST actions, in order.
    #[serde(default)]
    pub rest: Vec<RestEntryConfig>,

    /// Use `rest` as the whole table instead of merging it into the default.
    #[serde(default)]
    pub replace_rest: bool,

    /// Override the resource default of exact matching.
    #[serde(default)]
    pub complete_match: Option<bool>,

    /// Pass-through options.
    #[serde(default)]
    pub options: BTreeMap<String, Value>,
}

/// One REST table entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RestEntryConfig {
    /// Action key used by only/except and bindings.
    pub key: String,

    pub verb: Verb,

    /// Path suffix, may contain `<id>`.
    #[serde(default)]
    pub path: String,

    /// Method name appended to the resource route.
    pub action: String,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
