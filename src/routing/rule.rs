//! Concrete route rules.
//!
//! A [`RuleNode`] is the leaf of the compiled tree: one verb, one path
//! pattern relative to its group, one dispatch target. Everything is fixed at
//! creation except the model and validate bindings, which the
//! [`AttributeBinder`](crate::routing::binder::AttributeBinder) may attach later.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::routing::error::ConfigurationError;

/// HTTP verb a rule answers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    /// Matches every method.
    Any,
}

impl Verb {
    /// Lowercase wire name (`*` for [`Verb::Any`]).
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "get",
            Verb::Post => "post",
            Verb::Put => "put",
            Verb::Patch => "patch",
            Verb::Delete => "delete",
            Verb::Head => "head",
            Verb::Options => "options",
            Verb::Any => "*",
        }
    }
}

impl FromStr for Verb {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "get" => Ok(Verb::Get),
            "post" => Ok(Verb::Post),
            "put" => Ok(Verb::Put),
            "patch" => Ok(Verb::Patch),
            "delete" => Ok(Verb::Delete),
            "head" => Ok(Verb::Head),
            "options" => Ok(Verb::Options),
            "*" | "any" => Ok(Verb::Any),
            _ => Err(ConfigurationError::UnknownVerb(s.to_string())),
        }
    }
}

impl TryFrom<String> for Verb {
    type Error = ConfigurationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Verb> for String {
    fn from(verb: Verb) -> Self {
        verb.as_str().to_string()
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_ascii_uppercase())
    }
}

/// Which handler-side collaborator a binding is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    Model,
    Validate,
}

/// Opaque binding payload.
///
/// The compiler never looks inside; the model/validator consumers interpret
/// it at dispatch time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BindingSpec(serde_json::Value);

impl BindingSpec {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn into_value(self) -> serde_json::Value {
        self.0
    }
}

impl From<serde_json::Value> for BindingSpec {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

impl From<&str> for BindingSpec {
    fn from(value: &str) -> Self {
        Self(serde_json::Value::String(value.to_string()))
    }
}

impl fmt::Display for BindingSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            serde_json::Value::String(s) => f.write_str(s),
            other => write!(f, "{}", other),
        }
    }
}

/// One compiled route rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleNode {
    verb: Verb,
    pattern: String,
    target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<String>,
    complete_match: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<BindingSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    validate: Option<BindingSpec>,
}

impl RuleNode {
    /// Create a rule. `pattern` is relative to the owning group.
    pub fn new(verb: Verb, pattern: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            verb,
            pattern: pattern.into(),
            target: target.into(),
            action: None,
            complete_match: false,
            model: None,
            validate: None,
        }
    }

    /// Tag the rule with the REST action key it was expanded from.
    pub fn with_action(mut self, key: impl Into<String>) -> Self {
        self.action = Some(key.into());
        self
    }

    pub fn with_complete_match(mut self, complete_match: bool) -> Self {
        self.complete_match = complete_match;
        self
    }

    pub fn verb(&self) -> Verb {
        self.verb
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// REST action key, for rules emitted by a resource.
    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    pub fn complete_match(&self) -> bool {
        self.complete_match
    }

    pub fn model(&self) -> Option<&BindingSpec> {
        self.model.as_ref()
    }

    pub fn validate(&self) -> Option<&BindingSpec> {
        self.validate.as_ref()
    }

    pub fn binding(&self, kind: BindingKind) -> Option<&BindingSpec> {
        match kind {
            BindingKind::Model => self.model.as_ref(),
            BindingKind::Validate => self.validate.as_ref(),
        }
    }

    pub(crate) fn binding_slot(&mut self, kind: BindingKind) -> &mut Option<BindingSpec> {
        match kind {
            BindingKind::Model => &mut self.model,
            BindingKind::Validate => &mut self.validate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verb_parsing() {
        assert_eq!("GET".parse::<Verb>().unwrap(), Verb::Get);
        assert_eq!(" delete ".parse::<Verb>().unwrap(), Verb::Delete);
        assert_eq!("*".parse::<Verb>().unwrap(), Verb::Any);
        assert_eq!(
            "fetch".parse::<Verb>(),
            Err(ConfigurationError::UnknownVerb("fetch".to_string()))
        );
    }

    #[test]
    fn test_verb_display() {
        assert_eq!(Verb::Put.to_string(), "PUT");
        assert_eq!(Verb::Any.to_string(), "*");
        assert_eq!(String::from(Verb::Patch), "patch");
    }

    #[test]
    fn test_verb_deserialize_case_insensitive() {
        let verbs: Vec<Verb> = serde_json::from_str(r#"["Get", "post", "ANY"]"#).unwrap();
        assert_eq!(verbs, vec![Verb::Get, Verb::Post, Verb::Any]);
        assert!(serde_json::from_str::<Verb>(r#""trace""#).is_err());
    }

    #[test]
    fn test_new_rule_has_no_bindings() {
        let rule = RuleNode::new(Verb::Get, "<id>", "index/blog/read").with_action("read");
        assert_eq!(rule.action(), Some("read"));
        assert!(rule.model().is_none());
        assert!(rule.validate().is_none());
        assert!(!rule.complete_match());
    }

    #[test]
    fn test_binding_spec_display() {
        assert_eq!(BindingSpec::from("app\\model\\Blog").to_string(), "app\\model\\Blog");
        let spec = BindingSpec::new(serde_json::json!(["Blog", "id"]));
        assert_eq!(spec.to_string(), r#"["Blog","id"]"#);
    }
}
