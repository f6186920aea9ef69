//! Routes file validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject names and tables the compiler would refuse, with file locations
//! - Detect duplicate resources and duplicate REST keys
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RoutesConfig → Result<(), Vec<ValidationError>>
//! - Overlapping only/except is legal (except wins) and only logged

use std::collections::HashSet;
use std::fmt;

use crate::config::schema::{GroupConfig, ResourceConfig, RoutesConfig, RuleConfig};

/// One semantic problem in a routes file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Location, e.g. `groups[0].resources[2].name`.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Check a parsed routes file.
pub fn validate_config(config: &RoutesConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    validate_level(
        "",
        &config.rules,
        &config.resources,
        &config.groups,
        &mut errors,
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_level(
    path: &str,
    rules: &[RuleConfig],
    resources: &[ResourceConfig],
    groups: &[GroupConfig],
    errors: &mut Vec<ValidationError>,
) {
    for (i, rule) in rules.iter().enumerate() {
        if rule.target.trim().is_empty() {
            errors.push(ValidationError::new(
                format!("{}rules[{}].target", path, i),
                "target must not be empty",
            ));
        }
    }

    let mut seen = HashSet::new();
    for (i, resource) in resources.iter().enumerate() {
        let field = format!("{}resources[{}]", path, i);
        validate_resource(&field, resource, errors);

        let name = resource.name.trim_start_matches('/');
        if !name.is_empty() && !seen.insert(name) {
            errors.push(ValidationError::new(
                format!("{}.name", field),
                format!("resource '{}' is declared twice in the same group", name),
            ));
        }
    }

    for (i, group) in groups.iter().enumerate() {
        let field = format!("{}groups[{}]", path, i);
        if group.name.trim_matches('/').is_empty() {
            errors.push(ValidationError::new(
                format!("{}.name", field),
                "group name must not be empty",
            ));
        }
        validate_level(
            &format!("{}.", field),
            &group.rules,
            &group.resources,
            &group.groups,
            errors,
        );
    }
}

fn validate_resource(field: &str, resource: &ResourceConfig, errors: &mut Vec<ValidationError>) {
    let name = resource.name.trim_start_matches('/');
    if name.is_empty() {
        errors.push(ValidationError::new(
            format!("{}.name", field),
            "resource name must not be empty",
        ));
    } else if name.split('.').any(str::is_empty) {
        errors.push(ValidationError::new(
            format!("{}.name", field),
            format!("resource '{}' contains an empty nested segment", name),
        ));
    }

    if resource.route.trim().is_empty() {
        errors.push(ValidationError::new(
            format!("{}.route", field),
            "route must not be empty",
        ));
    }

    let nested = name.contains('.');
    let mut keys = HashSet::new();
    for (i, entry) in resource.rest.iter().enumerate() {
        let entry_field = format!("{}.rest[{}]", field, i);
        if entry.key.is_empty() {
            errors.push(ValidationError::new(
                format!("{}.key", entry_field),
                "action key must not be empty",
            ));
        } else if !keys.insert(entry.key.as_str()) {
            errors.push(ValidationError::new(
                format!("{}.key", entry_field),
                format!("action '{}' is declared twice", entry.key),
            ));
        }
        if entry.action.is_empty() {
            errors.push(ValidationError::new(
                format!("{}.action", entry_field),
                "action name must not be empty",
            ));
        }
        if nested && !entry.path.is_empty() && !entry.path.starts_with('/') {
            errors.push(ValidationError::new(
                format!("{}.path", entry_field),
                "nested resources need path suffixes starting with '/'",
            ));
        }
    }

    for (key, value) in &resource.vars {
        if value.is_empty() {
            errors.push(ValidationError::new(
                format!("{}.vars.{}", field, key),
                "override name must not be empty",
            ));
        }
    }

    if let Some(only) = &resource.only {
        for key in only.iter().filter(|k| resource.except.contains(*k)) {
            tracing::warn!(
                resource = %name,
                action = %key,
                "Action listed in both only and except; it will not be emitted"
            );
        }
    }
}
