//! Route compilation errors.

use thiserror::Error;

/// Errors raised while compiling route declarations into a rule tree.
///
/// Every variant is fatal for the one resource (or rule) being compiled.
/// Groups and rules already committed to the tree are left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// Resource name was empty after stripping leading separators.
    #[error("resource name must not be empty")]
    EmptyResourceName,

    /// A dotted resource name contained an empty segment (`a..b`, `a.`).
    #[error("resource '{resource}' contains an empty nested segment")]
    EmptySegment { resource: String },

    /// A REST table entry cannot be expanded for this resource.
    #[error("resource '{resource}' action '{action}': {reason}")]
    MalformedRestEntry {
        resource: String,
        action: String,
        reason: String,
    },

    /// An option value has the wrong shape.
    #[error("option '{key}' is invalid: {reason}")]
    InvalidOption { key: String, reason: String },

    /// HTTP verb string is not recognized.
    #[error("unknown HTTP verb '{0}'")]
    UnknownVerb(String),

    /// Group name was empty.
    #[error("group name must not be empty")]
    EmptyGroupName,

    /// A group id did not refer to a group of this tree.
    #[error("group #{0} does not exist in this rule tree")]
    UnknownGroup(usize),

    /// A rule id did not refer to a rule of this tree.
    #[error("rule #{0} does not exist in this rule tree")]
    UnknownRule(usize),
}

/// Result type for route compilation.
pub type RouteResult<T> = Result<T, ConfigurationError>;
