//! Error types for the pickup-core library.

use thiserror::Error;

use crate::models::parcel::ParcelField;

/// Main error type for the pickup library.
#[derive(Error, Debug)]
pub enum PickupError {
    /// A user rule failed validation.
    #[error("rule error: {0}")]
    Rule(#[from] RuleError),

    /// A pattern library entry failed to compile.
    #[error("pattern `{name}` failed to compile: {reason}")]
    Pattern { name: String, reason: String },

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while authoring or loading a user rule.
///
/// These surface when a rule is built, never while it is evaluated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// The regex for a field does not compile.
    #[error("invalid {field} pattern `{pattern}`: {reason}")]
    InvalidPattern {
        field: ParcelField,
        pattern: String,
        reason: String,
    },

    /// A regex-mode rule carries no pattern for any field.
    #[error("regex rule has no patterns")]
    NoPatterns,

    /// The rule has no name.
    #[error("rule name is empty")]
    EmptyName,

    /// A rule inside a rule book failed; carries the rule's name.
    #[error("rule `{name}`: {source}")]
    InRule {
        name: String,
        #[source]
        source: Box<RuleError>,
    },
}

/// Result type for the pickup library.
pub type Result<T> = std::result::Result<T, PickupError>;
