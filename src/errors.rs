//! Error types for promise-lint operations.
//!
//! Rule violations are never errors; they are reported as
//! [`Finding`](crate::core::Finding)s. Errors cover malformed input units,
//! invalid rulesets or configuration, and front-end parse failures.

use crate::core::UnitKind;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LintError {
    /// A rule received a unit missing a sub-node its category requires.
    #[error("Invalid {kind} unit for rule '{rule}': {reason}")]
    InvalidUnit {
        rule: String,
        kind: UnitKind,
        reason: String,
    },

    /// Empty or duplicate-id ruleset, unknown rule id, bad pattern.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Parse error in {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

impl LintError {
    pub fn invalid_unit(rule: &str, kind: UnitKind, reason: impl Into<String>) -> Self {
        Self::InvalidUnit {
            rule: rule.to_string(),
            kind,
            reason: reason.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, LintError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_unit_message() {
        let err = LintError::invalid_unit(
            "unhandled-rejection-path",
            UnitKind::Chain,
            "chain has no stages",
        );
        assert_eq!(
            err.to_string(),
            "Invalid chain unit for rule 'unhandled-rejection-path': chain has no stages"
        );
    }

    #[test]
    fn test_parse_error_message() {
        let err = LintError::parse("src/app.js", "tree-sitter returned no tree");
        assert_eq!(
            err.to_string(),
            "Parse error in src/app.js: tree-sitter returned no tree"
        );
    }
}
