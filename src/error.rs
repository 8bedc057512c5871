//! Error types for the validation engine.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Rendered messages: field path -> rule name -> message text.
pub type Messages = BTreeMap<String, BTreeMap<String, String>>;

/// Error reported by a single rule evaluation.
///
/// A sync rule returning `Err` or a deferred rule rejecting both settle the
/// check as failed; the error itself is logged and then discarded, so this
/// type only needs to carry enough to diagnose the failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[{rule}] {message}")]
pub struct RuleError {
    /// The rule name that produced the error.
    pub rule: String,
    /// Human-readable reason.
    pub message: String,
}

impl RuleError {
    /// Create a new rule error.
    pub fn new(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            message: message.into(),
        }
    }
}

/// Failure loading or parsing a message template.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to read message template: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed message template: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Collection of rendered validation messages for the failing checks.
///
/// Returned as the `Err` payload of [`Validator::validate`], grouped so
/// each field maps to a rule -> message object and a field can carry
/// several simultaneous failures.
///
/// [`Validator::validate`]: crate::Validator::validate
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    messages: Messages,
}

impl ValidationErrors {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a rendered message for a (field, rule) pair.
    pub fn add(
        &mut self,
        field: impl Into<String>,
        rule: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.messages
            .entry(field.into())
            .or_default()
            .insert(rule.into(), message.into());
    }

    /// True when no check failed.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Total number of failing (field, rule) pairs.
    pub fn len(&self) -> usize {
        self.messages.values().map(BTreeMap::len).sum()
    }

    /// Messages for one field, if it has any failures.
    pub fn get(&self, field: &str) -> Option<&BTreeMap<String, String>> {
        self.messages.get(field)
    }

    /// The rendered message for one (field, rule) pair.
    pub fn message(&self, field: &str, rule: &str) -> Option<&str> {
        self.messages.get(field)?.get(rule).map(String::as_str)
    }

    /// Borrow the full field -> rule -> message map.
    pub fn messages(&self) -> &Messages {
        &self.messages
    }

    /// Consume into the full field -> rule -> message map.
    pub fn into_messages(self) -> Messages {
        self.messages
    }
}

impl From<Messages> for ValidationErrors {
    fn from(messages: Messages) -> Self {
        Self { messages }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation failed: {} error(s)", self.len())
    }
}

impl std::error::Error for ValidationErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_get() {
        let mut errors = ValidationErrors::new();
        errors.add("email", "email", "The email must be a valid email address.");
        errors.add("email", "max", "The email may not be greater than 10 characters.");
        errors.add("age", "number", "The age must be a number.");

        assert_eq!(errors.len(), 3);
        assert_eq!(errors.get("email").unwrap().len(), 2);
        assert_eq!(
            errors.message("age", "number"),
            Some("The age must be a number.")
        );
        assert_eq!(errors.message("age", "max"), None);
    }

    #[test]
    fn display_counts_pairs() {
        let mut errors = ValidationErrors::new();
        errors.add("a", "required", "m");
        errors.add("a", "string", "m");
        assert_eq!(errors.to_string(), "validation failed: 2 error(s)");
    }

    #[test]
    fn serializes_as_plain_map() {
        let mut errors = ValidationErrors::new();
        errors.add("email", "max", "too long");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json, serde_json::json!({"email": {"max": "too long"}}));
    }

    #[test]
    fn rule_error_display() {
        let err = RuleError::new("unique", "lookup timed out");
        assert_eq!(err.to_string(), "[unique] lookup timed out");
    }
}
