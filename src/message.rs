//! Message templates and rendering of failing checks.

use crate::engine::CheckResult;
use crate::error::{Messages, TemplateError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Placeholder rendered when the template has no entry for a rule.
pub const MISSING_MESSAGE: &str = "??";

/// One template entry: either a single message, or per-value-type variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageSpec {
    /// A single message used for every value type.
    Text(String),
    /// Variants keyed by the runtime type tag of the attribute value.
    /// Unrecognized types fall back to the `string` variant.
    ByType {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        string: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        number: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        array: Option<String>,
    },
}

/// Mapping from rule name to message spec.
///
/// The on-disk format is plain JSON: string entries or
/// `{"string": ..., "number": ..., "array": ...}` variant objects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Template {
    entries: BTreeMap<String, MessageSpec>,
}

impl Template {
    /// An empty template; every rule renders the `??` placeholder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a template from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TemplateError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// The entry for a rule, if present.
    pub fn get(&self, rule: &str) -> Option<&MessageSpec> {
        self.entries.get(rule)
    }

    /// Insert or replace an entry.
    pub fn insert(&mut self, rule: impl Into<String>, spec: MessageSpec) {
        self.entries.insert(rule.into(), spec);
    }

    /// Set a single-text entry for a rule.
    pub fn set_text(&mut self, rule: impl Into<String>, message: impl Into<String>) {
        self.insert(rule, MessageSpec::Text(message.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Render the failing checks against a template, grouped field -> rule ->
/// message.
pub fn render<'a>(
    failing: impl IntoIterator<Item = &'a CheckResult>,
    template: &Template,
) -> Messages {
    let mut messages = Messages::new();
    for check in failing {
        messages
            .entry(check.field.clone())
            .or_default()
            .insert(check.rule.clone(), render_one(check, template));
    }
    messages
}

fn render_one(check: &CheckResult, template: &Template) -> String {
    let raw = match template.get(&check.rule) {
        None => return MISSING_MESSAGE.to_string(),
        Some(MessageSpec::Text(text)) => text.clone(),
        Some(MessageSpec::ByType {
            string,
            number,
            array,
        }) => {
            let variant = match check.attribute_value {
                Value::Number(_) => number,
                Value::Array(_) => array,
                _ => string,
            };
            match variant {
                Some(text) => text.clone(),
                None => return MISSING_MESSAGE.to_string(),
            }
        }
    };

    // Rule placeholder first (`:max` -> first arg), then `:attribute`.
    let placeholder = format!(":{}", check.rule);
    let with_arg = if raw.contains(&placeholder) {
        let arg = check.args.first().map(String::as_str).unwrap_or_default();
        raw.replace(&placeholder, arg)
    } else {
        raw
    };
    with_arg.replace(":attribute", &check.field)
}
