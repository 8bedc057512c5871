//! Process-wide default message template.
//!
//! Every validator without an explicit template or template path falls
//! back to the process default: a template loaded from the path set via
//! [`set_default_template_path`], or the built-in message set shipped with
//! the crate. The default path is settable exactly once, before any
//! validator resolves its template; the resolved default is cached, so a
//! later change can never affect an instance holding a cached reference.

use crate::error::TemplateError;
use crate::message::Template;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

static DEFAULT_TEMPLATE_PATH: OnceLock<PathBuf> = OnceLock::new();
static DEFAULT_TEMPLATE: OnceLock<Template> = OnceLock::new();

const BUILTIN_MESSAGES: &str = include_str!("default_messages.json");

/// Point the process-wide default template at a JSON file.
///
/// May be called at most once, and only takes effect if no validator has
/// resolved the default template yet. Returns the rejected path when the
/// default was already set.
pub fn set_default_template_path(path: impl Into<PathBuf>) -> Result<(), PathBuf> {
    DEFAULT_TEMPLATE_PATH.set(path.into())
}

/// The configured default template path, if any.
pub fn default_template_path() -> Option<&'static Path> {
    DEFAULT_TEMPLATE_PATH.get().map(PathBuf::as_path)
}

/// Resolve the process-wide default template.
///
/// A configured path that fails to load logs a warning and falls back to
/// the built-in messages; resolution never fails.
pub fn default_template() -> &'static Template {
    DEFAULT_TEMPLATE.get_or_init(|| {
        if let Some(path) = DEFAULT_TEMPLATE_PATH.get() {
            match Template::from_path(path) {
                Ok(template) => return template,
                Err(err) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to load default message template, using built-in messages"
                    );
                }
            }
        }
        builtin_template()
    })
}

/// The message set embedded in the crate.
pub fn builtin_template() -> Template {
    serde_json::from_str(BUILTIN_MESSAGES).expect("built-in message template is valid JSON")
}

/// Parse a template from a JSON string.
pub fn parse_template(raw: &str) -> Result<Template, TemplateError> {
    Ok(serde_json::from_str(raw)?)
}
