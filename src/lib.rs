//! # SuperValidator
//!
//! Declarative data validation for ad-hoc key/value records. A validator
//! takes a JSON record and a rule map of per-field pipelines
//! (`"required|max:10"`), evaluates every check, and renders templated,
//! human-readable error messages keyed by field and rule.
//!
//! ## Features
//!
//! - Pipe-delimited rule strings with `:`-bound arguments
//! - Dotted-path access into nested records (`address.route`), with
//!   nested rule groups flattening to the same paths
//! - Sync and deferred (async) rules behind one registry, extensible at
//!   run time
//! - Fail-open handling of unknown rules and rule-internal errors: no
//!   failure mode escapes as a fault, every check degrades to pass/fail
//! - Message templates with `:attribute`/argument placeholders and
//!   per-value-type message variants, loadable from JSON
//!
//! ## Example
//!
//! ```rust,ignore
//! use supervalidator::prelude::*;
//! use serde_json::json;
//!
//! let mut validator = Validator::new(
//!     json!({"address": {"route": "Street, 100"}}),
//!     Rules::from([("address.route".to_string(), RuleSpec::from("string|required"))]),
//! );
//!
//! assert!(validator.passes());
//! ```
//!
//! Deferred rules settle when `validate()` is awaited:
//!
//! ```rust,ignore
//! validator.define_deferred_rule("unique", DeferredFn(|value, _field, args| {
//!     async move { lookup_unique(value, args).await }.boxed()
//! }));
//!
//! if let Err(errors) = validator.validate().await {
//!     println!("{:?}", errors.messages());
//! }
//! ```

mod engine;
mod error;
mod message;
mod parser;
mod path;
mod registry;
mod rules;
mod translator;

pub use engine::{CheckResult, CheckValue, Validator};
pub use error::{Messages, RuleError, TemplateError, ValidationErrors};
pub use message::{MessageSpec, Template, MISSING_MESSAGE};
pub use parser::{parse, parse_list, Pipeline, RuleInvocation, RuleSpec, Rules};
pub use path::resolve;
pub use registry::{AsyncRule, DeferredFn, Registry, RuleFn, SyncRuleFn};
pub use translator::{
    builtin_template, default_template, default_template_path, parse_template,
    set_default_template_path,
};

/// Convenience re-exports for typical usage.
pub mod prelude {
    pub use crate::engine::{CheckResult, CheckValue, Validator};
    pub use crate::error::{Messages, RuleError, ValidationErrors};
    pub use crate::message::{MessageSpec, Template};
    pub use crate::parser::{RuleSpec, Rules};
    pub use crate::registry::{AsyncRule, DeferredFn, Registry, RuleFn};
}
