//! The validation engine.
//!
//! A [`Validator`] is constructed with a data record and a rule map, runs
//! exactly one validation pass, and then answers pass/fail queries and
//! renders messages for the failing checks. Synchronous rules settle
//! during the initial pass; deferred rules leave pending checks that
//! settle together when [`Validator::validate`] is awaited.

use crate::error::{Messages, RuleError, ValidationErrors};
use crate::message::{self, Template};
use crate::parser::{self, Pipeline, Rules};
use crate::path;
use crate::registry::{AsyncRule, Registry, RuleFn};
use crate::translator;
use futures_util::future::{join_all, BoxFuture};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::OnceLock;

/// The outcome slot of one check: settled, or still waiting on a deferred
/// rule. Settlement happens exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckValue {
    Settled(bool),
    Pending,
}

impl CheckValue {
    /// True only for a check that settled as passed.
    pub fn passed(self) -> bool {
        self == CheckValue::Settled(true)
    }
}

/// The outcome record for one (field, rule) evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    /// Dotted field path the rule ran against.
    pub field: String,
    /// Rule name from the pipeline.
    pub rule: String,
    /// The invocation's arguments.
    pub args: Vec<String>,
    /// The resolved attribute value the rule saw.
    pub attribute_value: Value,
    /// Pass/fail outcome, or pending while a deferred rule is in flight.
    pub value: CheckValue,
}

struct PendingCheck {
    index: usize,
    future: BoxFuture<'static, Result<(), RuleError>>,
}

/// Validates a data record against a declarative rule map.
///
/// One validation run per instance: evaluation is triggered by
/// [`validate`](Self::validate) or implicitly by
/// [`passes`](Self::passes) / [`fails`](Self::fails), and once finalized
/// the outcome is cached.
///
/// ## Example
///
/// ```rust,ignore
/// use supervalidator::prelude::*;
/// use serde_json::json;
///
/// let mut validator = Validator::new(
///     json!({"email": "myfakeemail@gmail.com"}),
///     Rules::from([("email".to_string(), RuleSpec::from("required|max:10"))]),
/// );
///
/// if let Err(errors) = validator.validate().await {
///     println!("{:?}", errors.message("email", "max"));
/// }
/// ```
pub struct Validator {
    data: Value,
    rules: Rules,
    registry: Registry,
    template_path: Option<PathBuf>,
    translator: Option<Template>,
    template: OnceLock<Template>,
    pipelines: BTreeMap<String, Pipeline>,
    checks: Vec<CheckResult>,
    pending: Vec<PendingCheck>,
    evaluating: bool,
    finalized: bool,
}

impl Validator {
    /// Create a validator over a record and a rule map, seeded with the
    /// default rule registry.
    pub fn new(data: Value, rules: Rules) -> Self {
        Self {
            data,
            rules,
            registry: Registry::default(),
            template_path: None,
            translator: None,
            template: OnceLock::new(),
            pipelines: BTreeMap::new(),
            checks: Vec::new(),
            pending: Vec::new(),
            evaluating: false,
            finalized: false,
        }
    }

    /// Replace the rule registry. The registry is owned by this instance;
    /// later registrations on it do not leak elsewhere.
    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    /// Use an explicit message template, overriding the process default.
    pub fn with_template(mut self, template: Template) -> Self {
        self.translator = Some(template);
        self
    }

    /// Load the message template from a JSON file. Takes priority over an
    /// explicit template; a load failure falls back down the chain with a
    /// warning.
    pub fn with_template_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.template_path = Some(path.into());
        self
    }

    /// Register a synchronous rule on this instance, overwriting any
    /// prior rule of the same name including built-ins.
    pub fn define_rule<F>(&mut self, name: impl Into<String>, rule: F)
    where
        F: Fn(&Value, &str, &[String]) -> Result<bool, RuleError> + Send + Sync + 'static,
    {
        self.registry.register_sync(name, rule);
    }

    /// Register a deferred rule on this instance.
    pub fn define_deferred_rule<R>(&mut self, name: impl Into<String>, rule: R)
    where
        R: AsyncRule + 'static,
    {
        self.registry.register_deferred(name, rule);
    }

    /// The record under validation.
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// The check results produced so far. Empty before evaluation;
    /// immutable once finalized.
    pub fn checks(&self) -> &[CheckResult] {
        &self.checks
    }

    /// True between the start of evaluation and finalization.
    pub fn validating(&self) -> bool {
        self.evaluating
    }

    /// True once every check has settled.
    pub fn validated(&self) -> bool {
        self.finalized
    }

    /// Run the full validation to completion.
    ///
    /// With only synchronous rules this finishes without suspending. With
    /// deferred rules it suspends exactly once, until every pending check
    /// has settled; nothing is published until the full set settles. The
    /// `Err` payload carries the rendered messages for the failing subset.
    ///
    /// Re-invoking after finalization returns the cached outcome.
    pub async fn validate(&mut self) -> Result<(), ValidationErrors> {
        if !self.finalized {
            if !self.evaluating {
                self.run_checks();
            }
            if !self.pending.is_empty() {
                let drained = std::mem::take(&mut self.pending);
                let (indexes, futures): (Vec<_>, Vec<_>) =
                    drained.into_iter().map(|p| (p.index, p.future)).unzip();
                let settled = join_all(futures).await;
                for (index, outcome) in indexes.into_iter().zip(settled) {
                    let passed = match outcome {
                        Ok(()) => true,
                        Err(err) => {
                            let check = &self.checks[index];
                            tracing::debug!(
                                field = %check.field,
                                rule = %check.rule,
                                error = %err,
                                "deferred rule rejected, counting the check as failed"
                            );
                            false
                        }
                    };
                    self.checks[index].value = CheckValue::Settled(passed);
                }
            }
            self.evaluating = false;
            self.finalized = true;
        }

        let errors = ValidationErrors::from(self.messages());
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// True iff every check settled as passed.
    ///
    /// Triggers evaluation when it has not started yet. While deferred
    /// checks are still pending this reports over the current, possibly
    /// incomplete state (a pending check counts as not passed); callers
    /// using deferred rules should await [`validate`](Self::validate)
    /// instead.
    pub fn passes(&mut self) -> bool {
        if !self.finalized && !self.evaluating {
            self.run_checks();
        }
        self.checks.iter().all(|check| check.value.passed())
    }

    /// Negation of [`passes`](Self::passes), with the same evaluation
    /// trigger and pending-state caveat.
    pub fn fails(&mut self) -> bool {
        !self.passes()
    }

    /// Rendered messages for the checks that settled as failed, grouped
    /// field -> rule -> message. Empty before evaluation and for passing
    /// runs; pending checks are not reported.
    pub fn messages(&self) -> Messages {
        let failing = self
            .checks
            .iter()
            .filter(|check| check.value == CheckValue::Settled(false));
        message::render(failing, self.template())
    }

    /// Evaluate every pipeline entry once. Sync rules settle in place;
    /// deferred rules leave a pending check plus a stored future.
    fn run_checks(&mut self) {
        self.evaluating = true;
        self.pipelines = parser::parse(&self.rules);

        let mut checks = Vec::new();
        let mut pending = Vec::new();

        for (field, pipeline) in &self.pipelines {
            let attribute_value = path::resolve(&self.data, field);
            for invocation in pipeline {
                let value = match self.registry.lookup(&invocation.name) {
                    RuleFn::Sync(rule) => {
                        let settled = match rule(&attribute_value, field, &invocation.args) {
                            Ok(passed) => passed,
                            Err(err) => {
                                tracing::debug!(
                                    field = %field,
                                    rule = %invocation.name,
                                    error = %err,
                                    "rule reported an error, counting the check as failed"
                                );
                                false
                            }
                        };
                        CheckValue::Settled(settled)
                    }
                    RuleFn::Deferred(rule) => {
                        let owned_value = attribute_value.clone();
                        let owned_field = field.clone();
                        let owned_args = invocation.args.clone();
                        pending.push(PendingCheck {
                            index: checks.len(),
                            future: Box::pin(async move {
                                rule.check(owned_value, owned_field, owned_args).await
                            }),
                        });
                        CheckValue::Pending
                    }
                };

                checks.push(CheckResult {
                    field: field.clone(),
                    rule: invocation.name.clone(),
                    args: invocation.args.clone(),
                    attribute_value: attribute_value.clone(),
                    value,
                });
            }
        }

        self.checks = checks;
        self.pending = pending;

        if self.pending.is_empty() {
            self.evaluating = false;
            self.finalized = true;
        }
    }

    /// Resolve the message template once per instance:
    /// template path, then explicit template, then the process default.
    fn template(&self) -> &Template {
        self.template.get_or_init(|| {
            if let Some(template_path) = &self.template_path {
                match Template::from_path(template_path) {
                    Ok(template) => return template,
                    Err(err) => {
                        tracing::warn!(
                            path = %template_path.display(),
                            error = %err,
                            "failed to load message template, falling back"
                        );
                    }
                }
            }
            if let Some(template) = &self.translator {
                return template.clone();
            }
            translator::default_template().clone()
        })
    }
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("registry", &self.registry)
            .field("checks", &self.checks)
            .field("pending", &self.pending.len())
            .field("evaluating", &self.evaluating)
            .field("finalized", &self.finalized)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::RuleSpec;
    use serde_json::json;

    fn rules(entries: &[(&str, &str)]) -> Rules {
        entries
            .iter()
            .map(|(field, spec)| (field.to_string(), RuleSpec::from(*spec)))
            .collect()
    }

    #[test]
    fn passes_triggers_evaluation() {
        let mut validator = Validator::new(
            json!({"email": "a@b.co"}),
            rules(&[("email", "required|email")]),
        );
        assert!(!validator.validated());
        assert!(validator.passes());
        assert!(validator.validated());
        assert!(!validator.fails());
    }

    #[test]
    fn one_check_per_pipeline_entry() {
        let mut validator = Validator::new(
            json!({"email": "myfakeemail@gmail.com"}),
            rules(&[("email", "required|max:10")]),
        );
        assert!(validator.fails());

        let checks = validator.checks();
        assert_eq!(checks.len(), 2);
        assert_eq!(checks[0].rule, "required");
        assert_eq!(checks[0].value, CheckValue::Settled(true));
        assert_eq!(checks[1].rule, "max");
        assert_eq!(checks[1].args, vec!["10".to_string()]);
        assert_eq!(checks[1].value, CheckValue::Settled(false));
    }

    #[test]
    fn sync_rule_error_fails_only_its_check() {
        let mut validator = Validator::new(
            json!({"name": "ok"}),
            rules(&[("name", "broken|string")]),
        );
        validator.define_rule("broken", |_, _, _| {
            Err(RuleError::new("broken", "internal failure"))
        });

        assert!(validator.fails());
        let checks = validator.checks();
        assert_eq!(checks[0].value, CheckValue::Settled(false));
        assert_eq!(checks[1].value, CheckValue::Settled(true));
    }

    #[test]
    fn unknown_rule_passes() {
        let mut validator = Validator::new(
            json!({"name": "x"}),
            rules(&[("name", "no_such_rule|string")]),
        );
        assert!(validator.passes());
    }

    #[test]
    fn messages_empty_before_evaluation_and_on_pass() {
        let validator = Validator::new(json!({"a": "x"}), rules(&[("a", "string")]));
        assert!(validator.messages().is_empty());

        let mut validator = validator;
        assert!(validator.passes());
        assert!(validator.messages().is_empty());
    }

    #[test]
    fn custom_template_overrides_default() {
        let mut template = Template::new();
        template.set_text("string", "bad :attribute");

        let mut validator = Validator::new(json!({"n": 5}), rules(&[("n", "string")]))
            .with_template(template);
        assert!(validator.fails());
        assert_eq!(validator.messages()["n"]["string"], "bad n");
    }

    #[tokio::test]
    async fn validate_is_idempotent_after_finalization() {
        let mut validator = Validator::new(
            json!({"email": "myfakeemail@gmail.com"}),
            rules(&[("email", "max:10")]),
        );
        let first = validator.validate().await.unwrap_err();
        let second = validator.validate().await.unwrap_err();
        assert_eq!(first, second);
    }
}
