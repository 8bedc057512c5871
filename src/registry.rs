//! Named rule storage and lookup.

use crate::error::RuleError;
use crate::rules;
use async_trait::async_trait;
use futures_util::future::BoxFuture;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// A synchronous rule predicate.
///
/// Receives the resolved field value, the field path, and the invocation's
/// arguments. `Err` counts as a failed check for that (field, rule) pair
/// and never aborts the rest of the pipeline.
pub type SyncRuleFn = Arc<dyn Fn(&Value, &str, &[String]) -> Result<bool, RuleError> + Send + Sync>;

/// A deferred rule whose outcome settles on an external timeline, such as
/// a uniqueness lookup against a remote store.
///
/// Resolving `Ok(())` settles the check as passed; any `Err` settles it as
/// failed and the reason is discarded after logging. There is no
/// cancellation: a rule needing timeout behavior must decide for itself
/// when to fail after a delay.
#[async_trait]
pub trait AsyncRule: Send + Sync {
    async fn check(&self, value: Value, field: String, args: Vec<String>)
        -> Result<(), RuleError>;
}

/// Adapter turning a future-returning closure into an [`AsyncRule`].
pub struct DeferredFn<F>(pub F);

#[async_trait]
impl<F> AsyncRule for DeferredFn<F>
where
    F: Fn(Value, String, Vec<String>) -> BoxFuture<'static, Result<(), RuleError>> + Send + Sync,
{
    async fn check(
        &self,
        value: Value,
        field: String,
        args: Vec<String>,
    ) -> Result<(), RuleError> {
        (self.0)(value, field, args).await
    }
}

/// A registered rule: either a synchronous predicate or a deferred rule.
#[derive(Clone)]
pub enum RuleFn {
    Sync(SyncRuleFn),
    Deferred(Arc<dyn AsyncRule>),
}

impl std::fmt::Debug for RuleFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleFn::Sync(_) => f.write_str("RuleFn::Sync"),
            RuleFn::Deferred(_) => f.write_str("RuleFn::Deferred"),
        }
    }
}

/// Mapping from rule name to rule implementation.
///
/// `Registry::default()` seeds the built-in rule set. Each [`Validator`]
/// owns its registry (pass a clone to share a base set across instances),
/// so rules defined on one instance never leak into another.
///
/// [`Validator`]: crate::Validator
#[derive(Clone)]
pub struct Registry {
    rules: HashMap<String, RuleFn>,
}

impl Default for Registry {
    fn default() -> Self {
        let mut rules = HashMap::new();
        rules::install(&mut rules);
        Self { rules }
    }
}

impl Registry {
    /// A registry with no rules at all, not even the built-ins.
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// Store a rule under a name, overwriting any prior entry including
    /// built-ins.
    pub fn register(&mut self, name: impl Into<String>, rule: RuleFn) {
        self.rules.insert(name.into(), rule);
    }

    /// Register a synchronous predicate.
    pub fn register_sync<F>(&mut self, name: impl Into<String>, rule: F)
    where
        F: Fn(&Value, &str, &[String]) -> Result<bool, RuleError> + Send + Sync + 'static,
    {
        self.register(name, RuleFn::Sync(Arc::new(rule)));
    }

    /// Register a deferred rule.
    pub fn register_deferred<R>(&mut self, name: impl Into<String>, rule: R)
    where
        R: AsyncRule + 'static,
    {
        self.register(name, RuleFn::Deferred(Arc::new(rule)));
    }

    /// Look up a rule by name.
    ///
    /// An unregistered name resolves to a fallback that logs a warning and
    /// unconditionally passes. This fail-open policy is deliberate: an
    /// unknown rule must not block unrelated validations. Callers that
    /// want fail-closed behavior can register their own rule under the
    /// missing name.
    pub fn lookup(&self, name: &str) -> RuleFn {
        match self.rules.get(name) {
            Some(rule) => rule.clone(),
            None => fallback(name),
        }
    }

    /// True when a rule is registered under the name.
    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    /// Registered rule names, unordered.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.rules.keys().collect();
        names.sort();
        f.debug_struct("Registry").field("rules", &names).finish()
    }
}

fn fallback(name: &str) -> RuleFn {
    let name = name.to_string();
    RuleFn::Sync(Arc::new(move |_, field, _| {
        tracing::warn!(rule = %name, field = %field, "unknown validation rule, treating check as passed");
        Ok(true)
    }))
}
