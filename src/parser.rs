//! Rule-spec parsing.
//!
//! A rule spec is either a pipe-delimited string (`"required|max:10"`) or a
//! nested map grouping sub-fields of an object value. Parsing normalizes
//! both forms into one pipeline map keyed by dotted field path.

use serde::Deserialize;
use std::collections::BTreeMap;

/// Per-field rule specification, as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RuleSpec {
    /// Pipe-delimited rule list, e.g. `"required|max:10"`.
    List(String),
    /// Nested group; keys are joined to the parent key with a dot.
    Group(BTreeMap<String, RuleSpec>),
}

impl From<&str> for RuleSpec {
    fn from(s: &str) -> Self {
        RuleSpec::List(s.to_string())
    }
}

impl From<String> for RuleSpec {
    fn from(s: String) -> Self {
        RuleSpec::List(s)
    }
}

/// The caller's full rule map: field path (or group key) -> spec.
pub type Rules = BTreeMap<String, RuleSpec>;

/// One parsed rule invocation: a rule name plus its ordered arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleInvocation {
    pub name: String,
    pub args: Vec<String>,
}

impl RuleInvocation {
    pub fn new(name: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// A bare rule with no arguments.
    pub fn bare(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }
}

/// Ordered rule invocations for one field.
pub type Pipeline = Vec<RuleInvocation>;

/// Parse a rule map into a pipeline per dotted field path.
///
/// Nested groups flatten with dot-joined keys, so
/// `{"address": {"route": "string|required"}}` and
/// `{"address.route": "string|required"}` produce the same map.
///
/// Parsing is pure and never fails; malformed tokens survive literally.
/// An empty rule name yields an invocation that the registry resolves to
/// the unknown-rule fallback at lookup time.
pub fn parse(rules: &Rules) -> BTreeMap<String, Pipeline> {
    let mut pipelines = BTreeMap::new();
    for (key, spec) in rules {
        parse_spec(key, spec, &mut pipelines);
    }
    pipelines
}

fn parse_spec(prefix: &str, spec: &RuleSpec, out: &mut BTreeMap<String, Pipeline>) {
    match spec {
        RuleSpec::List(list) => {
            out.insert(prefix.to_string(), parse_list(list));
        }
        RuleSpec::Group(group) => {
            for (key, inner) in group {
                let path = format!("{prefix}.{key}");
                parse_spec(&path, inner, out);
            }
        }
    }
}

/// Split a pipe-delimited rule list into invocations.
///
/// Each token splits once on `:`; the right side, if present, splits on
/// `,` into the argument list.
pub fn parse_list(list: &str) -> Pipeline {
    list.split('|')
        .map(|token| match token.split_once(':') {
            Some((name, args)) => {
                RuleInvocation::new(name, args.split(',').map(str::to_string).collect())
            }
            None => RuleInvocation::bare(token),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn splits_rules_and_args() {
        let pipeline = parse_list("required|max:10");
        assert_eq!(
            pipeline,
            vec![
                RuleInvocation::bare("required"),
                RuleInvocation::new("max", vec!["10".to_string()]),
            ]
        );
    }

    #[test]
    fn multiple_args_split_on_comma() {
        let pipeline = parse_list("unique:users,email");
        assert_eq!(
            pipeline,
            vec![RuleInvocation::new(
                "unique",
                vec!["users".to_string(), "email".to_string()]
            )]
        );
    }

    #[test]
    fn empty_arg_survives_literally() {
        let pipeline = parse_list("max:");
        assert_eq!(pipeline, vec![RuleInvocation::new("max", vec![String::new()])]);
    }

    #[test]
    fn empty_token_becomes_empty_rule_name() {
        let pipeline = parse_list("required||string");
        assert_eq!(pipeline.len(), 3);
        assert_eq!(pipeline[1], RuleInvocation::bare(""));
    }

    #[test]
    fn nested_groups_flatten_to_dotted_paths() {
        let rules = Rules::from([(
            "address".to_string(),
            RuleSpec::Group(BTreeMap::from([
                ("route".to_string(), RuleSpec::from("string|required")),
                ("streetNumber".to_string(), RuleSpec::from("number")),
            ])),
        )]);

        let pipelines = parse(&rules);
        assert_eq!(
            pipelines.keys().collect::<Vec<_>>(),
            vec!["address.route", "address.streetNumber"]
        );
        assert_eq!(
            pipelines["address.route"],
            vec![
                RuleInvocation::bare("string"),
                RuleInvocation::bare("required")
            ]
        );
    }

    #[test]
    fn dotted_key_and_group_agree() {
        let dotted = parse(&Rules::from([(
            "address.route".to_string(),
            RuleSpec::from("string"),
        )]));
        let grouped = parse(&Rules::from([(
            "address".to_string(),
            RuleSpec::Group(BTreeMap::from([(
                "route".to_string(),
                RuleSpec::from("string"),
            )])),
        )]));
        assert_eq!(dotted, grouped);
    }

    #[test]
    fn rule_spec_deserializes_both_forms() {
        let rules: Rules = serde_json::from_value(serde_json::json!({
            "email": "required|email",
            "address": { "route": "string" }
        }))
        .unwrap();
        assert!(matches!(rules["email"], RuleSpec::List(_)));
        assert!(matches!(rules["address"], RuleSpec::Group(_)));
    }

    // Strategy for rule tokens free of the three delimiters.
    fn invocation_strategy() -> impl Strategy<Value = RuleInvocation> {
        (
            "[a-z_]{1,12}",
            proptest::collection::vec("[a-zA-Z0-9]{1,6}", 0..3),
        )
            .prop_map(|(name, args)| RuleInvocation::new(name, args))
    }

    proptest! {
        // Formatting a pipeline back to its string form and reparsing it
        // reproduces the pipeline.
        #[test]
        fn parse_roundtrip(pipeline in proptest::collection::vec(invocation_strategy(), 1..5)) {
            let rendered = pipeline
                .iter()
                .map(|inv| {
                    if inv.args.is_empty() {
                        inv.name.clone()
                    } else {
                        format!("{}:{}", inv.name, inv.args.join(","))
                    }
                })
                .collect::<Vec<_>>()
                .join("|");
            prop_assert_eq!(parse_list(&rendered), pipeline);
        }
    }
}
