//! Dotted-path access into nested records.

use serde_json::Value;

/// Resolve a dotted key path (`"a.b.c"`) against a nested record.
///
/// Walks the path segment by segment: object segments look up by key,
/// numeric segments index into arrays. Any miss yields the empty-string
/// sentinel instead of an error; higher-level rules such as `required`
/// treat the sentinel as "missing". A present-but-falsy leaf (`0`,
/// `false`, `""`) resolves to itself, never to the sentinel.
pub fn resolve(record: &Value, path: &str) -> Value {
    let mut node = record;
    for segment in path.split('.') {
        let next = match node {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        match next {
            Some(value) => node = value,
            None => return missing(),
        }
    }
    node.clone()
}

/// The sentinel for an absent path segment.
pub fn missing() -> Value {
    Value::String(String::new())
}
