//! Deterministic, case-insensitive ordering of object keys.

use std::cmp::Ordering;

use serde_json::{Map, Value};

/// Compare two object keys ignoring case.
///
/// Both keys are lowercased and compared as UTF-16 code units, which is the
/// order JSON tooling in browsers and Node produces for the same data.
///
/// # Examples
///
/// ```
/// use std::cmp::Ordering;
/// use json_pilot::sort::key_cmp;
///
/// assert_eq!(key_cmp("apple", "Banana"), Ordering::Less);
/// assert_eq!(key_cmp("Zeta", "alpha"), Ordering::Greater);
/// assert_eq!(key_cmp("Name", "name"), Ordering::Equal);
/// assert_eq!(key_cmp("__pilot", "age"), Ordering::Less);
/// ```
pub fn key_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .encode_utf16()
        .cmp(b.to_lowercase().encode_utf16())
}

fn fold(key: &str) -> Vec<u16> {
    key.to_lowercase().encode_utf16().collect()
}

/// Returns a copy of `value` with object keys sorted by [`key_cmp`].
///
/// Objects nested in objects are sorted too. Arrays and scalars pass
/// through untouched, including any objects held inside arrays. Keys that
/// compare equal keep their relative order.
///
/// # Examples
///
/// ```
/// use json_pilot::sort::sort_keys;
/// use serde_json::json;
///
/// let sorted = sort_keys(&json!({"b": 1, "A": {"d": 2, "c": 3}, "list": [{"z": 0, "y": 0}]}));
/// assert_eq!(
///     serde_json::to_string(&sorted).unwrap(),
///     r#"{"A":{"c":3,"d":2},"b":1,"list":[{"z":0,"y":0}]}"#
/// );
/// ```
pub fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(sort_map(map)),
        other => other.clone(),
    }
}

/// Object-level form of [`sort_keys`].
pub fn sort_map(map: &Map<String, Value>) -> Map<String, Value> {
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    entries.sort_by_cached_key(|(key, _)| fold(key));
    entries
        .into_iter()
        .map(|(key, value)| (key.clone(), sort_keys(value)))
        .collect()
}
