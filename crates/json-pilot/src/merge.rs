//! Additive deep merge of patch defaults into a document.

use serde_json::map::Entry;
use serde_json::{Map, Value};

use crate::document::PILOT_KEY;

/// Returns a copy of `target` with every key of `patch` it lacks filled in.
///
/// Existing values always win:
/// - a key missing from `target` gets a deep copy of the patch subtree
/// - a key holding an object in both is merged recursively
/// - any other existing value (scalar, null, array, or an object facing a
///   non-object patch value) is left as is
///
/// [`PILOT_KEY`] is skipped at every level. Keys only present in `target`
/// are untouched, and inserted keys follow the existing ones in patch order.
///
/// # Examples
///
/// ```
/// use json_pilot::merge::merge;
/// use serde_json::json;
///
/// let patch = json!({"name": "Default Name", "age": 0, "tags": ["new"]});
/// let target = json!({"name": "John Doe", "tags": []});
///
/// let merged = merge(patch.as_object().unwrap(), target.as_object().unwrap());
/// assert_eq!(
///     serde_json::Value::Object(merged),
///     json!({"name": "John Doe", "tags": [], "age": 0})
/// );
/// ```
pub fn merge(patch: &Map<String, Value>, target: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = target.clone();
    merge_into(patch, &mut merged);
    merged
}

/// In-place form of [`merge`].
pub fn merge_into(patch: &Map<String, Value>, target: &mut Map<String, Value>) {
    for (key, incoming) in patch {
        if key == PILOT_KEY {
            continue;
        }
        match target.entry(key.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(incoming.clone());
            }
            Entry::Occupied(mut slot) => {
                if let (Value::Object(existing), Value::Object(nested)) = (slot.get_mut(), incoming) {
                    merge_into(nested, existing);
                }
            }
        }
    }
}

/// [`merge`] over arbitrary values.
///
/// Only two objects are merged; any other combination returns `target`
/// unchanged.
pub fn merge_value(patch: &Value, target: &Value) -> Value {
    match (patch, target) {
        (Value::Object(patch), Value::Object(target)) => Value::Object(merge(patch, target)),
        _ => target.clone(),
    }
}
