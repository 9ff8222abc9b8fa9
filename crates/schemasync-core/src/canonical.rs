//! Leaf-value canonicalization
//!
//! Every scalar leaf becomes its string form while maps and sequences keep
//! their shape. Cluster objects therefore always carry string leaves no matter
//! how the repository encoded them.

use serde_json::Value;

/// Return the canonical form of `value`
///
/// Numbers use their JSON rendering and booleans become `"true"`/`"false"`.
/// `null` has no string form and is kept as is.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| (key.clone(), canonicalize(item)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        Value::Bool(b) => Value::String(b.to_string()),
        Value::Number(n) => Value::String(n.to_string()),
        Value::String(_) | Value::Null => value.clone(),
    }
}

/// Check whether `value` is already canonical
pub fn is_canonical(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.values().all(is_canonical),
        Value::Array(items) => items.iter().all(is_canonical),
        Value::String(_) | Value::Null => true,
        Value::Bool(_) | Value::Number(_) => false,
    }
}
