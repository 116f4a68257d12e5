//! Helpers for loosely-typed JSON coming from spreadsheet-backed endpoints.

use serde_json::Value;

/// Render a JSON scalar as a string.
///
/// Strings pass through unchanged, numbers and booleans use their JSON text.
/// `null`, arrays and objects have no scalar form and yield `None`.
pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
