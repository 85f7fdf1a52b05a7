use restbench_value::{ObjectMap, Value};
use std::sync::Arc;

/// Placeholder replaced with the decimal iteration index in URLs, header
/// values, and string leaves of JSON body templates.
pub const INDEX_TOKEN: &str = "#{INDEX}";

#[must_use]
pub fn substitute_str(input: &str, index: u64) -> String {
    if input.contains(INDEX_TOKEN) {
        input.replace(INDEX_TOKEN, &index.to_string())
    } else {
        input.to_string()
    }
}

/// Recursively substitute the index token through a value tree. Non-string
/// leaves pass through unchanged.
#[must_use]
pub fn substitute_value(value: &Value, index: u64) -> Value {
    match value {
        Value::String(s) => {
            if s.contains(INDEX_TOKEN) {
                Value::String(Arc::from(substitute_str(s, index).as_str()))
            } else {
                value.clone()
            }
        }
        Value::Array(items) => {
            Value::Array(items.iter().map(|v| substitute_value(v, index)).collect())
        }
        Value::Object(map) => {
            let mut out = ObjectMap::default();
            for (k, v) in map {
                out.insert(k.clone(), substitute_value(v, index));
            }
            Value::Object(out)
        }
        other => other.clone(),
    }
}

#[must_use]
pub fn substitute_headers(headers: &[(String, String)], index: u64) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(k, v)| (k.clone(), substitute_str(v, index)))
        .collect()
}
