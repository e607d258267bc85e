//! Key-set checks applied to request bodies.
//!
//! Presence is judged by truthiness: `null`, `false`, `0`, and `""` count as
//! missing. Arrays and objects are always present, even when empty.

use serde_json::{Map, Value};

pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn present(body: &Map<String, Value>, key: &str) -> bool {
    body.get(key).map(is_truthy).unwrap_or(false)
}

pub fn has_all_required_keys(body: &Map<String, Value>, attributes: &[String]) -> bool {
    attributes.iter().all(|attr| present(body, attr))
}

/// Attributes failing the presence test, in `attributes` order.
pub fn missing_keys(body: &Map<String, Value>, attributes: &[String]) -> Vec<String> {
    attributes
        .iter()
        .filter(|attr| !present(body, attr))
        .cloned()
        .collect()
}

pub fn has_foreign_keys(body: &Map<String, Value>, attributes: &[String]) -> bool {
    body.keys().any(|key| !attributes.contains(key))
}

/// Body keys outside the allowlist, in body order.
pub fn foreign_keys(body: &Map<String, Value>, attributes: &[String]) -> Vec<String> {
    body.keys()
        .filter(|key| !attributes.contains(key))
        .cloned()
        .collect()
}

pub fn has_any_recognized_key(body: &Map<String, Value>, attributes: &[String]) -> bool {
    attributes.iter().any(|attr| present(body, attr))
}

/// Copy of `body` without its falsy-valued entries.
pub fn truthy_fields(body: &Map<String, Value>) -> Map<String, Value> {
    body.iter()
        .filter(|(_, v)| is_truthy(v))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}
