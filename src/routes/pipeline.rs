use serde_json::{Map, Value};
use std::collections::HashMap;

use super::dispatch::{BodyRule, Requirements};
use crate::error::ApiError;
use crate::schema::{self, CollectionSpec};

/// Request body as handed over by the extractor.
#[derive(Debug, Clone)]
pub enum Body {
    Absent,
    Json(Value),
    /// The body could not be read as JSON; carries the reason
    Invalid(String),
}

/// Output of a successful validation pass.
#[derive(Debug, Clone, Default)]
pub struct Validated {
    /// Path parameter value, when the route requires one
    pub param: Option<String>,
    /// Document fields to write, when the route accepts a body
    pub fields: Map<String, Value>,
}

/// Runs the checks every handler shares, stopping at the first failure:
/// foreign keys, then required keys, then the path parameter.
pub fn validate(
    requirements: Requirements,
    collection: &CollectionSpec,
    endpoint: &str,
    param_key: Option<&str>,
    params: &HashMap<String, String>,
    body: Body,
) -> Result<Validated, ApiError> {
    let fields = match requirements.body {
        BodyRule::None => Map::new(),
        rule => check_body(rule, &collection.document_attributes, body)?,
    };

    let param = if requirements.param {
        let key = param_key.unwrap_or_default();
        match params.get(key).filter(|v| !v.is_empty()) {
            Some(value) => Some(value.clone()),
            None => {
                return Err(ApiError::MissingParam {
                    param_key: key.to_string(),
                    endpoint: endpoint.to_string(),
                })
            }
        }
    } else {
        None
    };

    Ok(Validated { param, fields })
}

fn check_body(rule: BodyRule, attributes: &[String], body: Body) -> Result<Map<String, Value>, ApiError> {
    let body = match body {
        Body::Json(Value::Object(map)) => map,
        Body::Json(other) => return Err(ApiError::InvalidBody(format!("got {}", json_type(&other)))),
        Body::Absent => return Err(ApiError::InvalidBody("no body supplied".to_string())),
        Body::Invalid(reason) => return Err(ApiError::InvalidBody(reason)),
    };

    if schema::has_foreign_keys(&body, attributes) {
        return Err(ApiError::ForeignKeys(schema::foreign_keys(&body, attributes)));
    }

    match rule {
        BodyRule::Full => {
            if !schema::has_all_required_keys(&body, attributes) {
                return Err(ApiError::MissingKeys(schema::missing_keys(&body, attributes)));
            }
            Ok(body)
        }
        BodyRule::Partial => {
            if !schema::has_any_recognized_key(&body, attributes) {
                return Err(ApiError::NoRecognizedKeys(attributes.to_vec()));
            }
            Ok(schema::truthy_fields(&body))
        }
        BodyRule::None => Ok(Map::new()),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
