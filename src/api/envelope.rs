use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// Uniform `{status, data?, message?}` body returned by every generated route.
///
/// Errors are reported in the body only; the HTTP status is always 200.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Envelope {
    /// Success carrying content
    pub fn data(data: Value) -> Self {
        Self { status: Status::Success, data: Some(data), message: None }
    }

    /// Success carrying content and a summary line
    pub fn data_with_message(data: Value, message: impl Into<String>) -> Self {
        Self { status: Status::Success, data: Some(data), message: Some(message.into()) }
    }

    /// Success that reports an action rather than content
    pub fn message(message: impl Into<String>) -> Self {
        Self { status: Status::Success, data: None, message: Some(message.into()) }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { status: Status::Error, data: None, message: Some(message.into()) }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}
