// Configuration-time and request-time error types
use axum::response::IntoResponse;
use std::path::PathBuf;
use thiserror::Error;

use crate::api::envelope::Envelope;
use crate::store::StoreError;

/// Fatal configuration errors. None of these may surface once the server
/// accepts connections; the binary exits before binding the port.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("You must provide documentAttributes for collection {0}")]
    MissingDocumentAttributes(String),

    #[error("Action {endpoint} references unknown collection {collection}")]
    UnknownCollection { collection: String, endpoint: String },

    #[error("Unknown request type: {0}")]
    UnknownRequestType(String),

    #[error("Limit cannot be used on its own (endpoint {0})")]
    LimitWithoutOrder(String),

    #[error("Limit must be a positive integer (endpoint {0})")]
    InvalidLimit(String),

    #[error("Unknown query operator: {0}")]
    UnknownOperator(String),

    #[error("Unknown sort order: {0} (expected asc or desc)")]
    UnknownSortOrder(String),

    #[error("Query on {0} has an operator but no attribute to filter")]
    MissingQueryAttribute(String),

    #[error("{verb} {endpoint} requires a paramKey")]
    MissingParamKey { verb: String, endpoint: String },

    #[error("Endpoint must start with '/': {0}")]
    InvalidEndpoint(String),

    #[error("Endpoint {endpoint} is malformed: {reason}")]
    MalformedEndpoint { endpoint: String, reason: &'static str },

    #[error("Endpoint {endpoint} conflicts with {existing}: path parameters at the same position must share a name")]
    ConflictingRoute { endpoint: String, existing: String },

    #[error("Route {verb} {endpoint} is declared more than once")]
    DuplicateRoute { verb: String, endpoint: String },

    #[error("Unsupported store backend: {0}")]
    UnsupportedBackend(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML service definition: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid JSON service definition: {0}")]
    Json(#[from] serde_json::Error),
}

/// Recoverable per-request failures, all rendered as an error envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Don't use these keys: {}: they are not in the schema", .0.join(", "))]
    ForeignKeys(Vec<String>),

    #[error("Missed keys: {}", .0.join(", "))]
    MissingKeys(Vec<String>),

    #[error("Your request body must have at least one key from documentAttributes: {}", .0.join(", "))]
    NoRecognizedKeys(Vec<String>),

    #[error("Your endpoint should have a param with key '{param_key}', currently it looks like this: {endpoint}")]
    MissingParam { param_key: String, endpoint: String },

    #[error("No document with id {id} found in collection {collection}")]
    NotFound { id: String, collection: String },

    #[error("Request body must be a JSON object: {0}")]
    InvalidBody(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        Envelope::error(self.to_string()).into_response()
    }
}
