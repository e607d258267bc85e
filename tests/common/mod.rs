#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, Method, Request, StatusCode};
use axum::Router;
use docrest_api::api::Envelope;
use docrest_api::store::{Document, DocumentStore, MemoryStore, StoreError, StoreQuery};
use docrest_api::{build_app, AppConfig, ServiceDefinition};
use serde_json::{Map, Value};
use tower::ServiceExt;

pub const SERVICE_YAML: &str = r#"
collections:
  users:
    documentAttributes: [name, email]
  scores:
    documentAttributes: [player, points, city]
actions:
  - { collection: users, endpoint: /users, request: { type: GET } }
  - { collection: users, endpoint: "/users/:id", request: { type: GET, paramKey: id } }
  - { collection: users, endpoint: /users, request: { type: POST } }
  - { collection: users, endpoint: "/users/:id", request: { type: PUT, paramKey: id } }
  - { collection: users, endpoint: "/users/:id", request: { type: PATCH, paramKey: id } }
  - { collection: users, endpoint: "/users/:id", request: { type: DELETE, paramKey: id } }
  - { collection: users, endpoint: /users/bulk, request: { type: PUT, paramKey: id } }
  - collection: scores
    endpoint: /scores/top
    request:
      type: GET
      query: { orderBy: points, order: desc, limit: 2 }
  - collection: scores
    endpoint: /scores/high
    request:
      type: GET
      query: { attribute: points, operator: ">=", value: 50 }
  - collection: scores
    endpoint: "/scores/city/:city"
    request:
      type: GET
      paramKey: city
      query: { orderBy: points, order: asc }
  - collection: scores
    endpoint: "/scores/not-city/:city"
    request:
      type: GET
      paramKey: city
      query: { operator: "!=", orderBy: points, order: asc }
  - { collection: users, endpoint: /users/lookup, request: { type: GET, paramKey: id } }
  - { collection: users, endpoint: /users/remove, request: { type: DELETE, paramKey: id } }
"#;

pub fn definition() -> ServiceDefinition {
    ServiceDefinition::from_yaml_str(SERVICE_YAML).expect("test definition parses")
}

pub fn fields(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("object literal")
}

/// Memory store that counts every operation issued through the trait.
#[derive(Default)]
pub struct RecordingStore {
    pub inner: MemoryStore,
    calls: AtomicUsize,
}

impl RecordingStore {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for RecordingStore {
    async fn get(&self, collection: &str, query: &StoreQuery) -> Result<Vec<Document>, StoreError> {
        self.record();
        self.inner.get(collection, query).await
    }

    async fn get_by_id(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.record();
        self.inner.get_by_id(collection, id).await
    }

    async fn add(&self, collection: &str, fields: Map<String, Value>) -> Result<String, StoreError> {
        self.record();
        self.inner.add(collection, fields).await
    }

    async fn set(&self, collection: &str, id: &str, fields: Map<String, Value>) -> Result<(), StoreError> {
        self.record();
        self.inner.set(collection, id, fields).await
    }

    async fn update(&self, collection: &str, id: &str, fields: Map<String, Value>) -> Result<(), StoreError> {
        self.record();
        self.inner.update(collection, id, fields).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.record();
        self.inner.delete(collection, id).await
    }
}

/// Store whose every operation fails with the same message.
pub struct FailingStore(pub &'static str);

#[async_trait]
impl DocumentStore for FailingStore {
    async fn get(&self, _: &str, _: &StoreQuery) -> Result<Vec<Document>, StoreError> {
        Err(StoreError::Unavailable(self.0.to_string()))
    }

    async fn get_by_id(&self, _: &str, _: &str) -> Result<Option<Document>, StoreError> {
        Err(StoreError::Unavailable(self.0.to_string()))
    }

    async fn add(&self, _: &str, _: Map<String, Value>) -> Result<String, StoreError> {
        Err(StoreError::Unavailable(self.0.to_string()))
    }

    async fn set(&self, _: &str, _: &str, _: Map<String, Value>) -> Result<(), StoreError> {
        Err(StoreError::Unavailable(self.0.to_string()))
    }

    async fn update(&self, _: &str, _: &str, _: Map<String, Value>) -> Result<(), StoreError> {
        Err(StoreError::Unavailable(self.0.to_string()))
    }

    async fn delete(&self, _: &str, _: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable(self.0.to_string()))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Err(StoreError::Unavailable(self.0.to_string()))
    }
}

pub fn app_with(store: Arc<dyn DocumentStore>) -> Router {
    build_app(&AppConfig::default(), definition(), store).expect("test definition installs")
}

/// Sends one request through the router and decodes the envelope.
/// Every generated route answers 200, so that is asserted here.
pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Result<Envelope> {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header(CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_vec(&value)?)
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(builder.body(body)?).await?;
    assert_eq!(response.status(), StatusCode::OK, "unexpected status for {}", uri);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

pub fn message(envelope: &Envelope) -> &str {
    envelope.message.as_deref().unwrap_or_default()
}
