pub mod error;
pub mod memory;
pub mod query;

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;

use crate::config::StoreConfig;
use crate::error::ConfigError;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use query::{Filter, Operator, OrderBy, SortOrder, StoreQuery};

/// A stored document: its id plus the attribute map.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self { id: id.into(), fields }
    }

    /// Flattens into `{id, ...fields}`; the document id wins over a stored `id` field.
    pub fn to_value(&self) -> Value {
        let mut obj = Map::with_capacity(self.fields.len() + 1);
        obj.insert("id".into(), Value::String(self.id.clone()));
        for (k, v) in &self.fields {
            if k != "id" {
                obj.insert(k.clone(), v.clone());
            }
        }
        Value::Object(obj)
    }
}

/// Per-collection document operations. Each call completes once; failures
/// are reported, never retried.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Documents of `collection` matching `query`, in query order.
    async fn get(&self, collection: &str, query: &StoreQuery) -> Result<Vec<Document>, StoreError>;

    async fn get_by_id(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Creates a document under a generated id and returns that id.
    async fn add(&self, collection: &str, fields: Map<String, Value>) -> Result<String, StoreError>;

    /// Creates or fully replaces the document at `id`.
    async fn set(&self, collection: &str, id: &str, fields: Map<String, Value>) -> Result<(), StoreError>;

    /// Merges `fields` into an existing document. Fails if it does not exist.
    async fn update(&self, collection: &str, id: &str, fields: Map<String, Value>) -> Result<(), StoreError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Builds the store selected by the service definition.
pub fn connect(config: &StoreConfig, credentials: Option<&Path>) -> Result<Arc<dyn DocumentStore>, ConfigError> {
    match config.backend.as_str() {
        "memory" => {
            if let Some(path) = credentials {
                tracing::info!("In-memory store ignores credentials at {}", path.display());
            }
            Ok(Arc::new(MemoryStore::new()))
        }
        other => Err(ConfigError::UnsupportedBackend(other.to_string())),
    }
}
