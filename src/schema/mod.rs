pub mod validate;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::error::ConfigError;

pub use validate::{
    foreign_keys, has_all_required_keys, has_any_recognized_key, has_foreign_keys, is_truthy,
    missing_keys, truthy_fields,
};

/// Collection entry as written in the service definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionConfig {
    pub document_attributes: Option<Vec<String>>,
}

/// A registered collection and the attribute names its documents may carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSpec {
    pub name: String,
    pub document_attributes: Vec<String>,
}

/// Read-only map of collection name to attribute allowlist, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    collections: HashMap<String, Arc<CollectionSpec>>,
}

impl SchemaRegistry {
    /// Builds the registry, failing on the first collection without attributes.
    pub fn register(collections: &BTreeMap<String, CollectionConfig>) -> Result<Self, ConfigError> {
        let mut registered = HashMap::with_capacity(collections.len());

        for (name, config) in collections {
            let attributes = match &config.document_attributes {
                Some(attrs) if !attrs.is_empty() => attrs.clone(),
                _ => return Err(ConfigError::MissingDocumentAttributes(name.clone())),
            };

            tracing::debug!("Registered collection '{}' with attributes [{}]", name, attributes.join(", "));
            registered.insert(
                name.clone(),
                Arc::new(CollectionSpec { name: name.clone(), document_attributes: attributes }),
            );
        }

        Ok(Self { collections: registered })
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<CollectionSpec>> {
        self.collections.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }
}
