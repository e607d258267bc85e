use axum::{extract::DefaultBodyLimit, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::{AppConfig, ServiceDefinition};
use crate::error::ConfigError;
use crate::routes::{RouteInstaller, RouteSummary};
use crate::schema::SchemaRegistry;
use crate::store::{self, DocumentStore};

/// A validated service definition bound to a store.
pub struct Service {
    definition: ServiceDefinition,
    registry: SchemaRegistry,
    store: Arc<dyn DocumentStore>,
}

impl Service {
    /// Registers the collections and connects the store named by the definition.
    pub fn from_definition(definition: ServiceDefinition) -> Result<Self, ConfigError> {
        let store = store::connect(&definition.store, definition.credentials.as_deref())?;
        Self::with_store(definition, store)
    }

    pub fn with_store(definition: ServiceDefinition, store: Arc<dyn DocumentStore>) -> Result<Self, ConfigError> {
        let registry = SchemaRegistry::register(&definition.collections)?;
        tracing::info!("Registered {} collections", registry.len());
        Ok(Self { definition, registry, store })
    }

    pub fn definition(&self) -> &ServiceDefinition {
        &self.definition
    }

    fn installer(&self, config: &AppConfig) -> RouteInstaller<'_> {
        RouteInstaller::new(&self.registry, self.store.clone())
            .with_health_endpoint(config.server.health_endpoint.clone())
    }

    /// Runs every installation check and lists the routes that would be served.
    pub fn routes(&self, config: &AppConfig) -> Result<Vec<RouteSummary>, ConfigError> {
        let planned = self.installer(config).plan(&self.definition.actions)?;
        Ok(planned.iter().map(|ctx| ctx.summary()).collect())
    }

    pub fn router(&self, config: &AppConfig) -> Result<Router, ConfigError> {
        let mut router = self
            .installer(config)
            .install(&self.definition.actions)?
            .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes));

        if config.api.enable_cors {
            router = router.layer(CorsLayer::permissive());
        }
        if config.api.enable_request_logging {
            router = router.layer(TraceLayer::new_for_http());
        }

        Ok(router)
    }
}

/// Builds the full router for `definition` on top of `store`.
pub fn build_app(
    config: &AppConfig,
    definition: ServiceDefinition,
    store: Arc<dyn DocumentStore>,
) -> Result<Router, ConfigError> {
    Service::with_store(definition, store)?.router(config)
}
