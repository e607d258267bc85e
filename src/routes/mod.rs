pub mod action;
pub mod dispatch;
pub mod handlers;
pub mod pipeline;

use axum::{
    extract::{rejection::JsonRejection, Path},
    routing::{get, on, MethodRouter},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use crate::error::ConfigError;
use crate::schema::{CollectionSpec, SchemaRegistry};
use crate::store::DocumentStore;

pub use action::{ActionSpec, QuerySpec, RequestSpec, Verb};
pub use dispatch::{compile_query, BodyRule, CompiledQuery, HandlerKind, Requirements};
pub use pipeline::Body;

/// Everything a generated handler needs, resolved once at install time.
pub struct RouteContext {
    pub kind: HandlerKind,
    pub endpoint: String,
    pub collection: Arc<CollectionSpec>,
    pub param_key: Option<String>,
    pub query: CompiledQuery,
    pub store: Arc<dyn DocumentStore>,
}

/// Summary of an installed route, for logging and `docrest check`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteSummary {
    pub verb: String,
    pub endpoint: String,
    pub collection: String,
    pub handler: String,
}

impl RouteContext {
    pub fn summary(&self) -> RouteSummary {
        RouteSummary {
            verb: self.kind.verb().to_string(),
            endpoint: self.endpoint.clone(),
            collection: self.collection.name.clone(),
            handler: self.kind.name().to_string(),
        }
    }
}

/// Turns action declarations into axum routes. All configuration checks run
/// here, synchronously, before any request can be served.
pub struct RouteInstaller<'a> {
    registry: &'a SchemaRegistry,
    store: Arc<dyn DocumentStore>,
    health_endpoint: Option<String>,
}

impl<'a> RouteInstaller<'a> {
    pub fn new(registry: &'a SchemaRegistry, store: Arc<dyn DocumentStore>) -> Self {
        Self { registry, store, health_endpoint: None }
    }

    /// Also serve a store health check on `endpoint`.
    pub fn with_health_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.health_endpoint = Some(endpoint.into());
        self
    }

    /// Validates every action and resolves its handler template, without building a router.
    pub fn plan(&self, actions: &[ActionSpec]) -> Result<Vec<Arc<RouteContext>>, ConfigError> {
        let mut seen: HashSet<(Verb, &str)> = HashSet::new();
        if let Some(health) = &self.health_endpoint {
            if !health.starts_with('/') {
                return Err(ConfigError::InvalidEndpoint(health.clone()));
            }
            seen.insert((Verb::Get, health.as_str()));
        }

        let mut planned = Vec::with_capacity(actions.len());
        for action in actions {
            let ctx = self.resolve(action)?;

            if !seen.insert((ctx.kind.verb(), action.endpoint.as_str())) {
                return Err(ConfigError::DuplicateRoute {
                    verb: ctx.kind.verb().to_string(),
                    endpoint: action.endpoint.clone(),
                });
            }

            planned.push(Arc::new(ctx));
        }

        let mut endpoints: Vec<&str> = Vec::new();
        let declared = actions.iter().map(|a| a.endpoint.as_str());
        for endpoint in self.health_endpoint.as_deref().into_iter().chain(declared) {
            if !endpoints.contains(&endpoint) {
                endpoints.push(endpoint);
            }
        }
        check_path_shapes(&endpoints)?;

        Ok(planned)
    }

    pub fn install(&self, actions: &[ActionSpec]) -> Result<Router, ConfigError> {
        let planned = self.plan(actions)?;

        let mut by_endpoint: BTreeMap<String, MethodRouter> = BTreeMap::new();
        for ctx in planned {
            let summary = ctx.summary();
            tracing::info!(
                "Installed {} {} -> {} ({})",
                summary.verb,
                summary.endpoint,
                summary.handler,
                summary.collection
            );

            let endpoint = ctx.endpoint.clone();
            let method_router = method_router(ctx);
            let merged = match by_endpoint.remove(&endpoint) {
                Some(existing) => existing.merge(method_router),
                None => method_router,
            };
            by_endpoint.insert(endpoint, merged);
        }

        if let Some(health) = &self.health_endpoint {
            let store = self.store.clone();
            let health_router = get(move || handlers::health(store));
            let merged = match by_endpoint.remove(health) {
                Some(existing) => existing.merge(health_router),
                None => health_router,
            };
            by_endpoint.insert(health.clone(), merged);
        }

        Ok(by_endpoint
            .into_iter()
            .fold(Router::new(), |router, (endpoint, method_router)| router.route(&endpoint, method_router)))
    }

    fn resolve(&self, action: &ActionSpec) -> Result<RouteContext, ConfigError> {
        let verb: Verb = action.request.kind.parse()?;

        if !action.endpoint.starts_with('/') {
            return Err(ConfigError::InvalidEndpoint(action.endpoint.clone()));
        }

        let collection = self.registry.lookup(&action.collection).ok_or_else(|| ConfigError::UnknownCollection {
            collection: action.collection.clone(),
            endpoint: action.endpoint.clone(),
        })?;

        let param_key = action.request.param_key.clone().filter(|k| !k.is_empty());
        let kind = HandlerKind::select(verb, param_key.is_some(), action.request.query.is_some());

        if kind.requirements().param {
            match &param_key {
                Some(key) if !has_placeholder(&action.endpoint, key) => {
                    tracing::warn!(
                        "Endpoint {} has no ':{}' segment; requests to it will be rejected",
                        action.endpoint,
                        key
                    );
                }
                Some(_) => {}
                None => {
                    return Err(ConfigError::MissingParamKey {
                        verb: verb.to_string(),
                        endpoint: action.endpoint.clone(),
                    })
                }
            }
        }

        let query = match (&action.request.query, verb) {
            (Some(spec), Verb::Get) => compile_query(&action.endpoint, kind, spec)?,
            (Some(_), _) => {
                tracing::warn!("Query on {} {} is ignored; only GET routes query", verb, action.endpoint);
                CompiledQuery::scan()
            }
            (None, _) => CompiledQuery::scan(),
        };

        Ok(RouteContext {
            kind,
            endpoint: action.endpoint.clone(),
            collection,
            param_key,
            query,
            store: self.store.clone(),
        })
    }
}

fn has_placeholder(endpoint: &str, key: &str) -> bool {
    endpoint
        .split('/')
        .any(|segment| segment.strip_prefix(':').or_else(|| segment.strip_prefix('*')) == Some(key))
}

/// A path segment as the axum router interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Static(&'a str),
    Param(&'a str),
    CatchAll(&'a str),
}

fn segments(endpoint: &str) -> Result<Vec<Segment<'_>>, ConfigError> {
    let malformed = |reason: &'static str| ConfigError::MalformedEndpoint { endpoint: endpoint.to_string(), reason };
    let parts: Vec<&str> = endpoint.split('/').skip(1).collect();
    let last = parts.len().saturating_sub(1);

    parts
        .into_iter()
        .enumerate()
        .map(|(i, part)| {
            let is_marker = |c: char| c == ':' || c == '*';
            if let Some(name) = part.strip_prefix(':') {
                if name.is_empty() || name.contains(is_marker) {
                    return Err(malformed("a ':' segment needs a single parameter name"));
                }
                Ok(Segment::Param(name))
            } else if let Some(name) = part.strip_prefix('*') {
                if name.is_empty() || name.contains(is_marker) {
                    return Err(malformed("a '*' segment needs a single parameter name"));
                }
                if i != last {
                    return Err(malformed("a '*' catch-all is only allowed as the last segment"));
                }
                Ok(Segment::CatchAll(name))
            } else if part.contains(is_marker) {
                Err(malformed("parameters must take up a whole segment"))
            } else {
                Ok(Segment::Static(part))
            }
        })
        .collect()
}

/// Rejects endpoint sets the router cannot hold together: two paths that agree
/// up to some position and then put differently named parameters there.
fn check_path_shapes(endpoints: &[&str]) -> Result<(), ConfigError> {
    let shapes = endpoints
        .iter()
        .map(|endpoint| Ok((*endpoint, segments(endpoint)?)))
        .collect::<Result<Vec<_>, ConfigError>>()?;

    for (i, (existing, a)) in shapes.iter().enumerate() {
        for (endpoint, b) in &shapes[i + 1..] {
            for (x, y) in a.iter().zip(b) {
                match (x, y) {
                    (Segment::Static(p), Segment::Static(q)) if p == q => continue,
                    (Segment::Static(_), _) | (_, Segment::Static(_)) => break,
                    (x, y) if x == y => continue,
                    _ => {
                        return Err(ConfigError::ConflictingRoute {
                            endpoint: endpoint.to_string(),
                            existing: existing.to_string(),
                        })
                    }
                }
            }
        }
    }

    Ok(())
}

fn path_params(params: Option<Path<HashMap<String, String>>>) -> HashMap<String, String> {
    params.map(|Path(p)| p).unwrap_or_default()
}

fn read_body(body: Result<Json<Value>, JsonRejection>) -> Body {
    match body {
        Ok(Json(value)) => Body::Json(value),
        Err(rejection) => Body::Invalid(rejection.body_text()),
    }
}

fn method_router(ctx: Arc<RouteContext>) -> MethodRouter {
    let filter = ctx.kind.verb().method_filter();

    if ctx.kind.requirements().body == BodyRule::None {
        on(filter, move |params: Option<Path<HashMap<String, String>>>| {
            handlers::handle(ctx, path_params(params), Body::Absent)
        })
    } else {
        on(
            filter,
            move |params: Option<Path<HashMap<String, String>>>, body: Result<Json<Value>, JsonRejection>| {
                handlers::handle(ctx, path_params(params), read_body(body))
            },
        )
    }
}
