use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

use super::dispatch::HandlerKind;
use super::pipeline::{self, Body, Validated};
use super::RouteContext;
use crate::api::Envelope;
use crate::error::ApiError;
use crate::store::{Document, DocumentStore};

/// Entry point for every generated route: validate, run the template, wrap the outcome.
pub async fn handle(ctx: Arc<RouteContext>, params: HashMap<String, String>, body: Body) -> Envelope {
    tracing::debug!("{} {} -> {} on {}", ctx.kind.verb(), ctx.endpoint, ctx.kind.name(), ctx.collection.name);

    match run(&ctx, &params, body).await {
        Ok(envelope) => envelope,
        Err(ApiError::Store(e)) => {
            tracing::error!("Store operation failed for {} {}: {}", ctx.kind.verb(), ctx.endpoint, e);
            Envelope::error(e.to_string())
        }
        Err(e) => {
            tracing::warn!("Rejected {} {}: {}", ctx.kind.verb(), ctx.endpoint, e);
            Envelope::error(e.to_string())
        }
    }
}

async fn run(ctx: &RouteContext, params: &HashMap<String, String>, body: Body) -> Result<Envelope, ApiError> {
    let input = pipeline::validate(
        ctx.kind.requirements(),
        &ctx.collection,
        &ctx.endpoint,
        ctx.param_key.as_deref(),
        params,
        body,
    )?;

    match ctx.kind {
        HandlerKind::ParamQuery => param_query(ctx, input).await,
        HandlerKind::PointLookup => point_lookup(ctx, input).await,
        HandlerKind::CollectionQuery | HandlerKind::CollectionScan => collection_read(ctx).await,
        HandlerKind::Create => create(ctx, input).await,
        HandlerKind::Replace => replace(ctx, input).await,
        HandlerKind::PartialUpdate => partial_update(ctx, input).await,
        HandlerKind::Delete => delete(ctx, input).await,
    }
}

fn documents_envelope(docs: Vec<Document>) -> Envelope {
    let count = docs.len();
    let data = Value::Array(docs.iter().map(Document::to_value).collect());
    Envelope::data_with_message(data, format!("Found {} documents", count))
}

/// Param is guaranteed by validation for every template that reads it.
fn param(input: &Validated) -> &str {
    input.param.as_deref().unwrap_or_default()
}

async fn param_query(ctx: &RouteContext, input: Validated) -> Result<Envelope, ApiError> {
    let field = ctx.param_key.clone().unwrap_or_default();
    let mut query = ctx.query.base.clone();
    query.filters.push(crate::store::Filter::new(
        field,
        ctx.query.param_operator,
        Value::String(param(&input).to_string()),
    ));

    let docs = ctx.store.get(&ctx.collection.name, &query).await?;
    Ok(documents_envelope(docs))
}

async fn point_lookup(ctx: &RouteContext, input: Validated) -> Result<Envelope, ApiError> {
    let id = param(&input);
    match ctx.store.get_by_id(&ctx.collection.name, id).await? {
        Some(doc) => Ok(Envelope::data(doc.to_value())),
        None => Err(ApiError::NotFound {
            id: id.to_string(),
            collection: ctx.collection.name.clone(),
        }),
    }
}

async fn collection_read(ctx: &RouteContext) -> Result<Envelope, ApiError> {
    let docs = ctx.store.get(&ctx.collection.name, &ctx.query.base).await?;
    Ok(documents_envelope(docs))
}

async fn create(ctx: &RouteContext, input: Validated) -> Result<Envelope, ApiError> {
    let id = ctx.store.add(&ctx.collection.name, input.fields).await?;
    tracing::info!("Created document {} in {}", id, ctx.collection.name);
    Ok(Envelope::data(json!({ "id": id })))
}

async fn replace(ctx: &RouteContext, input: Validated) -> Result<Envelope, ApiError> {
    let id = param(&input).to_string();
    ctx.store.set(&ctx.collection.name, &id, input.fields).await?;
    Ok(Envelope::message(format!("Document with id {} was updated", id)))
}

async fn partial_update(ctx: &RouteContext, input: Validated) -> Result<Envelope, ApiError> {
    let id = param(&input).to_string();
    ctx.store.update(&ctx.collection.name, &id, input.fields).await?;
    Ok(Envelope::message(format!("Document with id {} was updated", id)))
}

async fn delete(ctx: &RouteContext, input: Validated) -> Result<Envelope, ApiError> {
    let id = param(&input);
    ctx.store.delete(&ctx.collection.name, id).await?;
    Ok(Envelope::message(format!("Document with id {} was deleted", id)))
}

/// GET on the configured health endpoint.
pub async fn health(store: Arc<dyn DocumentStore>) -> Envelope {
    let now = chrono::Utc::now();

    match store.health_check().await {
        Ok(()) => Envelope::data(json!({ "store": "ok", "timestamp": now })),
        Err(e) => {
            tracing::error!("Store health check failed: {}", e);
            Envelope::error(e.to_string())
        }
    }
}
