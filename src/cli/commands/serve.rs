use anyhow::Context;
use std::path::Path;

use crate::app::Service;
use crate::config::{AppConfig, ServiceDefinition};

pub async fn handle(config_path: &Path, port: Option<u16>) -> anyhow::Result<()> {
    let definition = ServiceDefinition::load(config_path)?;

    let mut config = AppConfig::from_env();
    config.resolve_port(port, &definition);
    tracing::info!("Starting docrest in {:?} mode", config.environment);

    // All configuration errors surface here, before the port is bound
    let service = Service::from_definition(definition)?;
    let app = service.router(&config)?;

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("docrest listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
