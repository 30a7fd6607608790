//! Iris server - serves species predictions over HTTP
//!
//! Loads the trained model once at startup; a missing model is reported by
//! the health endpoint and every prediction fails until the server is
//! restarted with an artifact in place.

use anyhow::{Context, Result};
use iris_core::{
    health::{components, HealthRegistry},
    observability::{ServiceMetrics, StructuredLogger},
    ModelStore, PredictionService,
};
use iris_server::{api, config::ServerConfig};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting iris-server");

    let config = ServerConfig::load().context("failed to load server configuration")?;
    info!(
        host = %config.host,
        port = config.port,
        model_path = %config.model_path.display(),
        "Server configured"
    );

    let health_registry = HealthRegistry::new();
    health_registry.register(components::MODEL_STORE).await;
    health_registry.register(components::PREDICTION_SERVICE).await;

    // The store is filled before any request path exists
    let store = Arc::new(ModelStore::load(&config.model_path));
    health_registry.set_model_loaded(store.is_loaded()).await;

    let metrics = ServiceMetrics::new();
    metrics.set_model(store.model_version());

    let logger = StructuredLogger::new("iris-server");
    let service = Arc::new(PredictionService::new(
        store.clone(),
        metrics.clone(),
        logger.clone(),
    ));

    let app_state = Arc::new(api::AppState::new(
        service,
        health_registry.clone(),
        metrics,
    ));

    health_registry.set_ready(true).await;
    logger.log_startup(SERVER_VERSION, store.model_version());

    api::serve(&config.bind_address(), app_state, shutdown_signal(logger)).await?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal(logger: StructuredLogger) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => logger.log_shutdown("SIGINT received"),
        Err(e) => {
            // Keep serving; the process can still be stopped externally
            error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await
        }
    }
}
