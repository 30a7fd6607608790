//! HTTP API: prediction, health checks and Prometheus metrics

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use iris_core::{
    health::{ComponentStatus, HealthRegistry},
    observability::ServiceMetrics,
    ErrorResponse, PredictionError, PredictionService, INVALID_INPUT_MESSAGE,
};
use prometheus::{Encoder, TextEncoder};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Shared application state
pub struct AppState {
    pub service: Arc<PredictionService>,
    pub health_registry: HealthRegistry,
    pub metrics: ServiceMetrics,
}

impl AppState {
    pub fn new(
        service: Arc<PredictionService>,
        health_registry: HealthRegistry,
        metrics: ServiceMetrics,
    ) -> Self {
        Self {
            service,
            health_registry,
            metrics,
        }
    }
}

/// Classify one flower; 400 for bad input, 500 when the model cannot answer
async fn predict(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => {
            warn!(
                event = "prediction_rejected",
                reason = %rejection.body_text(),
                "Unparsable request body"
            );
            state.metrics.inc_validation_errors(None);
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(INVALID_INPUT_MESSAGE)),
            )
                .into_response();
        }
    };

    match state.service.predict(&body) {
        Ok(response) => {
            state.health_registry.record_inference_success().await;
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            if matches!(e, PredictionError::Inference(_)) {
                state.health_registry.record_inference_fault().await;
            }
            let status_code = if e.is_client_error() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status_code, Json(ErrorResponse::new(e.to_string()))).into_response()
        }
    }
}

/// Health check response - returns 200 unless a component is unhealthy
///
/// Repeated inference faults make the prediction service unhealthy.
async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Missing model is still reported here
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/health", get(health))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server, returning once `shutdown` resolves and in-flight
/// requests drain
pub async fn serve<F>(addr: &str, state: Arc<AppState>, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);

    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
