//! Observability infrastructure for the classifier service
//!
//! Provides:
//! - Prometheus metrics (prediction latency, outcomes per species, error counts, model state)
//! - Structured JSON logging with tracing

use crate::models::{Feature, Species};
use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, register_int_counter_vec,
    register_int_gauge, GaugeVec, Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for inference latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00001, 0.00005, 0.0001, 0.00025, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.05, 0.1,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ServiceMetricsInner> = OnceLock::new();

struct ServiceMetricsInner {
    prediction_latency_seconds: Histogram,
    predictions_total: IntCounterVec,
    validation_errors_total: IntCounterVec,
    service_errors_total: IntCounter,
    model_loaded: IntGauge,
    model_info: GaugeVec,
}

impl ServiceMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "iris_prediction_latency_seconds",
                "Time spent validating and classifying a request",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions_total: register_int_counter_vec!(
                "iris_predictions_total",
                "Successful predictions by predicted species",
                &["species"]
            )
            .expect("Failed to register predictions_total"),

            validation_errors_total: register_int_counter_vec!(
                "iris_validation_errors_total",
                "Rejected requests by offending field",
                &["field"]
            )
            .expect("Failed to register validation_errors_total"),

            service_errors_total: register_int_counter!(
                "iris_service_errors_total",
                "Requests that failed because the model was unavailable or inference faulted"
            )
            .expect("Failed to register service_errors_total"),

            model_loaded: register_int_gauge!(
                "iris_model_loaded",
                "1 when a model artifact is loaded, 0 otherwise"
            )
            .expect("Failed to register model_loaded"),

            model_info: register_gauge_vec!(
                "iris_model_info",
                "Information about the currently loaded model",
                &["version"]
            )
            .expect("Failed to register model_info"),
        }
    }
}

/// Service metrics for Prometheus exposition
///
/// A lightweight handle to the global metrics instance; clones share the
/// same underlying metrics.
#[derive(Clone)]
pub struct ServiceMetrics {
    _private: (),
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ServiceMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ServiceMetricsInner {
        GLOBAL_METRICS.get_or_init(ServiceMetricsInner::new)
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    pub fn inc_predictions(&self, species: Species) {
        self.inner()
            .predictions_total
            .with_label_values(&[species.name()])
            .inc();
    }

    /// `None` covers missing or non-numeric input
    pub fn inc_validation_errors(&self, feature: Option<Feature>) {
        let field = feature.map(|f| f.key()).unwrap_or("input");
        self.inner()
            .validation_errors_total
            .with_label_values(&[field])
            .inc();
    }

    pub fn inc_service_errors(&self) {
        self.inner().service_errors_total.inc();
    }

    /// Record model state; `None` means no artifact is loaded
    pub fn set_model(&self, version: Option<&str>) {
        self.inner().model_info.reset();
        match version {
            Some(version) => {
                self.inner().model_loaded.set(1);
                self.inner().model_info.with_label_values(&[version]).set(1.0);
            }
            None => self.inner().model_loaded.set(0),
        }
    }
}

/// Structured logger for service events
///
/// Provides consistent JSON-formatted logging for predictions,
/// rejections, and lifecycle events.
#[derive(Clone)]
pub struct StructuredLogger {
    service_name: String,
}

impl StructuredLogger {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn log_prediction(
        &self,
        species: Species,
        confidence: f64,
        model_version: &str,
        elapsed_us: u64,
    ) {
        info!(
            event = "prediction_served",
            service = %self.service_name,
            species = %species,
            confidence = confidence,
            model_version = %model_version,
            elapsed_us = elapsed_us,
            "Served prediction"
        );
    }

    pub fn log_rejection(&self, field: Option<Feature>, reason: &str) {
        info!(
            event = "prediction_rejected",
            service = %self.service_name,
            field = field.map(|f| f.key()).unwrap_or("input"),
            reason = %reason,
            "Rejected prediction request"
        );
    }

    pub fn log_failure(&self, reason: &str) {
        warn!(
            event = "prediction_failed",
            service = %self.service_name,
            reason = %reason,
            "Prediction failed"
        );
    }

    pub fn log_startup(&self, version: &str, model_version: Option<&str>) {
        info!(
            event = "server_started",
            service = %self.service_name,
            server_version = %version,
            model_version = model_version.unwrap_or("none"),
            model_loaded = model_version.is_some(),
            "Classifier service started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "server_shutdown",
            service = %self.service_name,
            reason = %reason,
            "Classifier service shutting down"
        );
    }
}
