//! Request pipeline: parse, validate, classify, assemble
//!
//! Each call is independent. Nothing is cached between requests and the only
//! shared state is the read-only [`ModelStore`].

use crate::classifier::OutputFormatter;
use crate::error::PredictionError;
use crate::models::PredictionResponse;
use crate::observability::{ServiceMetrics, StructuredLogger};
use crate::store::ModelStore;
use crate::validation::parse_features;
use serde_json::Value;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::error;

pub struct PredictionService {
    store: Arc<ModelStore>,
    formatter: OutputFormatter,
    metrics: ServiceMetrics,
    logger: StructuredLogger,
}

impl PredictionService {
    pub fn new(store: Arc<ModelStore>, metrics: ServiceMetrics, logger: StructuredLogger) -> Self {
        Self {
            store,
            formatter: OutputFormatter::new(),
            metrics,
            logger,
        }
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    pub fn is_model_loaded(&self) -> bool {
        self.store.is_loaded()
    }

    /// Run one prediction request end to end
    ///
    /// Validation happens before the model is consulted, so malformed input is
    /// reported as a client error even when no model is loaded.
    pub fn predict(&self, raw: &Value) -> Result<PredictionResponse, PredictionError> {
        let start = Instant::now();
        let result = self.run(raw);
        self.metrics
            .observe_prediction_latency(start.elapsed().as_secs_f64());

        match &result {
            Ok(response) => {
                self.metrics.inc_predictions(response.prediction);
                self.logger.log_prediction(
                    response.prediction,
                    response.confidence,
                    self.store.model_version().unwrap_or("unknown"),
                    start.elapsed().as_micros() as u64,
                );
            }
            Err(PredictionError::Validation(e)) => {
                self.metrics.inc_validation_errors(e.feature());
                self.logger.log_rejection(e.feature(), &e.to_string());
            }
            Err(e) => {
                self.metrics.inc_service_errors();
                self.logger.log_failure(&e.to_string());
            }
        }

        result
    }

    fn run(&self, raw: &Value) -> Result<PredictionResponse, PredictionError> {
        let features = parse_features(raw)?;

        let classifier = self
            .store
            .classifier()
            .ok_or(PredictionError::ModelUnavailable)?;

        let outcome = catch_unwind(AssertUnwindSafe(|| classifier.classify(&features)));
        let classification = match outcome {
            Ok(Ok(classification)) => classification,
            Ok(Err(e)) => {
                error!(event = "inference_error", error = %e, "Classifier returned an error");
                return Err(PredictionError::Inference(e.to_string()));
            }
            Err(panic) => {
                let detail = panic_message(panic.as_ref());
                error!(event = "inference_error", error = %detail, "Classifier panicked");
                return Err(PredictionError::Inference(detail));
            }
        };

        Ok(self.formatter.format(&classification))
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "classifier panicked".to_string()
    }
}
