//! Random forest inference over a loaded artifact

use super::output::check_probabilities;
use super::Classifier;
use crate::artifact::ModelArtifact;
use crate::error::ClassifierError;
use crate::models::{ClassificationResult, FeatureVector};
use std::time::Instant;
use tracing::debug;

/// Maximum inference latency before it is worth a log line
const SLOW_INFERENCE_MICROS: u128 = 1_000;

/// The production classifier: a forest restored from disk
pub struct ForestClassifier {
    artifact: ModelArtifact,
}

impl ForestClassifier {
    pub fn new(artifact: ModelArtifact) -> Self {
        Self { artifact }
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }
}

impl Classifier for ForestClassifier {
    fn classify(&self, features: &FeatureVector) -> Result<ClassificationResult, ClassifierError> {
        let start = Instant::now();
        let probabilities = self.artifact.forest.predict_proba(&features.as_array())?;
        check_probabilities(&probabilities)?;

        let elapsed = start.elapsed();
        if elapsed.as_micros() > SLOW_INFERENCE_MICROS {
            debug!(elapsed_us = elapsed.as_micros() as u64, "Slow inference");
        }

        Ok(ClassificationResult::from_probabilities(probabilities))
    }

    fn model_version(&self) -> &str {
        self.artifact.model_version()
    }
}
