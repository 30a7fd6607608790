//! Error taxonomy for validation, inference, artifacts and training

use crate::models::{Feature, FeatureRange};
use std::path::PathBuf;
use thiserror::Error;

/// Message returned for missing or non-numeric input
pub const INVALID_INPUT_MESSAGE: &str = "Invalid input. Please enter valid numbers.";

/// Message returned when no model artifact is loaded
pub const MODEL_UNAVAILABLE_MESSAGE: &str = "Model not loaded. Please train the model first.";

/// Client-caused input problems; never reach the classifier
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{}", INVALID_INPUT_MESSAGE)]
    InvalidInput,

    #[error("{} must be between {:.1} and {:.1} cm", .feature.label(), .range.min, .range.max)]
    OutOfRange { feature: Feature, range: FeatureRange },
}

impl ValidationError {
    /// The offending field, if the failure is field-specific
    pub fn feature(&self) -> Option<Feature> {
        match self {
            ValidationError::InvalidInput => None,
            ValidationError::OutOfRange { feature, .. } => Some(*feature),
        }
    }
}

/// Failures raised by a classifier implementation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifierError {
    #[error("model produced malformed probabilities: {0}")]
    MalformedOutput(String),

    #[error("model is empty")]
    EmptyModel,
}

/// Outcome of a failed prediction request
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{}", MODEL_UNAVAILABLE_MESSAGE)]
    ModelUnavailable,

    /// Details are logged, not echoed to callers
    #[error("An error occurred during prediction")]
    Inference(String),
}

impl PredictionError {
    /// Client-caused failures map to 4xx, the rest to 5xx
    pub fn is_client_error(&self) -> bool {
        matches!(self, PredictionError::Validation(_))
    }
}

/// Problems reading or writing a persisted model
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to access artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode artifact: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("unsupported artifact format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("artifact checksum mismatch (expected {expected}, computed {computed})")]
    ChecksumMismatch { expected: String, computed: String },
}

/// Fatal failures of the offline training step
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("reference dataset unavailable: {0}")]
    Dataset(String),

    #[error("invalid training configuration: {0}")]
    Config(String),

    #[error("evaluation failed: {0}")]
    Evaluation(#[from] ClassifierError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_message_names_field_and_range() {
        let err = ValidationError::OutOfRange {
            feature: Feature::SepalLength,
            range: Feature::SepalLength.range(),
        };
        assert_eq!(err.to_string(), "Sepal length must be between 4.0 and 8.0 cm");
        assert_eq!(err.feature(), Some(Feature::SepalLength));
    }

    #[test]
    fn test_petal_width_message_keeps_one_decimal() {
        let err = ValidationError::OutOfRange {
            feature: Feature::PetalWidth,
            range: Feature::PetalWidth.range(),
        };
        assert_eq!(err.to_string(), "Petal width must be between 0.1 and 3.0 cm");
    }

    #[test]
    fn test_prediction_error_classification() {
        assert!(PredictionError::from(ValidationError::InvalidInput).is_client_error());
        assert!(!PredictionError::ModelUnavailable.is_client_error());
        assert!(!PredictionError::Inference("boom".into()).is_client_error());
        assert_eq!(
            PredictionError::ModelUnavailable.to_string(),
            MODEL_UNAVAILABLE_MESSAGE
        );
        assert_eq!(
            PredictionError::from(ValidationError::InvalidInput).to_string(),
            INVALID_INPUT_MESSAGE
        );
    }

    #[test]
    fn test_message_constants_match_display() {
        assert_eq!(ValidationError::InvalidInput.to_string(), INVALID_INPUT_MESSAGE);
        assert_eq!(
            PredictionError::ModelUnavailable.to_string(),
            MODEL_UNAVAILABLE_MESSAGE
        );
    }

    #[test]
    fn test_classifier_failure_during_training_is_evaluation_error() {
        let err = TrainingError::from(ClassifierError::EmptyModel);
        assert!(matches!(
            err,
            TrainingError::Evaluation(ClassifierError::EmptyModel)
        ));
        assert_eq!(err.to_string(), "evaluation failed: model is empty");
    }
}
