//! Core library for the iris species classifier
//!
//! This crate provides the core functionality for:
//! - Feature parsing and range validation
//! - Random forest training over the reference dataset
//! - Model artifact persistence and loading
//! - Request-level prediction with structured errors
//! - Health checks and observability

pub mod artifact;
pub mod classifier;
pub mod dataset;
pub mod error;
pub mod forest;
pub mod health;
pub mod models;
pub mod observability;
pub mod service;
pub mod store;
pub mod trainer;
pub mod validation;

pub use artifact::{ArtifactMetadata, ModelArtifact, DEFAULT_ARTIFACT_PATH};
pub use classifier::{Classifier, ForestClassifier};
pub use error::{
    ArtifactError, ClassifierError, PredictionError, TrainingError, ValidationError,
    INVALID_INPUT_MESSAGE, MODEL_UNAVAILABLE_MESSAGE,
};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{ServiceMetrics, StructuredLogger};
pub use service::PredictionService;
pub use store::ModelStore;
pub use trainer::{ClassificationReport, Trainer, TrainerConfig, TrainingOutcome};
