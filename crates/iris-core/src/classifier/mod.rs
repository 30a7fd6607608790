//! Species classification over validated feature vectors

mod inference;
mod output;

pub use inference::ForestClassifier;
pub use output::{check_probabilities, round_to, OutputFormatter, PROBABILITY_TOLERANCE};

use crate::error::ClassifierError;
use crate::models::{ClassificationResult, FeatureVector};

/// Capability shared by the trained model and test doubles
///
/// Implementations must be pure: the same vector always yields the same
/// result, and concurrent calls need no synchronization.
pub trait Classifier: Send + Sync {
    /// Probability for every species plus the argmax
    fn classify(&self, features: &FeatureVector) -> Result<ClassificationResult, ClassifierError>;

    /// Identifier of the loaded model
    fn model_version(&self) -> &str;
}
