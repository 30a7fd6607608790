//! Process-wide model slot, filled once at startup
//!
//! A `ModelStore` is built before the server accepts requests and is then
//! shared behind an `Arc` with no interior mutability. Changes to the artifact
//! on disk are not picked up until restart.

use crate::artifact::ModelArtifact;
use crate::classifier::{Classifier, ForestClassifier};
use crate::error::ArtifactError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Read-only handle to the loaded classifier, if any
#[derive(Clone)]
pub struct ModelStore {
    classifier: Option<Arc<dyn Classifier>>,
    source: Option<PathBuf>,
}

impl std::fmt::Debug for ModelStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelStore")
            .field("loaded", &self.is_loaded())
            .field("model_version", &self.model_version())
            .field("source", &self.source)
            .finish()
    }
}

impl ModelStore {
    /// Load the artifact at `path`; a missing or unreadable artifact leaves
    /// the store unloaded rather than failing startup
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(store) => store,
            Err(ArtifactError::Io { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                warn!(
                    event = "model_missing",
                    path = %path.display(),
                    "Model not found. Train the model first with `iris train`"
                );
                Self::empty()
            }
            Err(e) => {
                error!(
                    event = "model_missing",
                    path = %path.display(),
                    error = %e,
                    "Failed to load model artifact"
                );
                Self::empty()
            }
        }
    }

    /// Like [`ModelStore::load`] but surfaces the failure
    pub fn try_load(path: &Path) -> Result<Self, ArtifactError> {
        let artifact = ModelArtifact::load(path)?;
        info!(
            event = "model_loaded",
            path = %path.display(),
            model_version = %artifact.model_version(),
            accuracy = artifact.metadata.accuracy,
            n_trees = artifact.metadata.n_trees,
            "Model loaded successfully"
        );
        Ok(Self {
            classifier: Some(Arc::new(ForestClassifier::new(artifact))),
            source: Some(path.to_path_buf()),
        })
    }

    /// A store with no model; every prediction reports the model as unavailable
    pub fn empty() -> Self {
        Self {
            classifier: None,
            source: None,
        }
    }

    pub fn from_classifier(classifier: Arc<dyn Classifier>) -> Self {
        Self {
            classifier: Some(classifier),
            source: None,
        }
    }

    pub fn classifier(&self) -> Option<&Arc<dyn Classifier>> {
        self.classifier.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.classifier.is_some()
    }

    pub fn model_version(&self) -> Option<&str> {
        self.classifier.as_ref().map(|c| c.model_version())
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}
