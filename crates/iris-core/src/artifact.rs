//! Persisted model artifact
//!
//! The artifact is a single JSON document holding the fitted forest and its
//! training metadata. A SHA256 checksum over the serialized forest is stored
//! alongside it and verified on load.

use crate::error::ArtifactError;
use crate::forest::RandomForest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Current on-disk format version
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Well-known artifact location, relative to the working directory
pub const DEFAULT_ARTIFACT_PATH: &str = "models/flower_model.json";

/// Training provenance stored with the forest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub format_version: u32,
    /// Short identifier derived from the checksum
    pub model_version: String,
    pub trained_at: DateTime<Utc>,
    /// Held-out accuracy as a fraction
    pub accuracy: f64,
    pub train_samples: usize,
    pub test_samples: usize,
    pub split_seed: u64,
    pub forest_seed: u64,
    pub n_trees: usize,
    pub checksum: String,
}

/// Values known after evaluation, before the checksum is computed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingSummary {
    pub accuracy: f64,
    pub train_samples: usize,
    pub test_samples: usize,
    pub split_seed: u64,
}

/// A trained classifier plus its provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub metadata: ArtifactMetadata,
    pub forest: RandomForest,
}

impl ModelArtifact {
    pub fn new(
        forest: RandomForest,
        summary: TrainingSummary,
        trained_at: DateTime<Utc>,
    ) -> Result<Self, ArtifactError> {
        let checksum = forest_checksum(&forest)?;
        let metadata = ArtifactMetadata {
            format_version: ARTIFACT_FORMAT_VERSION,
            model_version: format!("rf-{}", &checksum[..12]),
            trained_at,
            accuracy: summary.accuracy,
            train_samples: summary.train_samples,
            test_samples: summary.test_samples,
            split_seed: summary.split_seed,
            forest_seed: forest.params().seed,
            n_trees: forest.n_trees(),
            checksum,
        };
        Ok(Self { metadata, forest })
    }

    pub fn model_version(&self) -> &str {
        &self.metadata.model_version
    }

    /// Write the artifact atomically, creating parent directories
    ///
    /// The document is written to a sibling temp file, synced, then renamed
    /// over `path`, so readers never observe a partial artifact.
    pub fn save(&self, path: &Path) -> Result<(), ArtifactError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ArtifactError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let bytes = serde_json::to_vec(self)?;
        let temp_path = temp_path_for(path);
        write_temp(&temp_path, |file| file.write_all(&bytes)).map_err(|source| {
            ArtifactError::Io {
                path: temp_path.clone(),
                source,
            }
        })?;

        if let Err(source) = fs::rename(&temp_path, path) {
            let _ = fs::remove_file(&temp_path);
            return Err(ArtifactError::Io {
                path: path.to_path_buf(),
                source,
            });
        }

        debug!(path = %path.display(), size_bytes = bytes.len(), "Model artifact written");
        Ok(())
    }

    /// Read and verify an artifact
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let bytes = fs::read(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_slice(&bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, ArtifactError> {
        // Check the version before decoding the rest, so future layouts get a clear error
        #[derive(Deserialize)]
        struct VersionProbe {
            metadata: ProbeMetadata,
        }
        #[derive(Deserialize)]
        struct ProbeMetadata {
            format_version: u32,
        }

        let probe: VersionProbe = serde_json::from_slice(bytes)?;
        if probe.metadata.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ArtifactError::UnsupportedVersion {
                found: probe.metadata.format_version,
                expected: ARTIFACT_FORMAT_VERSION,
            });
        }

        let artifact: ModelArtifact = serde_json::from_slice(bytes)?;
        let computed = forest_checksum(&artifact.forest)?;
        if computed != artifact.metadata.checksum {
            return Err(ArtifactError::ChecksumMismatch {
                expected: artifact.metadata.checksum,
                computed,
            });
        }
        Ok(artifact)
    }
}

/// Create `temp_path`, fill it and sync it; the file is removed on any failure
fn write_temp<F>(temp_path: &Path, write: F) -> io::Result<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let result = File::create(temp_path).and_then(|mut file| {
        write(&mut file)?;
        file.sync_all()
    });
    if result.is_err() {
        let _ = fs::remove_file(temp_path);
    }
    result
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Compute SHA256 checksum of the serialized forest
fn forest_checksum(forest: &RandomForest) -> Result<String, ArtifactError> {
    let bytes = serde_json::to_vec(forest)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}
