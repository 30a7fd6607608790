//! Reference dataset loading and deterministic train/test splitting
//!
//! Fisher's 150 iris specimens ship with the crate as CSV; alternative
//! datasets in the same layout can be read from disk.

use crate::error::TrainingError;
use crate::models::{Species, NUM_FEATURES, NUM_SPECIES};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::Path;

/// Embedded reference dataset
const REFERENCE_CSV: &str = include_str!("data/iris.csv");

/// Default fraction of samples held out for evaluation
pub const DEFAULT_TEST_FRACTION: f64 = 0.2;

/// Default seed for the train/test partition
pub const DEFAULT_SPLIT_SEED: u64 = 42;

/// One labeled specimen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabeledSample {
    pub features: [f64; NUM_FEATURES],
    pub species: Species,
}

/// A labeled dataset held in memory for the duration of training
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    samples: Vec<LabeledSample>,
}

impl Dataset {
    /// The embedded reference dataset
    pub fn reference() -> Result<Self, TrainingError> {
        Self::from_csv(REFERENCE_CSV)
    }

    /// Read a dataset from a CSV file
    pub fn from_path(path: &Path) -> Result<Self, TrainingError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TrainingError::Dataset(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_csv(&content)
    }

    /// Parse `sepal_length,sepal_width,petal_length,petal_width,species` rows
    ///
    /// A header row is skipped if its first column is not numeric. Blank
    /// lines and `#` comments are ignored.
    pub fn from_csv(content: &str) -> Result<Self, TrainingError> {
        let mut samples = Vec::new();

        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let columns: Vec<&str> = line.split(',').map(str::trim).collect();
            if samples.is_empty() && columns[0].parse::<f64>().is_err() {
                continue;
            }
            if columns.len() != NUM_FEATURES + 1 {
                return Err(TrainingError::Dataset(format!(
                    "line {}: expected {} columns, found {}",
                    line_no + 1,
                    NUM_FEATURES + 1,
                    columns.len()
                )));
            }

            let mut features = [0.0; NUM_FEATURES];
            for (slot, raw) in features.iter_mut().zip(&columns[..NUM_FEATURES]) {
                *slot = raw
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| {
                        TrainingError::Dataset(format!(
                            "line {}: invalid measurement {raw:?}",
                            line_no + 1
                        ))
                    })?;
            }
            let species = Species::parse_label(columns[NUM_FEATURES]).ok_or_else(|| {
                TrainingError::Dataset(format!(
                    "line {}: unknown species {:?}",
                    line_no + 1,
                    columns[NUM_FEATURES]
                ))
            })?;

            samples.push(LabeledSample { features, species });
        }

        if samples.is_empty() {
            return Err(TrainingError::Dataset("dataset contains no samples".to_string()));
        }
        Ok(Self { samples })
    }

    pub fn from_samples(samples: Vec<LabeledSample>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[LabeledSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn class_counts(&self) -> [usize; NUM_SPECIES] {
        let mut counts = [0; NUM_SPECIES];
        for s in &self.samples {
            counts[s.species.index()] += 1;
        }
        counts
    }

    /// Shuffle with a seeded RNG and hold out `ceil(test_fraction * n)` samples
    pub fn train_test_split(&self, test_fraction: f64, seed: u64) -> Result<Split, TrainingError> {
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(TrainingError::Config(format!(
                "test fraction must be in (0, 1), got {test_fraction}"
            )));
        }

        let n = self.samples.len();
        let n_test = (test_fraction * n as f64).ceil() as usize;
        if n_test == 0 || n_test >= n {
            return Err(TrainingError::Dataset(format!(
                "{n} samples cannot be split with test fraction {test_fraction}"
            )));
        }

        let mut order: Vec<usize> = (0..n).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        order.shuffle(&mut rng);

        let (test_idx, train_idx) = order.split_at(n_test);
        Ok(Split {
            train: Dataset::from_samples(train_idx.iter().map(|&i| self.samples[i]).collect()),
            test: Dataset::from_samples(test_idx.iter().map(|&i| self.samples[i]).collect()),
        })
    }
}

/// Training and held-out evaluation partitions
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub train: Dataset,
    pub test: Dataset,
}
