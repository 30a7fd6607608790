//! Offline training: split, fit, evaluate, persist
//!
//! A run either writes a complete artifact or writes nothing. Every failure
//! before the final atomic rename leaves the artifact location untouched.

use crate::artifact::{ModelArtifact, TrainingSummary, DEFAULT_ARTIFACT_PATH};
use crate::dataset::{Dataset, DEFAULT_SPLIT_SEED, DEFAULT_TEST_FRACTION};
use crate::error::{ClassifierError, TrainingError};
use crate::forest::{ForestParams, RandomForest};
use crate::models::{Species, NUM_SPECIES};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// Training run configuration
#[derive(Debug, Clone, PartialEq)]
pub struct TrainerConfig {
    /// Alternative CSV dataset; the embedded reference set is used when absent
    pub dataset_path: Option<PathBuf>,
    pub test_fraction: f64,
    pub split_seed: u64,
    pub forest: ForestParams,
    pub artifact_path: PathBuf,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            dataset_path: None,
            test_fraction: DEFAULT_TEST_FRACTION,
            split_seed: DEFAULT_SPLIT_SEED,
            forest: ForestParams::default(),
            artifact_path: PathBuf::from(DEFAULT_ARTIFACT_PATH),
        }
    }
}

/// Per-species precision, recall and F1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub species: Species,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Aggregate precision, recall and F1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Held-out evaluation report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub accuracy: f64,
    pub classes: Vec<ClassMetrics>,
    pub macro_avg: AverageMetrics,
    pub weighted_avg: AverageMetrics,
    /// `confusion[actual][predicted]`
    pub confusion: [[usize; NUM_SPECIES]; NUM_SPECIES],
}

impl ClassificationReport {
    /// Build from (actual, predicted) class indices
    pub fn from_pairs(pairs: &[(usize, usize)]) -> Self {
        let mut confusion = [[0usize; NUM_SPECIES]; NUM_SPECIES];
        for &(actual, predicted) in pairs {
            confusion[actual][predicted] += 1;
        }

        let total = pairs.len();
        let correct: usize = (0..NUM_SPECIES).map(|i| confusion[i][i]).sum();
        let accuracy = ratio(correct, total);

        let classes: Vec<ClassMetrics> = Species::ALL
            .iter()
            .map(|&species| {
                let i = species.index();
                let tp = confusion[i][i];
                let predicted: usize = (0..NUM_SPECIES).map(|a| confusion[a][i]).sum();
                let support: usize = confusion[i].iter().sum();
                let precision = ratio(tp, predicted);
                let recall = ratio(tp, support);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassMetrics {
                    species,
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect();

        let n = classes.len() as f64;
        let macro_avg = AverageMetrics {
            precision: classes.iter().map(|c| c.precision).sum::<f64>() / n,
            recall: classes.iter().map(|c| c.recall).sum::<f64>() / n,
            f1: classes.iter().map(|c| c.f1).sum::<f64>() / n,
            support: total,
        };

        let weight = |f: fn(&ClassMetrics) -> f64| {
            if total == 0 {
                0.0
            } else {
                classes.iter().map(|c| f(c) * c.support as f64).sum::<f64>() / total as f64
            }
        };
        let weighted_avg = AverageMetrics {
            precision: weight(|c| c.precision),
            recall: weight(|c| c.recall),
            f1: weight(|c| c.f1),
            support: total,
        };

        Self {
            accuracy,
            classes,
            macro_avg,
            weighted_avg,
            confusion,
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Everything a training run produced
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub artifact: ModelArtifact,
    /// Held-out accuracy as a fraction
    pub accuracy: f64,
    pub report: ClassificationReport,
}

/// Fits and evaluates the ensemble, then persists it
pub struct Trainer {
    config: TrainerConfig,
}

impl Trainer {
    pub fn new(config: TrainerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Train and evaluate without touching the filesystem
    pub fn train(&self) -> Result<TrainingOutcome, TrainingError> {
        let start = Instant::now();
        let dataset = match &self.config.dataset_path {
            Some(path) => Dataset::from_path(path)?,
            None => Dataset::reference()?,
        };
        info!(
            samples = dataset.len(),
            classes = ?dataset.class_counts(),
            "Loaded training dataset"
        );

        let split = dataset.train_test_split(self.config.test_fraction, self.config.split_seed)?;
        let forest = RandomForest::fit(split.train.samples(), self.config.forest)?;

        let pairs = split
            .test
            .samples()
            .iter()
            .map(|s| {
                forest
                    .predict(&s.features)
                    .map(|predicted| (s.species.index(), predicted))
            })
            .collect::<Result<Vec<_>, ClassifierError>>()?;
        let report = ClassificationReport::from_pairs(&pairs);

        let summary = TrainingSummary {
            accuracy: report.accuracy,
            train_samples: split.train.len(),
            test_samples: split.test.len(),
            split_seed: self.config.split_seed,
        };
        let artifact = ModelArtifact::new(forest, summary, chrono::Utc::now())?;

        info!(
            event = "training_complete",
            model_version = %artifact.model_version(),
            accuracy = report.accuracy,
            train_samples = summary.train_samples,
            test_samples = summary.test_samples,
            n_trees = artifact.metadata.n_trees,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Model training complete"
        );

        Ok(TrainingOutcome {
            accuracy: report.accuracy,
            artifact,
            report,
        })
    }

    /// Train, then write the artifact to the configured location
    pub fn run(&self) -> Result<TrainingOutcome, TrainingError> {
        let outcome = self.train()?;
        outcome.artifact.save(&self.config.artifact_path)?;
        info!(
            path = %self.config.artifact_path.display(),
            model_version = %outcome.artifact.model_version(),
            "Model saved"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn quick_config(dir: &std::path::Path) -> TrainerConfig {
        TrainerConfig {
            forest: ForestParams {
                n_trees: 20,
                ..ForestParams::default()
            },
            artifact_path: dir.join("models").join("flower_model.json"),
            ..TrainerConfig::default()
        }
    }

    #[test]
    fn test_report_from_perfect_predictions() {
        let pairs = vec![(0, 0), (1, 1), (2, 2), (2, 2)];
        let report = ClassificationReport::from_pairs(&pairs);
        assert_eq!(report.accuracy, 1.0);
        assert!(report.classes.iter().all(|c| c.f1 == 1.0));
        assert_eq!(report.classes[2].support, 2);
        assert_eq!(report.weighted_avg.support, 4);
    }

    #[test]
    fn test_report_with_confusion() {
        // Two versicolor, one predicted as virginica
        let pairs = vec![(0, 0), (1, 1), (1, 2), (2, 2)];
        let report = ClassificationReport::from_pairs(&pairs);

        assert_eq!(report.accuracy, 0.75);
        assert_eq!(report.confusion[1][2], 1);
        let versicolor = report.classes[1];
        assert_eq!(versicolor.precision, 1.0);
        assert_eq!(versicolor.recall, 0.5);
        let virginica = report.classes[2];
        assert_eq!(virginica.precision, 0.5);
        assert_eq!(virginica.recall, 1.0);
    }

    #[test]
    fn test_report_handles_absent_class() {
        let report = ClassificationReport::from_pairs(&[(0, 0)]);
        assert_eq!(report.classes[1].precision, 0.0);
        assert_eq!(report.classes[1].f1, 0.0);
    }

    #[test]
    fn test_train_reaches_high_accuracy() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = Trainer::new(quick_config(dir.path())).train().unwrap();

        assert!(outcome.accuracy >= 0.85, "accuracy {}", outcome.accuracy);
        assert_eq!(outcome.accuracy, outcome.artifact.metadata.accuracy);
        assert_eq!(outcome.artifact.metadata.train_samples, 120);
        assert_eq!(outcome.artifact.metadata.test_samples, 30);
        assert_eq!(outcome.report.weighted_avg.support, 30);
    }

    #[test]
    fn test_train_does_not_write_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let config = quick_config(dir.path());
        Trainer::new(config.clone()).train().unwrap();
        assert!(!config.artifact_path.exists());
    }

    #[test]
    fn test_run_creates_directories_and_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let config = quick_config(dir.path());
        let outcome = Trainer::new(config.clone()).run().unwrap();

        let loaded = ModelArtifact::load(&config.artifact_path).unwrap();
        assert_eq!(loaded.forest, outcome.artifact.forest);
    }

    #[test]
    fn test_missing_dataset_fails_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let config = TrainerConfig {
            dataset_path: Some(dir.path().join("missing.csv")),
            ..quick_config(dir.path())
        };

        let err = Trainer::new(config.clone()).run().unwrap_err();
        assert!(matches!(err, TrainingError::Dataset(_)));
        assert!(!config.artifact_path.exists());
        assert!(!config.artifact_path.parent().unwrap().exists());
    }

    #[test]
    fn test_custom_dataset_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("tiny.csv");
        let mut file = std::fs::File::create(&csv_path).unwrap();
        for i in 0..10 {
            let offset = i as f64 * 0.01;
            writeln!(file, "{},3.5,1.4,0.2,setosa", 5.0 + offset).unwrap();
            writeln!(file, "{},2.9,4.3,1.3,versicolor", 6.0 + offset).unwrap();
            writeln!(file, "{},3.0,5.8,2.2,virginica", 6.5 + offset).unwrap();
        }
        drop(file);

        let config = TrainerConfig {
            dataset_path: Some(csv_path),
            ..quick_config(dir.path())
        };
        let outcome = Trainer::new(config).train().unwrap();
        assert_eq!(outcome.artifact.metadata.train_samples, 24);
        assert_eq!(outcome.artifact.metadata.test_samples, 6);
        assert_eq!(outcome.accuracy, 1.0);
    }
}
