//! Offline training command

use anyhow::{Context, Result};
use colored::Colorize;
use iris_core::forest::ForestParams;
use iris_core::trainer::{ClassificationReport, Trainer, TrainerConfig, TrainingOutcome};
use iris_core::ArtifactMetadata;
use serde::Serialize;
use std::path::PathBuf;
use tabled::Tabled;

use crate::output::{format_fraction, print_info, print_json, print_success, OutputFormat};

/// Options collected from the command line
#[derive(Debug, Clone)]
pub struct TrainOptions {
    pub dataset: Option<PathBuf>,
    pub output: PathBuf,
    pub trees: usize,
    pub seed: u64,
    pub split_seed: u64,
    pub test_fraction: f64,
    pub max_depth: Option<usize>,
}

impl TrainOptions {
    fn into_config(self) -> TrainerConfig {
        TrainerConfig {
            dataset_path: self.dataset,
            test_fraction: self.test_fraction,
            split_seed: self.split_seed,
            forest: ForestParams {
                n_trees: self.trees,
                seed: self.seed,
                max_depth: self.max_depth,
                ..ForestParams::default()
            },
            artifact_path: self.output,
        }
    }
}

/// Row for the classification report table
#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "Class")]
    class: String,
    #[tabled(rename = "Precision")]
    precision: String,
    #[tabled(rename = "Recall")]
    recall: String,
    #[tabled(rename = "F1")]
    f1: String,
    #[tabled(rename = "Support")]
    support: usize,
}

#[derive(Serialize)]
struct TrainSummary<'a> {
    path: String,
    metadata: &'a ArtifactMetadata,
    report: &'a ClassificationReport,
}

/// Train, evaluate and persist the model
pub fn run_training(options: TrainOptions, format: OutputFormat) -> Result<()> {
    let config = options.into_config();
    let path = config.artifact_path.clone();
    let outcome = Trainer::new(config)
        .run()
        .context("Model training failed")?;

    match format {
        OutputFormat::Json => print_json(&TrainSummary {
            path: path.display().to_string(),
            metadata: &outcome.artifact.metadata,
            report: &outcome.report,
        })?,
        OutputFormat::Table => print_outcome(&outcome, &path),
    }

    Ok(())
}

fn print_outcome(outcome: &TrainingOutcome, path: &std::path::Path) {
    let metadata = &outcome.artifact.metadata;

    println!("{}", "Training Summary".bold());
    println!("{}", "=".repeat(60));
    println!("Model version:  {}", metadata.model_version.cyan());
    println!("Trees:          {}", metadata.n_trees);
    println!(
        "Samples:        {} train / {} test",
        metadata.train_samples, metadata.test_samples
    );
    println!(
        "Seeds:          split {} / forest {}",
        metadata.split_seed, metadata.forest_seed
    );
    println!();

    print_success(&format!(
        "Model trained with accuracy: {}",
        format_fraction(outcome.accuracy).bold()
    ));
    println!();

    let report = &outcome.report;
    let mut rows: Vec<ReportRow> = report
        .classes
        .iter()
        .map(|c| ReportRow {
            class: c.species.to_string(),
            precision: format!("{:.2}", c.precision),
            recall: format!("{:.2}", c.recall),
            f1: format!("{:.2}", c.f1),
            support: c.support,
        })
        .collect();
    for (label, avg) in [
        ("macro avg", &report.macro_avg),
        ("weighted avg", &report.weighted_avg),
    ] {
        rows.push(ReportRow {
            class: label.to_string(),
            precision: format!("{:.2}", avg.precision),
            recall: format!("{:.2}", avg.recall),
            f1: format!("{:.2}", avg.f1),
            support: avg.support,
        });
    }

    let table = tabled::Table::new(rows)
        .with(tabled::settings::Style::rounded())
        .to_string();
    println!("{}", "Classification Report".bold());
    println!("{}", table);
    println!();

    print_info(&format!("Model saved to {}", path.display()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_map_onto_trainer_config() {
        let options = TrainOptions {
            dataset: None,
            output: PathBuf::from("out/model.json"),
            trees: 7,
            seed: 3,
            split_seed: 9,
            test_fraction: 0.25,
            max_depth: Some(4),
        };
        let config = options.into_config();

        assert_eq!(config.forest.n_trees, 7);
        assert_eq!(config.forest.seed, 3);
        assert_eq!(config.forest.max_depth, Some(4));
        assert_eq!(config.split_seed, 9);
        assert_eq!(config.test_fraction, 0.25);
        assert_eq!(config.artifact_path, PathBuf::from("out/model.json"));
    }

    #[test]
    fn test_training_writes_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("model.json");
        let options = TrainOptions {
            dataset: None,
            output: output.clone(),
            trees: 5,
            seed: 42,
            split_seed: 42,
            test_fraction: 0.2,
            max_depth: None,
        };

        run_training(options, OutputFormat::Json).unwrap();
        assert!(output.exists());
    }
}
