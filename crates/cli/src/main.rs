//! Iris classifier CLI
//!
//! Trains the model offline and queries a running server for predictions
//! and health.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{health, predict, train};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Iris classifier CLI
#[derive(Parser)]
#[command(name = "iris")]
#[command(author, version, about = "CLI for the Iris species classifier", long_about = None)]
pub struct Cli {
    /// Server URL (can also be set via IRIS_API_URL env var)
    #[arg(long, env = "IRIS_API_URL", default_value = "http://localhost:5000")]
    pub api_url: String,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train the classifier and write the model artifact
    Train {
        /// CSV dataset to train on (uses the bundled iris dataset if not specified)
        #[arg(long)]
        dataset: Option<PathBuf>,

        /// Where to write the model artifact
        #[arg(
            long,
            short,
            env = "IRIS_MODEL_PATH",
            default_value = iris_core::DEFAULT_ARTIFACT_PATH
        )]
        output: PathBuf,

        /// Number of trees in the forest
        #[arg(long, default_value_t = iris_core::forest::DEFAULT_N_TREES)]
        trees: usize,

        /// Seed for bootstrap sampling and feature selection
        #[arg(long, default_value_t = iris_core::forest::DEFAULT_FOREST_SEED)]
        seed: u64,

        /// Seed for the train/test split
        #[arg(long, default_value_t = iris_core::dataset::DEFAULT_SPLIT_SEED)]
        split_seed: u64,

        /// Fraction of samples held out for evaluation
        #[arg(long, default_value_t = iris_core::dataset::DEFAULT_TEST_FRACTION)]
        test_fraction: f64,

        /// Maximum tree depth (unbounded if not specified)
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// Classify a flower using the running server
    Predict {
        /// Sepal length in cm
        #[arg(long)]
        sepal_length: f64,

        /// Sepal width in cm
        #[arg(long)]
        sepal_width: f64,

        /// Petal length in cm
        #[arg(long)]
        petal_length: f64,

        /// Petal width in cm
        #[arg(long)]
        petal_width: f64,
    },

    /// Show server health and whether a model is loaded
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .compact()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Train {
            dataset,
            output,
            trees,
            seed,
            split_seed,
            test_fraction,
            max_depth,
        } => {
            let options = train::TrainOptions {
                dataset,
                output,
                trees,
                seed,
                split_seed,
                test_fraction,
                max_depth,
            };
            train::run_training(options, cli.format)?;
        }
        Commands::Predict {
            sepal_length,
            sepal_width,
            petal_length,
            petal_width,
        } => {
            let client = client::ApiClient::new(&cli.api_url)?;
            let request = client::PredictRequest {
                sepal_length,
                sepal_width,
                petal_length,
                petal_width,
            };
            predict::predict(&client, &request, cli.format).await?;
        }
        Commands::Health => {
            let client = client::ApiClient::new(&cli.api_url)?;
            health::show_health(&client, cli.format).await?;
        }
    }

    Ok(())
}
