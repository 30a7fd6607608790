//! Prediction command

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use crate::client::{ApiClient, PredictRequest, PredictionResponse};
use crate::output::{color_confidence, format_percent, percent_bar, print_json, OutputFormat};

/// Row for the probability table
#[derive(Tabled)]
struct ProbabilityRow {
    #[tabled(rename = "Species")]
    species: String,
    #[tabled(rename = "Probability")]
    probability: String,
    #[tabled(rename = "")]
    bar: String,
}

/// Ask the server to classify one flower
pub async fn predict(
    client: &ApiClient,
    request: &PredictRequest,
    format: OutputFormat,
) -> Result<()> {
    let response = client.predict(request).await?;

    match format {
        OutputFormat::Json => print_json(&response)?,
        OutputFormat::Table => print_prediction(&response),
    }

    Ok(())
}

fn print_prediction(response: &PredictionResponse) {
    println!("{}", "Prediction".bold());
    println!("{}", "=".repeat(60));
    println!("Species:     {}", response.prediction.to_string().cyan().bold());
    println!("Confidence:  {}", color_confidence(response.confidence));
    println!("{}", response.description);
    println!();

    let rows: Vec<ProbabilityRow> = response
        .probabilities
        .iter()
        .map(|(species, percent)| ProbabilityRow {
            species: species.to_string(),
            probability: format_percent(*percent),
            bar: percent_bar(*percent, 20),
        })
        .collect();

    let table = tabled::Table::new(rows)
        .with(tabled::settings::Style::rounded())
        .to_string();
    println!("{}", table);
}
