//! Server health command

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use crate::client::{ApiClient, HealthResponse};
use crate::output::{color_status, print_json, print_success, print_warning, OutputFormat};

/// Row for the component table
#[derive(Tabled)]
struct ComponentRow {
    #[tabled(rename = "Component")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Message")]
    message: String,
}

/// Show server health and model state
pub async fn show_health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let health = client.health().await?;

    match format {
        OutputFormat::Json => print_json(&health)?,
        OutputFormat::Table => print_health(&health),
    }

    Ok(())
}

fn print_health(health: &HealthResponse) {
    println!("{}", "Server Health".bold());
    println!("{}", "=".repeat(60));
    println!("Status: {}", color_status(health.status.as_str()));
    println!();

    if health.model_loaded {
        print_success("Model loaded");
    } else {
        print_warning("Model not loaded. Train it with `iris train` and restart the server");
    }

    if health.components.is_empty() {
        return;
    }

    let mut rows: Vec<ComponentRow> = health
        .components
        .iter()
        .map(|(name, component)| ComponentRow {
            name: name.clone(),
            status: color_status(component.status.as_str()),
            message: component.message.clone().unwrap_or_else(|| "-".to_string()),
        })
        .collect();
    rows.sort_by(|a, b| a.name.cmp(&b.name));

    println!();
    let table = tabled::Table::new(rows)
        .with(tabled::settings::Style::rounded())
        .to_string();
    println!("{}", table);
}
