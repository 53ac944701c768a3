//! Specification command handlers

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;

use hector_client::HectorClient;
use hector_core::domain::Specification;

use crate::config::Config;

/// Specification subcommands
#[derive(Subcommand)]
pub enum SpecificationCommands {
    /// Submit a specification from a JSON file
    Submit {
        /// Path to the specification JSON file
        file: String,
    },
    /// Get specification details
    Get {
        /// Specification ID
        id: String,
    },
    /// Show the layered execution plan of a specification
    Plan {
        /// Specification ID
        id: String,
    },
}

pub async fn handle_specification_command(
    command: SpecificationCommands,
    config: &Config,
) -> Result<()> {
    let client = HectorClient::new(&config.orchestrator_url);

    match command {
        SpecificationCommands::Submit { file } => submit_specification(&client, &file).await,
        SpecificationCommands::Get { id } => get_specification(&client, &id).await,
        SpecificationCommands::Plan { id } => show_planning(&client, &id).await,
    }
}

async fn submit_specification(client: &HectorClient, file: &str) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read specification file: {}", file))?;
    let specification: Specification =
        serde_json::from_str(&content).context("Specification file is not valid JSON")?;

    client.submit_specification(&specification).await?;

    println!("{}", "✓ Specification submitted successfully!".green().bold());
    println!("  ID:    {}", specification.id.cyan());
    println!("  Name:  {}", specification.name.bold());
    println!(
        "  Tasks: {}",
        specification
            .tasks()
            .iter()
            .map(|task| task.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
            .dimmed()
    );
    Ok(())
}

async fn get_specification(client: &HectorClient, id: &str) -> Result<()> {
    let specification = client.get_specification(id).await?;
    println!("{}", serde_json::to_string_pretty(&specification)?);
    Ok(())
}

async fn show_planning(client: &HectorClient, id: &str) -> Result<()> {
    let planning = client.get_planning(id).await?;
    for (index, layer) in planning.layers.iter().enumerate() {
        println!("{} {}", format!("Layer {}:", index).bold(), layer.join(", "));
    }
    Ok(())
}
