//! Component command handlers

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;

use hector_client::HectorClient;
use hector_core::domain::Component;

use crate::config::Config;

/// Component subcommands
#[derive(Subcommand)]
pub enum ComponentCommands {
    /// Submit a component from a JSON file
    Submit {
        /// Path to the component JSON file
        file: String,
    },
    /// Get component details
    Get {
        /// Component ID
        id: String,
    },
}

pub async fn handle_component_command(command: ComponentCommands, config: &Config) -> Result<()> {
    let client = HectorClient::new(&config.orchestrator_url);

    match command {
        ComponentCommands::Submit { file } => submit_component(&client, &file).await,
        ComponentCommands::Get { id } => get_component(&client, &id).await,
    }
}

async fn submit_component(client: &HectorClient, file: &str) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read component file: {}", file))?;
    let component: Component =
        serde_json::from_str(&content).context("Component file is not valid JSON")?;

    client.submit_component(&component).await?;

    println!("{}", "✓ Component submitted successfully!".green().bold());
    println!("  ID:   {}", component.id.cyan());
    println!("  Name: {}", component.name.bold());
    Ok(())
}

async fn get_component(client: &HectorClient, id: &str) -> Result<()> {
    let component = client.get_component(id).await?;
    println!("{}", serde_json::to_string_pretty(&component)?);
    Ok(())
}
