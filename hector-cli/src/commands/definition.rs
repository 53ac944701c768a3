//! Definition command handlers

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;

use hector_client::HectorClient;
use hector_core::domain::{Definition, Status};

use crate::config::Config;

/// Definition subcommands
#[derive(Subcommand)]
pub enum DefinitionCommands {
    /// Execute a definition from a JSON file and wait for it to finish
    Execute {
        /// Path to the definition JSON file
        file: String,
    },
    /// Get definition details
    Get {
        /// Definition ID
        id: String,
    },
    /// Show the execution result of a definition
    Result {
        /// Definition ID
        id: String,
    },
}

pub async fn handle_definition_command(command: DefinitionCommands, config: &Config) -> Result<()> {
    let client = HectorClient::new(&config.orchestrator_url);

    match command {
        DefinitionCommands::Execute { file } => execute_definition(&client, &file).await,
        DefinitionCommands::Get { id } => get_definition(&client, &id).await,
        DefinitionCommands::Result { id } => show_result(&client, &id).await,
    }
}

async fn execute_definition(client: &HectorClient, file: &str) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read definition file: {}", file))?;
    let definition: Definition =
        serde_json::from_str(&content).context("Definition file is not valid JSON")?;

    println!("Executing definition {}...", definition.name.bold());
    let response = client.execute_definition(&definition).await?;

    println!("{}", "✓ Execution finished!".green().bold());
    println!("  ID: {}", response.id.cyan());

    show_result(client, &response.id).await
}

async fn get_definition(client: &HectorClient, id: &str) -> Result<()> {
    let definition = client.get_definition(id).await?;
    println!("{}", serde_json::to_string_pretty(&definition)?);
    Ok(())
}

async fn show_result(client: &HectorClient, id: &str) -> Result<()> {
    let result = client.get_result_definition(id).await?;

    for job in &result.result_jobs {
        let status = match job.status {
            Status::Done => "DONE".green().bold(),
            Status::Error => "ERROR".red().bold(),
            Status::Cancelled => "CANCELLED".yellow().bold(),
            Status::Waiting => "WAITING".dimmed(),
        };
        println!("  {} {}", status, job.name);
        if job.status == Status::Error && !job.logs.is_empty() {
            println!("    {}", job.logs.trim_end().dimmed());
        }
    }
    Ok(())
}
