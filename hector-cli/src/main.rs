//! Hector CLI
//!
//! Command-line interface for submitting artifacts to a Hector orchestrator
//! and launching executions from JSON files.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{handle_command, Commands};
use config::Config;

#[derive(Parser)]
#[command(name = "hector")]
#[command(about = "Hector workflow orchestration CLI", long_about = None)]
struct Cli {
    /// Orchestrator URL
    #[arg(
        long,
        env = "HECTOR_ORCHESTRATOR_URL",
        default_value = "http://localhost:8080"
    )]
    orchestrator_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        orchestrator_url: cli.orchestrator_url,
    };

    handle_command(cli.command, &config).await
}
