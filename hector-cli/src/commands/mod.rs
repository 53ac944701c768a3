//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod component;
mod definition;
mod specification;

pub use component::ComponentCommands;
pub use definition::DefinitionCommands;
pub use specification::SpecificationCommands;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Component management
    Component {
        #[command(subcommand)]
        command: ComponentCommands,
    },
    /// Specification management
    Specification {
        #[command(subcommand)]
        command: SpecificationCommands,
    },
    /// Definition execution and results
    Definition {
        #[command(subcommand)]
        command: DefinitionCommands,
    },
}

/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Component { command } => {
            component::handle_component_command(command, config).await
        }
        Commands::Specification { command } => {
            specification::handle_specification_command(command, config).await
        }
        Commands::Definition { command } => {
            definition::handle_definition_command(command, config).await
        }
    }
}
