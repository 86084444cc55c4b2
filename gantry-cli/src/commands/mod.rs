//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod build;
mod credential;
mod folder;
mod membership;
mod pipeline;

pub use build::BuildCommands;
pub use credential::CredentialCommands;
pub use folder::FolderCommands;
pub use membership::MembershipCommands;
pub use pipeline::PipelineCommands;

use anyhow::{Context, Result};
use clap::Subcommand;
use gantry_manager::PipelineController;
use serde::Serialize;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Pipeline management
    Pipeline {
        #[command(subcommand)]
        command: PipelineCommands,
    },
    /// Build management
    Build {
        #[command(subcommand)]
        command: BuildCommands,
    },
    /// Group memberships on folders
    Membership {
        #[command(subcommand)]
        command: MembershipCommands,
    },
    /// Folder credentials
    Credential {
        #[command(subcommand)]
        command: CredentialCommands,
    },
    /// Folder management
    Folder {
        #[command(subcommand)]
        command: FolderCommands,
    },
}

/// Handle a CLI command
///
/// Connects the adapter and routes the command to its handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    let controller = PipelineController::from_config(&config.adapter)
        .context("Failed to initialize the pipeline adapter")?;

    match command {
        Commands::Pipeline { command } => {
            pipeline::handle_pipeline_command(command, &controller, config).await
        }
        Commands::Build { command } => build::handle_build_command(command, &controller, config).await,
        Commands::Membership { command } => {
            membership::handle_membership_command(command, &controller, config).await
        }
        Commands::Credential { command } => {
            credential::handle_credential_command(command, &controller, config).await
        }
        Commands::Folder { command } => {
            folder::handle_folder_command(command, &controller, config).await
        }
    }
}

/// Print `value` as pretty JSON
fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to encode output")?
    );
    Ok(())
}
