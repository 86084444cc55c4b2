//! Folder command handlers

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use gantry_manager::PipelineController;

use super::print_json;
use crate::config::Config;

/// Folder subcommands
#[derive(Subcommand)]
pub enum FolderCommands {
    /// Create a folder chain; existing folders are left untouched
    Create {
        /// Folder path, e.g. team/libs
        path: String,
    },
}

/// Handle folder commands
pub async fn handle_folder_command(
    command: FolderCommands,
    controller: &PipelineController,
    config: &Config,
) -> Result<()> {
    match command {
        FolderCommands::Create { path } => {
            let folder = controller
                .create_folder(&path)
                .await
                .with_context(|| format!("Failed to create folder {}", path))?;

            if config.json {
                return print_json(&serde_json::json!({ "path": folder.path() }));
            }
            println!("{}", "✓ Folder ready!".green().bold());
            println!("  Path: {}", folder.path().cyan());
            Ok(())
        }
    }
}
