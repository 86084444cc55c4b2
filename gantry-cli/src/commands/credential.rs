//! Credential command handlers

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use gantry_core::Credential;
use gantry_manager::PipelineController;

use super::print_json;
use crate::config::Config;

/// Credential subcommands
#[derive(Subcommand)]
pub enum CredentialCommands {
    /// Register an SSH private key in a folder's credential store
    Add {
        /// Folder path
        path: String,

        /// Credential id
        #[arg(long)]
        id: String,

        /// SSH user name
        #[arg(short, long)]
        username: String,

        /// File holding the private key
        #[arg(short = 'k', long)]
        private_key_file: String,

        /// Free-form description
        #[arg(short, long)]
        description: Option<String>,
    },
}

/// Handle credential commands
pub async fn handle_credential_command(
    command: CredentialCommands,
    controller: &PipelineController,
    config: &Config,
) -> Result<()> {
    match command {
        CredentialCommands::Add {
            path,
            id,
            username,
            private_key_file,
            description,
        } => {
            let private_key = std::fs::read_to_string(&private_key_file)
                .with_context(|| format!("Failed to read private key file: {}", private_key_file))?;

            let credential = Credential {
                path: Some(path.clone()),
                credential_id: Some(id.clone()),
                username: Some(username),
                private_key: Some(private_key),
                description,
            };
            controller
                .add_credential(credential)
                .await
                .with_context(|| format!("Failed to add credential {} to {}", id, path))?;

            if config.json {
                return print_json(&serde_json::json!({ "path": path, "credentialId": id }));
            }
            println!(
                "{}",
                format!("✓ Credential {} added to {}", id, path).green().bold()
            );
            Ok(())
        }
    }
}
