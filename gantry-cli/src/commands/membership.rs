//! Membership command handlers

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use gantry_core::{Membership, Role};
use gantry_manager::PipelineController;

use super::print_json;
use crate::config::Config;

/// Membership subcommands
#[derive(Subcommand)]
pub enum MembershipCommands {
    /// Grant a role to a group on a folder and its ancestors
    Add {
        /// Folder or pipeline path
        path: String,

        /// Group name
        #[arg(short, long)]
        group: String,

        /// Role (guest, contributor, manager)
        #[arg(short, long)]
        role: Role,
    },
    /// List the memberships recorded on a folder
    List {
        /// Folder or pipeline path
        path: String,
    },
}

/// Handle membership commands
pub async fn handle_membership_command(
    command: MembershipCommands,
    controller: &PipelineController,
    config: &Config,
) -> Result<()> {
    match command {
        MembershipCommands::Add { path, group, role } => {
            let membership = controller
                .add_membership(Membership::group(&path, &group, role))
                .await
                .with_context(|| format!("Failed to add {} to {}", group, path))?;

            if config.json {
                return print_json(&membership);
            }
            println!(
                "{}",
                format!("✓ {} is now {} of {}", group, role, path)
                    .green()
                    .bold()
            );
            Ok(())
        }
        MembershipCommands::List { path } => {
            let memberships = controller
                .get_memberships(&path)
                .await
                .with_context(|| format!("Failed to list memberships of {}", path))?;

            if config.json {
                return print_json(&memberships);
            }
            if memberships.is_empty() {
                println!("{}", "No memberships found.".yellow());
                return Ok(());
            }

            println!("{}", format!("Memberships of {}:", path).bold());
            for membership in &memberships {
                println!(
                    "  {} {} {}",
                    "▸".cyan(),
                    membership.member_name.as_deref().unwrap_or("?").bold(),
                    membership
                        .role
                        .map(|role| role.to_string())
                        .unwrap_or_default()
                        .dimmed()
                );
            }
            Ok(())
        }
    }
}
