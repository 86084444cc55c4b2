//! Build command handlers
//!
//! Starting builds and inspecting build history.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use gantry_core::{Build, BuildStatus};
use gantry_manager::PipelineController;

use super::print_json;
use crate::config::Config;

/// Build subcommands
#[derive(Subcommand)]
pub enum BuildCommands {
    /// Start a build and wait until it is assigned a number
    Create {
        /// Pipeline path
        path: String,

        /// Build arguments as key=value pairs (e.g., GIT_BRANCH=dev)
        #[arg(short, long, value_parser = parse_key_val)]
        arg: Vec<(String, String)>,
    },
    /// Show one build
    Get {
        /// Pipeline path
        path: String,

        /// Build number
        number: String,
    },
    /// List recent builds
    List {
        /// Pipeline path
        path: String,

        /// Only builds of this branch
        #[arg(short, long)]
        branch: Option<String>,

        /// Maximum number of builds
        #[arg(short, long)]
        max: Option<usize>,
    },
}

/// Parse a single key=value pair
fn parse_key_val(s: &str) -> Result<(String, String)> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("invalid KEY=value: no `=` found in `{}`", s))?;
    Ok((key.to_string(), value.to_string()))
}

/// Handle build commands
pub async fn handle_build_command(
    command: BuildCommands,
    controller: &PipelineController,
    config: &Config,
) -> Result<()> {
    match command {
        BuildCommands::Create { path, arg } => {
            let build = arg
                .into_iter()
                .fold(Build::new(&path), |build, (key, value)| build.with_argument(key, value));
            let build = controller
                .create_build(build)
                .await
                .with_context(|| format!("Failed to start build of {}", path))?;

            if config.json {
                return print_json(&build);
            }
            println!("{}", "✓ Build started!".green().bold());
            print_build(&build);
            Ok(())
        }
        BuildCommands::Get { path, number } => {
            let build = controller
                .get_build(&path, &number)
                .await
                .with_context(|| format!("Failed to get build {} of {}", number, path))?;

            if config.json {
                return print_json(&build);
            }
            print_build(&build);
            if let Some(logs) = build.logs.as_deref().filter(|logs| !logs.is_empty()) {
                println!("\n{}", "Logs:".bold());
                println!("{}", "─".repeat(80).dimmed());
                println!("{}", logs);
            }
            Ok(())
        }
        BuildCommands::List { path, branch, max } => {
            let builds = controller
                .get_builds(&path, branch.as_deref(), max)
                .await
                .with_context(|| format!("Failed to list builds of {}", path))?;

            if config.json {
                return print_json(&builds);
            }
            if builds.is_empty() {
                println!("{}", "No builds found.".yellow());
            } else {
                println!("{}", format!("Found {} build(s):", builds.len()).bold());
                println!();
                for build in &builds {
                    print_build(build);
                    println!();
                }
            }
            Ok(())
        }
    }
}

fn colored_status(status: Option<BuildStatus>) -> ColoredString {
    match status {
        Some(BuildStatus::Success) => "SUCCESS".green(),
        Some(BuildStatus::Failed) => "FAILED".red(),
        Some(BuildStatus::Processing) => "PROCESSING".yellow(),
        None => "UNKNOWN".dimmed(),
    }
}

fn print_build(build: &Build) {
    println!(
        "  {} #{}",
        "▸".cyan(),
        build.build_number.as_deref().unwrap_or("?").bold()
    );
    println!("    Status:   {}", colored_status(build.status));
    if let Some(date) = build.creation_date {
        println!(
            "    Started:  {}",
            date.format("%Y-%m-%d %H:%M:%S").to_string().dimmed()
        );
    }
    if let Some(duration) = build.duration {
        println!("    Duration: {}", format!("{} ms", duration).dimmed());
    }
    for argument in build.build_arguments.iter().flatten() {
        println!("    {} = {}", argument.key.cyan(), argument.value);
    }
}
