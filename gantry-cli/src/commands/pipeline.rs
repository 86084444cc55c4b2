//! Pipeline command handlers
//!
//! Creation and deletion of the jobs backing pipelines.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use gantry_core::{Pipeline, PipelineTemplate};
use gantry_manager::PipelineController;

use super::print_json;
use crate::config::Config;

/// Pipeline subcommands
#[derive(Subcommand)]
pub enum PipelineCommands {
    /// Create a pipeline from a template
    Create {
        /// Pipeline path, e.g. team/libs/my-lib
        path: String,

        /// Template (java-library, java-service, python-library,
        /// python-service, docker-service, helm-chart)
        #[arg(short, long)]
        template: PipelineTemplate,

        /// SSH URL of the source repository
        #[arg(short, long)]
        repository: String,

        /// Id of the credential used to pull the repository
        #[arg(short, long)]
        credential: Option<String>,
    },
    /// Delete a pipeline
    Delete {
        /// Pipeline path
        path: String,
    },
}

/// Handle pipeline commands
///
/// # Arguments
/// * `command` - The pipeline command to execute
/// * `controller` - Connected adapter
/// * `config` - The CLI configuration
pub async fn handle_pipeline_command(
    command: PipelineCommands,
    controller: &PipelineController,
    config: &Config,
) -> Result<()> {
    match command {
        PipelineCommands::Create {
            path,
            template,
            repository,
            credential,
        } => {
            let mut pipeline = Pipeline::new(&path)
                .with_template(template)
                .with_repository(repository);
            if let Some(credential) = credential {
                pipeline = pipeline.with_credential(credential);
            }
            create_pipeline(controller, pipeline, config).await
        }
        PipelineCommands::Delete { path } => delete_pipeline(controller, &path, config).await,
    }
}

async fn create_pipeline(
    controller: &PipelineController,
    pipeline: Pipeline,
    config: &Config,
) -> Result<()> {
    let path = pipeline.path.clone().unwrap_or_default();
    let created = controller
        .create_pipeline(pipeline)
        .await
        .with_context(|| format!("Failed to create pipeline {}", path))?;

    if config.json {
        return print_json(&created);
    }

    println!("{}", "✓ Pipeline created successfully!".green().bold());
    println!("  Path:        {}", path.bold());
    println!(
        "  Provider ID: {}",
        created.provider_id.as_deref().unwrap_or("-").cyan()
    );
    if let Some(template) = created.template {
        println!("  Template:    {}", template.template_name());
    }
    if let Some(status) = created.status {
        println!("  Status:      {}", format!("{:?}", status).yellow());
    }

    Ok(())
}

async fn delete_pipeline(controller: &PipelineController, path: &str, config: &Config) -> Result<()> {
    controller
        .delete_pipeline(path)
        .await
        .with_context(|| format!("Failed to delete pipeline {}", path))?;

    if config.json {
        return print_json(&serde_json::json!({ "path": path, "deleted": true }));
    }

    println!(
        "{}",
        format!("✓ Pipeline {} deleted successfully!", path)
            .green()
            .bold()
    );

    Ok(())
}
