//! Gantry CLI
//!
//! Command-line interface for managing pipelines, builds, memberships and
//! credentials on a Jenkins server through the Gantry adapter.

mod commands;
mod config;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use gantry_manager::config::{Config as AdapterConfig, DEFAULT_ACCOUNT_NAME, DEFAULT_JENKINS_URL};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "gantry")]
#[command(about = "Gantry pipeline adapter CLI", long_about = None)]
struct Cli {
    /// Jenkins URL
    #[arg(long, env = "JENKINS_URL", default_value = DEFAULT_JENKINS_URL)]
    jenkins_url: String,

    /// Account used to authenticate against Jenkins
    #[arg(long, env = "JENKINS_ACCOUNT_NAME", default_value = DEFAULT_ACCOUNT_NAME)]
    account_name: String,

    /// API token of the account
    #[arg(long, env = "JENKINS_ACCOUNT_API_TOKEN", hide_env_values = true)]
    api_token: String,

    /// Attempts for pipeline creation and deletion
    #[arg(long, env = "GANTRY_MAX_ATTEMPTS", default_value = "5")]
    max_attempts: u32,

    /// Base delay between attempts, in milliseconds
    #[arg(long, env = "GANTRY_ATTEMPT_WAIT_MS", default_value = "250")]
    attempt_wait_ms: u64,

    /// Directory of job templates overriding the built-in ones
    #[arg(long, env = "GANTRY_TEMPLATES_DIR")]
    templates_dir: Option<PathBuf>,

    /// HTTP request timeout, in seconds
    #[arg(long, env = "GANTRY_HTTP_TIMEOUT_SECS", default_value = "30")]
    http_timeout_secs: u64,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gantry_manager=info,gantry_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut adapter = AdapterConfig::new(cli.jenkins_url, cli.account_name, cli.api_token);
    adapter.max_attempts = cli.max_attempts;
    adapter.attempt_wait = Duration::from_millis(cli.attempt_wait_ms);
    adapter.templates_dir = cli.templates_dir;
    adapter.http_timeout = Duration::from_secs(cli.http_timeout_secs);

    let config = Config {
        adapter,
        json: cli.json,
    };

    handle_command(cli.command, &config).await
}
