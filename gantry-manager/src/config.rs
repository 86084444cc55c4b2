//! Adapter configuration
//!
//! Connection settings for the CI server plus the tunables of the retry
//! wrapper. Built once at start-up and never mutated afterwards.

use std::path::PathBuf;
use std::time::Duration;

use crate::retry::RetryPolicy;

pub const DEFAULT_JENKINS_URL: &str = "https://jenkins.kathra.org";
pub const DEFAULT_ACCOUNT_NAME: &str = "kathra-pipelinemanager";

/// Adapter configuration
#[derive(Clone)]
pub struct Config {
    /// CI server base URL (e.g., "https://jenkins.example.org")
    pub jenkins_url: String,

    /// Account used for basic authentication
    pub account_name: String,

    /// API token of `account_name`
    pub api_token: String,

    /// Total attempts for pipeline creation and deletion
    pub max_attempts: u32,

    /// Base delay of the exponential backoff between attempts
    pub attempt_wait: Duration,

    /// Directory overriding the compiled-in job templates
    pub templates_dir: Option<PathBuf>,

    /// Timeout applied to every HTTP request
    pub http_timeout: Duration,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(jenkins_url: String, account_name: String, api_token: String) -> Self {
        Self {
            jenkins_url,
            account_name,
            api_token,
            max_attempts: 5,
            attempt_wait: Duration::from_millis(250),
            templates_dir: None,
            http_timeout: Duration::from_secs(30),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - JENKINS_URL (optional, default: https://jenkins.kathra.org)
    /// - JENKINS_ACCOUNT_NAME (optional, default: kathra-pipelinemanager)
    /// - JENKINS_ACCOUNT_API_TOKEN (required)
    /// - GANTRY_MAX_ATTEMPTS (optional, default: 5)
    /// - GANTRY_ATTEMPT_WAIT_MS (optional, milliseconds, default: 250)
    /// - GANTRY_TEMPLATES_DIR (optional)
    /// - GANTRY_HTTP_TIMEOUT_SECS (optional, seconds, default: 30)
    pub fn from_env() -> anyhow::Result<Self> {
        let jenkins_url =
            std::env::var("JENKINS_URL").unwrap_or_else(|_| DEFAULT_JENKINS_URL.to_string());

        let account_name = std::env::var("JENKINS_ACCOUNT_NAME")
            .unwrap_or_else(|_| DEFAULT_ACCOUNT_NAME.to_string());

        let api_token = std::env::var("JENKINS_ACCOUNT_API_TOKEN").map_err(|_| {
            anyhow::anyhow!("JENKINS_ACCOUNT_API_TOKEN environment variable not set")
        })?;

        let mut config = Self::new(jenkins_url, account_name, api_token);

        if let Some(max_attempts) = std::env::var("GANTRY_MAX_ATTEMPTS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
        {
            config.max_attempts = max_attempts;
        }

        if let Some(wait) = std::env::var("GANTRY_ATTEMPT_WAIT_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            config.attempt_wait = Duration::from_millis(wait);
        }

        config.templates_dir = std::env::var("GANTRY_TEMPLATES_DIR")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        if let Some(timeout) = std::env::var("GANTRY_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            config.http_timeout = Duration::from_secs(timeout);
        }

        Ok(config)
    }

    /// Policy the controller applies to pipeline creation and deletion
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::exponential(self.max_attempts, self.attempt_wait)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.jenkins_url.is_empty() {
            anyhow::bail!("jenkins_url cannot be empty");
        }

        if !self.jenkins_url.starts_with("http://") && !self.jenkins_url.starts_with("https://") {
            anyhow::bail!("jenkins_url must start with http:// or https://");
        }

        if self.account_name.is_empty() {
            anyhow::bail!("account_name cannot be empty");
        }

        if self.api_token.is_empty() {
            anyhow::bail!("api_token cannot be empty");
        }

        if self.http_timeout.is_zero() {
            anyhow::bail!("http_timeout must be greater than 0");
        }

        if let Some(dir) = &self.templates_dir {
            if !dir.is_dir() {
                anyhow::bail!("templates_dir {} is not a directory", dir.display());
            }
        }

        Ok(())
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("jenkins_url", &self.jenkins_url)
            .field("account_name", &self.account_name)
            .field("api_token", &"<redacted>")
            .field("max_attempts", &self.max_attempts)
            .field("attempt_wait", &self.attempt_wait)
            .field("templates_dir", &self.templates_dir)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}
