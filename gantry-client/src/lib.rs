//! Gantry Jenkins Client
//!
//! A thin, type-safe HTTP client for the remote CI server (Jenkins and its
//! folder plugin).
//!
//! The [`CiServer`] trait is the call surface the adapter depends on; the
//! [`JenkinsClient`] implements it over basic-authenticated HTTP. Absence of
//! a folder, job or build is reported as `Ok(None)`, never as an error.
//!
//! # Example
//!
//! ```no_run
//! use gantry_client::{CiServer, FolderRef, JenkinsClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = JenkinsClient::new("https://jenkins.example.org", "bot", "api-token");
//!
//!     if client.get_folder(&FolderRef::root(), "TEAM").await?.is_none() {
//!         client.create_folder(&FolderRef::root(), "TEAM").await?;
//!     }
//!     Ok(())
//! }
//! ```

mod builds;
mod credentials;
pub mod error;
mod folders;
mod gateway;
mod jobs;
pub mod model;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use gateway::CiServer;
#[cfg(feature = "mocks")]
pub use gateway::MockCiServer;
pub use model::{
    BuildDetails, BuildRef, FolderRef, JobDetails, JobRef, QueueReference, SshCredential,
};

use reqwest::{Client, RequestBuilder, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;

/// CSRF protection token issued by the server
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Crumb {
    crumb: String,
    crumb_request_field: String,
}

/// HTTP client for the Jenkins remote API
///
/// Every request is authenticated with the account name and API token.
/// Mutating requests carry the CSRF crumb when the server issues one; the
/// crumb is fetched once and reused for the lifetime of the client.
#[derive(Debug, Clone)]
pub struct JenkinsClient {
    /// Base URL of the server (e.g., "https://jenkins.example.org")
    base_url: String,
    username: String,
    api_token: String,
    /// HTTP client instance
    client: Client,
    crumb: std::sync::Arc<OnceCell<Option<Crumb>>>,
}

impl JenkinsClient {
    /// Create a new Jenkins client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the server
    /// * `username` - Account name used for basic authentication
    /// * `api_token` - API token of that account
    ///
    /// # Example
    /// ```
    /// use gantry_client::JenkinsClient;
    ///
    /// let client = JenkinsClient::new("http://localhost:8080", "bot", "token");
    /// ```
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Self {
        Self::with_client(base_url, username, api_token, Client::new())
    }

    /// Create a new Jenkins client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Example
    /// ```
    /// use gantry_client::JenkinsClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(30))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = JenkinsClient::with_client("http://localhost:8080", "bot", "token", http_client);
    /// ```
    pub fn with_client(
        base_url: impl Into<String>,
        username: impl Into<String>,
        api_token: impl Into<String>,
        client: Client,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.into(),
            api_token: api_token.into(),
            client,
            crumb: std::sync::Arc::new(OnceCell::new()),
        }
    }

    /// Get the base URL of the server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // =============================================================================
    // Request Builders
    // =============================================================================

    /// Build the URL of an item: each path segment becomes `job/<segment>`,
    /// followed by the raw `suffix` segments
    fn item_url<S: AsRef<str>>(&self, segments: &[S], suffix: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ClientError::InvalidRequest(format!("Invalid base URL: {}", e)))?;
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                ClientError::InvalidRequest(format!("Base URL cannot hold a path: {}", self.base_url))
            })?;
            path.pop_if_empty();
            for segment in segments {
                path.push("job").push(segment.as_ref());
            }
            path.extend(suffix);
        }
        Ok(url)
    }

    fn get(&self, url: Url) -> RequestBuilder {
        self.client
            .get(url)
            .basic_auth(&self.username, Some(&self.api_token))
    }

    /// POST request carrying credentials and, when issued, the CSRF crumb
    async fn post(&self, url: Url) -> Result<RequestBuilder> {
        let mut request = self
            .client
            .post(url)
            .basic_auth(&self.username, Some(&self.api_token));

        if let Some(crumb) = self.crumb().await? {
            request = request.header(crumb.crumb_request_field.as_str(), crumb.crumb.as_str());
        }

        Ok(request)
    }

    async fn crumb(&self) -> Result<Option<&Crumb>> {
        let crumb = self
            .crumb
            .get_or_try_init(|| async {
                let url = self.item_url::<&str>(&[], &["crumbIssuer", "api", "json"])?;
                let response = self.get(url).send().await?;
                let crumb: Option<Crumb> = self.handle_optional_response(response).await?;
                if crumb.is_none() {
                    tracing::debug!("CI server issues no CSRF crumb");
                }
                Ok::<_, ClientError>(crumb)
            })
            .await?;

        Ok(crumb.as_ref())
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// This method checks the status code and returns an appropriate error if
    /// the request failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let response = Self::check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Like [`Self::handle_response`], but a 404 yields `Ok(None)`
    async fn handle_optional_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<Option<T>> {
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        self.handle_response(response).await.map(Some)
    }

    /// Handle a response whose body is plain text (XML documents, console output)
    async fn handle_text_response(&self, response: reqwest::Response) -> Result<String> {
        let response = Self::check_status(response).await?;
        Ok(response.text().await?)
    }

    /// Handle an API response that returns no content
    ///
    /// This method checks the status code and returns an error if the request failed.
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        Self::check_status(response).await.map(|_| ())
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();

        if status.is_client_error() || status.is_server_error() {
            let error_text = response
                .text()
                .await
                .ok()
                .filter(|text| !text.trim().is_empty())
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(response)
    }
}
