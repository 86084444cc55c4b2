//! Controller
//!
//! Outward entry point of the adapter. Pipeline creation and deletion are
//! retried with exponential backoff; every failure leaves as an [`ApiError`]
//! carrying the status code the outward layer reports.

use std::sync::Arc;

use gantry_client::{FolderRef, JenkinsClient};
use gantry_core::{Build, Credential, Membership, Pipeline};
use serde::Serialize;

use crate::config::Config;
use crate::error::ServiceError;
use crate::retry::{RetryPolicy, retry};
use crate::service::{KeyedLocks, PipelineService};
use crate::templates::TemplateStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    BadRequest,
    Unauthorized,
    NotFound,
    Conflict,
    InternalError,
}

impl ErrorCode {
    /// HTTP status code
    pub fn status(&self) -> u16 {
        match self {
            ErrorCode::BadRequest => 400,
            ErrorCode::Unauthorized => 401,
            ErrorCode::NotFound => 404,
            ErrorCode::Conflict => 409,
            ErrorCode::InternalError => 500,
        }
    }
}

impl From<&ServiceError> for ErrorCode {
    fn from(err: &ServiceError) -> Self {
        match err {
            ServiceError::InvalidArgument(_) => ErrorCode::BadRequest,
            ServiceError::Unauthorized(_) => ErrorCode::Unauthorized,
            ServiceError::NotFound(_) => ErrorCode::NotFound,
            ServiceError::Conflict(_) => ErrorCode::Conflict,
            _ => ErrorCode::InternalError,
        }
    }
}

/// API error type
#[derive(Debug, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub status: u16,
    pub message: String,
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let code = ErrorCode::from(&err);
        if code == ErrorCode::InternalError {
            tracing::error!("Internal error: {}", err);
        }

        ApiError {
            code,
            status: code.status(),
            message: err.to_string(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

pub struct PipelineController {
    service: PipelineService,
    policy: RetryPolicy,
}

impl PipelineController {
    pub fn new(service: PipelineService, policy: RetryPolicy) -> Self {
        Self { service, policy }
    }

    /// Wire the controller to the CI server described by `config`
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;
        let client = JenkinsClient::with_client(
            config.jenkins_url.as_str(),
            config.account_name.as_str(),
            config.api_token.as_str(),
            http,
        );

        let templates = match &config.templates_dir {
            Some(dir) => TemplateStore::from_dir(dir)?,
            None => TemplateStore::builtin(),
        };

        tracing::info!(
            "Adapter targeting {} as {}",
            client.base_url(),
            config.account_name
        );

        let service = PipelineService::new(
            Arc::new(client),
            Arc::new(templates),
            Arc::new(KeyedLocks::new()),
        );
        Ok(Self::new(service, config.retry_policy()))
    }

    pub async fn create_pipeline(&self, pipeline: Pipeline) -> ApiResult<Pipeline> {
        let created = retry(
            &self.policy,
            "create_pipeline",
            ServiceError::is_retryable,
            || self.service.create_pipeline(pipeline.clone()),
        )
        .await?;
        Ok(created)
    }

    pub async fn delete_pipeline(&self, path: &str) -> ApiResult<()> {
        retry(
            &self.policy,
            "delete_pipeline",
            ServiceError::is_retryable,
            || self.service.delete_pipeline(path),
        )
        .await?;
        Ok(())
    }

    pub async fn create_build(&self, build: Build) -> ApiResult<Build> {
        Ok(self.service.create_build(build).await?)
    }

    pub async fn get_build(&self, path: &str, build_number: &str) -> ApiResult<Build> {
        Ok(self.service.get_build(path, build_number).await?)
    }

    pub async fn get_builds(
        &self,
        path: &str,
        branch: Option<&str>,
        max_result: Option<usize>,
    ) -> ApiResult<Vec<Build>> {
        Ok(self.service.get_builds(path, branch, max_result).await?)
    }

    pub async fn add_membership(&self, membership: Membership) -> ApiResult<Membership> {
        Ok(self.service.add_membership(membership).await?)
    }

    pub async fn get_memberships(&self, path: &str) -> ApiResult<Vec<Membership>> {
        Ok(self.service.get_memberships(path).await?)
    }

    pub async fn add_credential(&self, credential: Credential) -> ApiResult<Credential> {
        Ok(self.service.add_credential(credential).await?)
    }

    pub async fn create_folder(&self, path: &str) -> ApiResult<FolderRef> {
        Ok(self.service.create_folder(path).await?)
    }
}
