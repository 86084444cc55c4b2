//! Service error type
//!
//! Every adapter operation fails with a [`ServiceError`]. The variant decides
//! both the status code reported outward and whether the controller retries.

use gantry_client::ClientError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Remote call failed: {0}")]
    Remote(ClientError),

    #[error("Illegal state: {0}")]
    State(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Mapping error: {0}")]
    Mapping(String),

    #[error("Invalid configuration document: {0}")]
    Document(String),
}

impl ServiceError {
    /// Transient failures worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ServiceError::Remote(_) | ServiceError::State(_) | ServiceError::Timeout(_)
        )
    }
}

impl From<ClientError> for ServiceError {
    fn from(err: ClientError) -> Self {
        if err.is_forbidden() {
            ServiceError::Unauthorized(err.to_string())
        } else {
            ServiceError::Remote(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
