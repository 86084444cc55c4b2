//! Build domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single execution of a pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Build {
    /// Path of the owning pipeline
    pub path: Option<String>,
    /// Remote-assigned, increasing per pipeline
    pub build_number: Option<String>,
    pub status: Option<BuildStatus>,
    /// Duration in milliseconds
    pub duration: Option<i64>,
    pub creation_date: Option<DateTime<Utc>>,
    pub logs: Option<String>,
    pub build_arguments: Option<Vec<BuildArgument>>,
}

impl Build {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    pub fn with_argument(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.build_arguments
            .get_or_insert_with(Vec::new)
            .push(BuildArgument {
                key: key.into(),
                value: value.into(),
            });
        self
    }
}

/// Key/value parameter passed to a build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildArgument {
    pub key: String,
    pub value: String,
}

/// Build execution status
///
/// Transitions only go forward: `Processing` to one of the terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildStatus {
    Processing,
    Success,
    Failed,
}

impl BuildStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, BuildStatus::Processing)
    }
}

impl std::fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildStatus::Processing => write!(f, "PROCESSING"),
            BuildStatus::Success => write!(f, "SUCCESS"),
            BuildStatus::Failed => write!(f, "FAILED"),
        }
    }
}
