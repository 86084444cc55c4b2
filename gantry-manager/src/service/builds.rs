//! Build detection and mapping
//!
//! Triggering a build only yields a queue reference. The detector recovers
//! the build number by watching the job's last build until it changes.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use gantry_client::{BuildDetails, BuildRef, CiServer, JobRef};
use gantry_core::{Build, BuildArgument, BuildStatus};

use crate::error::{Result, ServiceError};

pub const POLL_INTERVAL: Duration = Duration::from_millis(500);
pub const MAX_POLLS: u32 = 20;

pub struct BuildDetector {
    server: Arc<dyn CiServer>,
    poll_interval: Duration,
    max_polls: u32,
}

impl BuildDetector {
    pub fn new(server: Arc<dyn CiServer>) -> Self {
        Self {
            server,
            poll_interval: POLL_INTERVAL,
            max_polls: MAX_POLLS,
        }
    }

    /// Trigger a build of `job` and return the build it started
    ///
    /// # Arguments
    /// * `job` - Job to build
    /// * `params` - Build parameters, `None` for an unparameterized build
    ///
    /// # Returns
    /// The first last-build observed that differs from the one seen before
    /// triggering, or `ServiceError::Timeout` once all polls are spent.
    pub async fn trigger(
        &self,
        job: &JobRef,
        params: Option<HashMap<String, String>>,
    ) -> Result<BuildRef> {
        let baseline = self.server.get_job_details(job).await?.last_build;
        let queued = self.server.trigger_build(job, params).await?;
        tracing::debug!("Build of {} queued at {}", job.path, queued.location);

        self.await_new_build(job, baseline.as_ref()).await
    }

    /// Poll `job` until its last build differs from `baseline`
    ///
    /// Without a baseline the first build observed is accepted.
    pub async fn await_new_build(
        &self,
        job: &JobRef,
        baseline: Option<&BuildRef>,
    ) -> Result<BuildRef> {
        for poll in 0..self.max_polls {
            if poll > 0 {
                tokio::time::sleep(self.poll_interval).await;
            }

            let details = self.server.get_job_details(job).await?;
            if let Some(last) = details.last_build {
                if baseline.is_none_or(|known| known.number != last.number) {
                    tracing::info!("Detected build #{} of {}", last.number, job.path);
                    return Ok(last);
                }
            }
        }

        Err(ServiceError::Timeout(format!(
            "Unable to get current build for pipeline {}",
            job.path
        )))
    }
}

/// Neutral status of a remote result code
pub fn map_status(result: Option<&str>) -> Result<BuildStatus> {
    match result {
        None | Some("BUILDING") => Ok(BuildStatus::Processing),
        Some("SUCCESS") => Ok(BuildStatus::Success),
        Some("FAILURE" | "UNSTABLE" | "ABORTED" | "CANCELLED" | "NOT_BUILT") => {
            Ok(BuildStatus::Failed)
        }
        Some(other) => Err(ServiceError::Mapping(format!(
            "Unknown build result '{}'",
            other
        ))),
    }
}

/// Fill `build` from build `number` and its remote details
///
/// Without details the build is reported as processing with empty logs.
/// Arguments already set on `build` are kept, otherwise they are taken from
/// the remote build parameters.
pub fn to_build(mut build: Build, number: u32, details: Option<&BuildDetails>) -> Result<Build> {
    build.build_number = Some(number.to_string());

    match details {
        Some(details) => {
            build.status = Some(map_status(details.result.as_deref())?);
            build.logs = Some(details.console_output.clone().unwrap_or_default());
            build.duration = Some(details.duration);
            build.creation_date = DateTime::from_timestamp_millis(details.timestamp);
            if build.build_arguments.is_none() && !details.parameters.is_empty() {
                let mut arguments: Vec<BuildArgument> = details
                    .parameters
                    .iter()
                    .map(|(key, value)| BuildArgument {
                        key: key.clone(),
                        value: value.clone(),
                    })
                    .collect();
                arguments.sort_by(|a, b| a.key.cmp(&b.key));
                build.build_arguments = Some(arguments);
            }
        }
        None => {
            build.status = Some(BuildStatus::Processing);
            build.logs = Some(String::new());
        }
    }

    Ok(build)
}
