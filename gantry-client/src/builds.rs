//! Build-related API endpoints

use serde::Deserialize;
use std::collections::HashMap;

use crate::JenkinsClient;
use crate::error::Result;
use crate::model::{BuildDetails, BuildRef, JobDetails, JobRef, QueueReference};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobInfo {
    name: String,
    #[serde(default)]
    url: String,
    last_build: Option<BuildInfo>,
    #[serde(default)]
    builds: Vec<BuildInfo>,
}

#[derive(Debug, Deserialize)]
struct BuildInfo {
    number: u32,
    #[serde(default)]
    url: String,
}

impl From<BuildInfo> for BuildRef {
    fn from(info: BuildInfo) -> Self {
        Self {
            number: info.number,
            url: info.url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct BuildRecord {
    number: u32,
    result: Option<String>,
    #[serde(default)]
    building: bool,
    #[serde(default)]
    duration: i64,
    #[serde(default)]
    timestamp: i64,
    #[serde(default)]
    actions: Vec<BuildAction>,
}

/// Build actions are heterogeneous; only parameter actions carry `parameters`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BuildAction {
    parameters: Vec<ParameterValue>,
}

#[derive(Debug, Deserialize)]
struct ParameterValue {
    name: String,
    #[serde(default)]
    value: serde_json::Value,
}

impl BuildRecord {
    fn parameters(&self) -> HashMap<String, String> {
        self.actions
            .iter()
            .flat_map(|action| action.parameters.iter())
            .map(|param| {
                let value = match &param.value {
                    serde_json::Value::String(s) => s.clone(),
                    serde_json::Value::Null => String::new(),
                    other => other.to_string(),
                };
                (param.name.clone(), value)
            })
            .collect()
    }
}

impl JenkinsClient {
    /// Queue a build of `job`
    ///
    /// Parameterized jobs go through `buildWithParameters`. The server answers
    /// with the queue item location only.
    pub(crate) async fn post_build(
        &self,
        job: &JobRef,
        params: Option<HashMap<String, String>>,
    ) -> Result<QueueReference> {
        let segments = job.segments();
        let response = match params {
            Some(params) => {
                let url = self.item_url(&segments, &["buildWithParameters"])?;
                self.post(url).await?.form(&params).send().await?
            }
            None => {
                let url = self.item_url(&segments, &["build"])?;
                self.post(url).await?.send().await?
            }
        };

        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();

        self.handle_empty_response(response).await?;
        tracing::debug!("Queued build of {} at {}", job.path, location);

        Ok(QueueReference { location })
    }

    pub(crate) async fn fetch_job_details(&self, job: &JobRef) -> Result<JobDetails> {
        let url = self.item_url(&job.segments(), &["api", "json"])?;
        let response = self
            .get(url)
            .query(&[("tree", "name,url,lastBuild[number,url],builds[number,url]")])
            .send()
            .await?;

        let info: JobInfo = self.handle_response(response).await?;

        Ok(JobDetails {
            name: info.name,
            url: info.url,
            last_build: info.last_build.map(Into::into),
            builds: info.builds.into_iter().map(Into::into).collect(),
        })
    }

    /// Get build `number` of `job` together with its console output
    pub(crate) async fn fetch_build_details(
        &self,
        job: &JobRef,
        number: u32,
    ) -> Result<Option<BuildDetails>> {
        let segments = job.segments();
        let number_segment = number.to_string();

        let url = self.item_url(&segments, &[number_segment.as_str(), "api", "json"])?;
        let response = self.get(url).send().await?;
        let Some(record) = self.handle_optional_response::<BuildRecord>(response).await? else {
            return Ok(None);
        };

        let url = self.item_url(&segments, &[number_segment.as_str(), "consoleText"])?;
        let response = self.get(url).send().await?;
        let console_output = if response.status() == reqwest::StatusCode::NOT_FOUND {
            None
        } else {
            Some(self.handle_text_response(response).await?)
        };

        Ok(Some(BuildDetails {
            number: record.number,
            parameters: record.parameters(),
            result: record.result,
            building: record.building,
            duration: record.duration,
            timestamp: record.timestamp,
            console_output,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_record_parameters() {
        let record: BuildRecord = serde_json::from_str(
            r#"{
                "number": 7,
                "result": "SUCCESS",
                "building": false,
                "duration": 1500,
                "timestamp": 1550000000000,
                "actions": [
                    {"_class": "hudson.model.CauseAction"},
                    {"_class": "hudson.model.ParametersAction", "parameters": [
                        {"name": "GIT_BRANCH", "value": "dev"},
                        {"name": "DEPLOY", "value": true}
                    ]},
                    {}
                ]
            }"#,
        )
        .unwrap();

        let params = record.parameters();
        assert_eq!(params.get("GIT_BRANCH").map(String::as_str), Some("dev"));
        assert_eq!(params.get("DEPLOY").map(String::as_str), Some("true"));
        assert_eq!(record.result.as_deref(), Some("SUCCESS"));
    }

    #[test]
    fn test_job_info_without_builds() {
        let info: JobInfo =
            serde_json::from_str(r#"{"name": "art", "url": "http://ci/job/art/", "lastBuild": null}"#)
                .unwrap();
        assert!(info.last_build.is_none());
        assert!(info.builds.is_empty());
    }

    #[test]
    fn test_running_build_has_no_result() {
        let record: BuildRecord =
            serde_json::from_str(r#"{"number": 3, "result": null, "building": true}"#).unwrap();
        assert!(record.result.is_none());
        assert!(record.building);
        assert!(record.parameters().is_empty());
    }
}
