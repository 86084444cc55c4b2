//! Pipeline domain types

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::ParseEnumError;

/// Provider tag set on every pipeline created through the adapter
pub const PROVIDER_JENKINS: &str = "jenkins";

/// Pipeline definition
///
/// A pipeline lives at a slash-delimited `path`. The last segment names the
/// job, the preceding segments name the folder chain it is created in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    pub path: Option<String>,
    pub template: Option<PipelineTemplate>,
    pub source_repository: Option<SourceRepository>,
    pub credential_id: Option<String>,
    /// Remote path assigned once the job exists
    pub provider_id: Option<String>,
    pub status: Option<ResourceStatus>,
    pub provider: Option<String>,
}

impl Pipeline {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    pub fn with_template(mut self, template: PipelineTemplate) -> Self {
        self.template = Some(template);
        self
    }

    pub fn with_repository(mut self, ssh_url: impl Into<String>) -> Self {
        self.source_repository = Some(SourceRepository {
            ssh_url: Some(ssh_url.into()),
        });
        self
    }

    pub fn with_credential(mut self, credential_id: impl Into<String>) -> Self {
        self.credential_id = Some(credential_id.into());
        self
    }

    /// SSH URL of the source repository, if any
    pub fn repository_url(&self) -> Option<&str> {
        self.source_repository
            .as_ref()
            .and_then(|repo| repo.ssh_url.as_deref())
    }
}

/// Source repository a pipeline builds from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRepository {
    pub ssh_url: Option<String>,
}

/// Lifecycle status shared by provisioned resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceStatus {
    Pending,
    Ready,
    Error,
    Deleted,
}

/// Kind of pipeline to provision
///
/// Each variant selects one job-definition template on the CI server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineTemplate {
    JavaLibrary,
    JavaService,
    PythonLibrary,
    PythonService,
    DockerService,
    HelmChart,
}

impl PipelineTemplate {
    pub const ALL: [PipelineTemplate; 6] = [
        PipelineTemplate::JavaLibrary,
        PipelineTemplate::JavaService,
        PipelineTemplate::PythonLibrary,
        PipelineTemplate::PythonService,
        PipelineTemplate::DockerService,
        PipelineTemplate::HelmChart,
    ];

    /// Name of the job template file backing this pipeline kind
    pub fn template_name(&self) -> &'static str {
        match self {
            PipelineTemplate::JavaLibrary => "JavaLibrary",
            PipelineTemplate::JavaService => "JavaService",
            PipelineTemplate::PythonLibrary => "PythonLibrary",
            PipelineTemplate::PythonService => "PythonService",
            PipelineTemplate::DockerService => "DockerService",
            PipelineTemplate::HelmChart => "HelmChart",
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            PipelineTemplate::JavaLibrary => "JAVA_LIBRARY",
            PipelineTemplate::JavaService => "JAVA_SERVICE",
            PipelineTemplate::PythonLibrary => "PYTHON_LIBRARY",
            PipelineTemplate::PythonService => "PYTHON_SERVICE",
            PipelineTemplate::DockerService => "DOCKER_SERVICE",
            PipelineTemplate::HelmChart => "HELM_CHART",
        }
    }
}

impl std::fmt::Display for PipelineTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineTemplate {
    type Err = ParseEnumError;

    /// Accepts the wire form (`JAVA_LIBRARY`), kebab case (`java-library`)
    /// and the template name (`JavaLibrary`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('-', "_").to_ascii_uppercase();
        PipelineTemplate::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized || t.template_name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseEnumError {
                kind: "pipeline template",
                value: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_from_str_variants() {
        assert_eq!(
            "JAVA_LIBRARY".parse::<PipelineTemplate>(),
            Ok(PipelineTemplate::JavaLibrary)
        );
        assert_eq!(
            "helm-chart".parse::<PipelineTemplate>(),
            Ok(PipelineTemplate::HelmChart)
        );
        assert_eq!(
            "PythonService".parse::<PipelineTemplate>(),
            Ok(PipelineTemplate::PythonService)
        );
        assert!("cobol".parse::<PipelineTemplate>().is_err());
    }

    #[test]
    fn test_pipeline_serializes_camel_case() {
        let pipeline = Pipeline::new("G1/G2/art")
            .with_template(PipelineTemplate::DockerService)
            .with_repository("git@x:y.git")
            .with_credential("pull-key");

        let json = serde_json::to_value(&pipeline).unwrap();
        assert_eq!(json["template"], "DOCKER_SERVICE");
        assert_eq!(json["sourceRepository"]["sshUrl"], "git@x:y.git");
        assert_eq!(json["credentialId"], "pull-key");
        assert_eq!(pipeline.repository_url(), Some("git@x:y.git"));
    }

    #[test]
    fn test_every_template_parses_from_display() {
        for template in PipelineTemplate::ALL {
            assert_eq!(template.to_string().parse::<PipelineTemplate>(), Ok(template));
        }
    }
}
