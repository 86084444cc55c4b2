//! Pipeline Service
//!
//! Provider-neutral operations on pipelines, builds, memberships and
//! credentials, mapped onto the CI server's folders and jobs.

use std::collections::HashMap;
use std::sync::Arc;

use gantry_client::{CiServer, FolderRef, JobRef, SshCredential};
use gantry_core::domain::pipeline::PROVIDER_JENKINS;
use gantry_core::{Build, Credential, Membership, Pipeline, ResourceStatus};

use crate::error::{Result, ServiceError};
use crate::service::builds::{BuildDetector, to_build};
use crate::service::folders::{FolderProvisioner, KeyedLocks, folder_chain};
use crate::service::memberships::MembershipSynchronizer;
use crate::templates::TemplateStore;

/// Builds listed when the caller sets no limit
pub const DEFAULT_BUILD_MAX: usize = 5;

/// Build parameter holding the built branch
pub const BRANCH_PARAMETER: &str = "GIT_BRANCH";

pub struct PipelineService {
    server: Arc<dyn CiServer>,
    templates: Arc<TemplateStore>,
    folders: FolderProvisioner,
    memberships: MembershipSynchronizer,
    detector: BuildDetector,
}

impl PipelineService {
    /// # Arguments
    /// * `server` - CI server all operations go to
    /// * `templates` - Job definitions by template
    /// * `locks` - Folder creation locks, shared by every service of the process
    pub fn new(
        server: Arc<dyn CiServer>,
        templates: Arc<TemplateStore>,
        locks: Arc<KeyedLocks>,
    ) -> Self {
        Self {
            folders: FolderProvisioner::new(server.clone(), locks),
            memberships: MembershipSynchronizer::new(server.clone()),
            detector: BuildDetector::new(server.clone()),
            server,
            templates,
        }
    }

    // =============================================================================
    // Pipelines
    // =============================================================================

    /// Create the job backing `pipeline`, provisioning its folders
    ///
    /// # Returns
    /// `pipeline` with `provider_id`, `status` and `provider` filled in
    pub async fn create_pipeline(&self, mut pipeline: Pipeline) -> Result<Pipeline> {
        let path = required(pipeline.path.as_deref(), "Pipeline path")?;
        let repo_url = required(pipeline.repository_url(), "Source repository URL")?;
        let template = pipeline
            .template
            .ok_or_else(|| ServiceError::InvalidArgument("Pipeline template is required".into()))?;
        let (folder_path, name) = split_pipeline_path(path)?;

        tracing::info!("Creating pipeline {} from template {}", path, template);

        let chain = folder_chain(folder_path);
        let folder = self.folders.ensure_chain(&chain).await?;

        if self.server.get_job_in(&folder, name).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Pipeline {} already existing in folder {}",
                name, folder
            )));
        }

        let definition = self.templates.render(
            template,
            repo_url,
            pipeline.credential_id.as_deref().unwrap_or_default(),
        )?;
        self.server.create_job(&folder, name, &definition).await?;

        if self.server.get_job_in(&folder, name).await?.is_none() {
            return Err(ServiceError::State(format!(
                "Pipeline {} should be created in folder {}, but does not exist",
                name, folder
            )));
        }

        let provider_id = folder.child(name).path();
        tracing::info!("Pipeline {} created as {}", path, provider_id);

        pipeline.provider_id = Some(provider_id);
        pipeline.status = Some(ResourceStatus::Ready);
        pipeline.provider = Some(PROVIDER_JENKINS.to_string());
        Ok(pipeline)
    }

    /// Delete the job at `path`
    pub async fn delete_pipeline(&self, path: &str) -> Result<()> {
        let path = required(Some(path), "Pipeline path")?;
        let (folder_path, name) = split_pipeline_path(path)?;

        let parent = self.server.get_job(folder_path).await?.ok_or_else(|| {
            ServiceError::NotFound(format!("Folder {} does not exist", folder_path))
        })?;
        let folder = FolderRef::from_segments(parent.segments());

        if self.server.get_job_in(&folder, name).await?.is_none() {
            return Err(ServiceError::NotFound(format!(
                "Pipeline {} does not exist",
                path
            )));
        }

        self.server.delete_job(&folder, name, true).await?;

        if self.server.get_job_in(&folder, name).await?.is_some() {
            return Err(ServiceError::State(format!(
                "Pipeline {} should be deleted, but still exists",
                path
            )));
        }

        tracing::info!("Pipeline {} deleted", path);
        Ok(())
    }

    // =============================================================================
    // Builds
    // =============================================================================

    /// Start a build of the pipeline at `build.path`
    ///
    /// Build arguments become build parameters.
    pub async fn create_build(&self, build: Build) -> Result<Build> {
        let path = required(build.path.as_deref(), "Build path")?;
        let job = self.find_job(path).await?;

        let params = build.build_arguments.as_ref().map(|arguments| {
            arguments
                .iter()
                .map(|argument| (argument.key.clone(), argument.value.clone()))
                .collect::<HashMap<_, _>>()
        });

        let started = self.detector.trigger(&job, params).await?;
        let details = self.server.get_build_details(&job, started.number).await?;

        to_build(build, started.number, details.as_ref())
    }

    pub async fn get_build(&self, path: &str, build_number: &str) -> Result<Build> {
        let path = required(Some(path), "Build path")?;
        let number = build_number.trim().parse::<u32>().map_err(|_| {
            ServiceError::InvalidArgument(format!("Build number '{}' is not a number", build_number))
        })?;
        let job = self.find_job(path).await?;

        let details = self
            .server
            .get_build_details(&job, number)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Build {} of pipeline {} does not exist", number, path))
            })?;

        to_build(Build::new(path), number, Some(&details))
    }

    /// Most recent builds of the pipeline at `path`
    ///
    /// # Arguments
    /// * `branch` - Keep only builds whose `GIT_BRANCH` parameter equals it
    /// * `max_result` - Maximum number of builds, `DEFAULT_BUILD_MAX` when unset
    pub async fn get_builds(
        &self,
        path: &str,
        branch: Option<&str>,
        max_result: Option<usize>,
    ) -> Result<Vec<Build>> {
        let path = required(Some(path), "Build path")?;
        let max_result = max_result.unwrap_or(DEFAULT_BUILD_MAX);
        let branch = branch.filter(|branch| !branch.is_empty());
        let job = self.find_job(path).await?;

        let history = self.server.get_job_details(&job).await?.builds;
        let mut builds = Vec::new();

        for build_ref in history {
            if builds.len() >= max_result {
                break;
            }

            let details = self.server.get_build_details(&job, build_ref.number).await?;

            // Without details the branch of a build is unknown
            if let Some(branch) = branch {
                let built = details
                    .as_ref()
                    .and_then(|details| details.parameters.get(BRANCH_PARAMETER))
                    .map(String::as_str);
                if built != Some(branch) {
                    continue;
                }
            }

            builds.push(to_build(Build::new(path), build_ref.number, details.as_ref())?);
        }

        Ok(builds)
    }

    // =============================================================================
    // Memberships, Credentials, Folders
    // =============================================================================

    /// Grant the membership's role to its group on the path and its ancestors
    pub async fn add_membership(&self, membership: Membership) -> Result<Membership> {
        let path = required(membership.path.as_deref(), "Membership path")?.trim_matches('/');
        let member_name = required(membership.member_name.as_deref(), "Member name")?;
        if membership.member_type.is_none() {
            return Err(ServiceError::InvalidArgument("Member type is required".into()));
        }
        let role = membership
            .role
            .ok_or_else(|| ServiceError::InvalidArgument("Membership role is required".into()))?;

        self.memberships.grant(path, member_name, role).await?;
        Ok(membership)
    }

    pub async fn get_memberships(&self, path: &str) -> Result<Vec<Membership>> {
        let path = required(Some(path), "Membership path")?.trim_matches('/');
        self.memberships.memberships(path).await
    }

    /// Register an SSH credential in the folder at `credential.path`
    pub async fn add_credential(&self, credential: Credential) -> Result<Credential> {
        let path = required(credential.path.as_deref(), "Credential path")?;
        let path = path.strip_prefix('/').unwrap_or(path);
        let id = required(credential.credential_id.as_deref(), "Credential id")?;
        let username = required(credential.username.as_deref(), "Credential username")?;
        let private_key = required(credential.private_key.as_deref(), "Credential private key")?;

        let ssh = SshCredential {
            id: id.to_string(),
            username: username.to_string(),
            private_key: private_key.to_string(),
            description: credential.description.clone().unwrap_or_default(),
        };
        self.server.create_credential(path, &ssh).await?;

        Ok(credential)
    }

    /// Provision the folder chain of `path`
    pub async fn create_folder(&self, path: &str) -> Result<FolderRef> {
        let chain = folder_chain(path);
        if chain.is_empty() {
            return Err(ServiceError::InvalidArgument("Folder path is required".into()));
        }
        self.folders.ensure_chain(&chain).await
    }

    async fn find_job(&self, path: &str) -> Result<JobRef> {
        self.server
            .get_job(path)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Pipeline {} does not exist", path)))
    }
}

// =============================================================================
// Validation
// =============================================================================

fn required<'a>(value: Option<&'a str>, what: &str) -> Result<&'a str> {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ServiceError::InvalidArgument(format!("{} is required", what))),
    }
}

/// Split `folder/.../name` into folder path and leaf name
fn split_pipeline_path(path: &str) -> Result<(&str, &str)> {
    let trimmed = path.trim_matches('/');
    match trimmed.rsplit_once('/') {
        Some((folder, name)) if !folder.trim_matches('/').is_empty() && !name.is_empty() => {
            Ok((folder, name))
        }
        _ => Err(ServiceError::InvalidArgument(format!(
            "Pipeline path '{}' must name a folder and a pipeline",
            path
        ))),
    }
}
