//! Call surface over the CI server
//!
//! The adapter only talks to the server through [`CiServer`], which keeps it
//! free of hidden global state and lets tests substitute an in-memory server
//! or a `mockall` mock (`mocks` feature).

use async_trait::async_trait;
use std::collections::HashMap;

use crate::JenkinsClient;
use crate::error::Result;
use crate::model::{
    BuildDetails, FolderRef, JobDetails, JobRef, QueueReference, SshCredential,
};

/// Remote CI server primitives
///
/// Every call may fail with a transport or HTTP error. Simple absence is
/// `Ok(None)`.
#[cfg_attr(feature = "mocks", mockall::automock)]
#[async_trait]
pub trait CiServer: Send + Sync {
    /// Folder `name` directly under `parent`, if it exists and is a folder
    async fn get_folder(&self, parent: &FolderRef, name: &str) -> Result<Option<FolderRef>>;

    /// Create folder `name` under `parent`
    ///
    /// Fails when the folder already exists.
    async fn create_folder(&self, parent: &FolderRef, name: &str) -> Result<()>;

    /// Item (job or folder) at a slash-delimited full path
    async fn get_job(&self, path: &str) -> Result<Option<JobRef>>;

    /// Item `name` directly under `folder`
    async fn get_job_in(&self, folder: &FolderRef, name: &str) -> Result<Option<JobRef>>;

    /// Create job `name` under `folder` from a job-definition document
    async fn create_job(&self, folder: &FolderRef, name: &str, definition: &str) -> Result<()>;

    /// Delete item `name` under `folder`
    ///
    /// Without `force`, an item that still contains other items is refused.
    async fn delete_job(&self, folder: &FolderRef, name: &str, force: bool) -> Result<()>;

    /// Raw configuration document of the item at `path`
    async fn get_job_config(&self, path: &str) -> Result<String>;

    /// Replace the configuration document of the item at `path`
    async fn update_job_config(&self, path: &str, document: &str) -> Result<()>;

    /// Queue a build; the returned reference carries no build number
    async fn trigger_build(
        &self,
        job: &JobRef,
        params: Option<HashMap<String, String>>,
    ) -> Result<QueueReference>;

    async fn get_job_details(&self, job: &JobRef) -> Result<JobDetails>;

    /// Build `number` of `job`, if it exists
    async fn get_build_details(&self, job: &JobRef, number: u32) -> Result<Option<BuildDetails>>;

    /// Register an SSH credential in the store of the folder at `folder_path`
    async fn create_credential(&self, folder_path: &str, credential: &SshCredential) -> Result<()>;
}

#[async_trait]
impl CiServer for JenkinsClient {
    async fn get_folder(&self, parent: &FolderRef, name: &str) -> Result<Option<FolderRef>> {
        self.fetch_folder(parent, name).await
    }

    async fn create_folder(&self, parent: &FolderRef, name: &str) -> Result<()> {
        self.post_folder(parent, name).await
    }

    async fn get_job(&self, path: &str) -> Result<Option<JobRef>> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            return Ok(None);
        }
        self.fetch_item(&segments).await
    }

    async fn get_job_in(&self, folder: &FolderRef, name: &str) -> Result<Option<JobRef>> {
        let item = folder.child(name);
        self.fetch_item(item.segments()).await
    }

    async fn create_job(&self, folder: &FolderRef, name: &str, definition: &str) -> Result<()> {
        self.post_job(folder, name, definition).await
    }

    async fn delete_job(&self, folder: &FolderRef, name: &str, force: bool) -> Result<()> {
        self.post_delete(folder, name, force).await
    }

    async fn get_job_config(&self, path: &str) -> Result<String> {
        self.fetch_config(path).await
    }

    async fn update_job_config(&self, path: &str, document: &str) -> Result<()> {
        self.post_config(path, document).await
    }

    async fn trigger_build(
        &self,
        job: &JobRef,
        params: Option<HashMap<String, String>>,
    ) -> Result<QueueReference> {
        self.post_build(job, params).await
    }

    async fn get_job_details(&self, job: &JobRef) -> Result<JobDetails> {
        self.fetch_job_details(job).await
    }

    async fn get_build_details(&self, job: &JobRef, number: u32) -> Result<Option<BuildDetails>> {
        self.fetch_build_details(job, number).await
    }

    async fn create_credential(&self, folder_path: &str, credential: &SshCredential) -> Result<()> {
        self.post_credential(folder_path, credential).await
    }
}
