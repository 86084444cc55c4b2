//! Job-related API endpoints
//!
//! Items on the server (jobs and folders alike) are addressed by their
//! slash-delimited path; configuration documents are exchanged as raw XML.

use serde::Deserialize;

use crate::JenkinsClient;
use crate::error::{ClientError, Result};
use crate::model::{FolderRef, JobRef};

/// Item summary as returned by `api/json`
#[derive(Debug, Deserialize)]
pub(crate) struct ItemInfo {
    #[serde(rename = "_class", default)]
    pub class: Option<String>,
    pub name: String,
    #[serde(default)]
    pub url: String,
    /// Present only on items that can contain other items
    #[serde(default)]
    pub jobs: Option<Vec<serde_json::Value>>,
}

impl ItemInfo {
    pub fn is_folder(&self) -> bool {
        self.jobs.is_some()
            || self
                .class
                .as_deref()
                .is_some_and(|class| class.ends_with(".Folder"))
    }

    pub fn has_children(&self) -> bool {
        self.jobs.as_ref().is_some_and(|jobs| !jobs.is_empty())
    }
}

impl JenkinsClient {
    // =============================================================================
    // Item Lookup
    // =============================================================================

    pub(crate) async fn fetch_item_info<S: AsRef<str> + Sync>(
        &self,
        segments: &[S],
    ) -> Result<Option<ItemInfo>> {
        let url = self.item_url(segments, &["api", "json"])?;
        let response = self
            .get(url)
            .query(&[("tree", "name,url,jobs[name]")])
            .send()
            .await?;

        self.handle_optional_response(response).await
    }

    /// Get the item at `segments`, `None` if it does not exist
    pub(crate) async fn fetch_item<S: AsRef<str> + Sync>(
        &self,
        segments: &[S],
    ) -> Result<Option<JobRef>> {
        let path = segments
            .iter()
            .map(|s| s.as_ref())
            .collect::<Vec<_>>()
            .join("/");

        tracing::debug!("Looking up item {}", path);

        Ok(self.fetch_item_info(segments).await?.map(|info| JobRef {
            is_folder: info.is_folder(),
            name: info.name,
            url: info.url,
            path,
        }))
    }

    // =============================================================================
    // Job Lifecycle
    // =============================================================================

    /// Create a job from its XML definition
    pub(crate) async fn post_job(
        &self,
        folder: &FolderRef,
        name: &str,
        definition: &str,
    ) -> Result<()> {
        let url = self.item_url(folder.segments(), &["createItem"])?;
        let response = self
            .post(url)
            .await?
            .query(&[("name", name)])
            .header(reqwest::header::CONTENT_TYPE, "application/xml")
            .body(definition.to_string())
            .send()
            .await?;

        self.handle_empty_response(response).await?;
        tracing::info!("Created job {} in {}", name, folder);
        Ok(())
    }

    /// Delete an item, refusing non-empty folders unless `force` is set
    pub(crate) async fn post_delete(&self, folder: &FolderRef, name: &str, force: bool) -> Result<()> {
        let item = folder.child(name);

        if !force {
            let info = self
                .fetch_item_info(item.segments())
                .await?
                .ok_or_else(|| ClientError::NotFound(item.path()))?;
            if info.has_children() {
                return Err(ClientError::InvalidRequest(format!(
                    "'{}' still contains items, deletion requires force",
                    item
                )));
            }
        }

        let url = self.item_url(item.segments(), &["doDelete"])?;
        let response = self.post(url).await?.send().await?;

        self.handle_empty_response(response).await?;
        tracing::info!("Deleted item {}", item);
        Ok(())
    }

    // =============================================================================
    // Configuration Documents
    // =============================================================================

    pub(crate) async fn fetch_config(&self, path: &str) -> Result<String> {
        let segments = path_segments(path)?;
        let url = self.item_url(&segments, &["config.xml"])?;
        let response = self.get(url).send().await?;

        self.handle_text_response(response).await
    }

    pub(crate) async fn post_config(&self, path: &str, document: &str) -> Result<()> {
        let segments = path_segments(path)?;
        let url = self.item_url(&segments, &["config.xml"])?;
        let response = self
            .post(url)
            .await?
            .header(reqwest::header::CONTENT_TYPE, "application/xml")
            .body(document.to_string())
            .send()
            .await?;

        self.handle_empty_response(response).await
    }
}

/// Split a slash-delimited item path, rejecting the empty path
pub(crate) fn path_segments(path: &str) -> Result<Vec<&str>> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return Err(ClientError::InvalidRequest(
            "Item path cannot be empty".to_string(),
        ));
    }
    Ok(segments)
}
