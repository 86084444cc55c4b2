//! Folder-related API endpoints

use crate::JenkinsClient;
use crate::error::Result;
use crate::model::FolderRef;

/// Item class the folder plugin registers folders under
const FOLDER_MODE: &str = "com.cloudbees.hudson.plugins.folder.Folder";

impl JenkinsClient {
    /// Get folder `name` under `parent`
    ///
    /// Returns `None` when no item exists there or the item is not a folder.
    pub(crate) async fn fetch_folder(
        &self,
        parent: &FolderRef,
        name: &str,
    ) -> Result<Option<FolderRef>> {
        let folder = parent.child(name);
        let info = self.fetch_item_info(folder.segments()).await?;

        Ok(info.filter(|info| info.is_folder()).map(|_| folder))
    }

    /// Create folder `name` under `parent`
    pub(crate) async fn post_folder(&self, parent: &FolderRef, name: &str) -> Result<()> {
        let url = self.item_url(parent.segments(), &["createItem"])?;
        let response = self
            .post(url)
            .await?
            .form(&[
                ("name", name),
                ("mode", FOLDER_MODE),
                ("from", ""),
                ("Submit", "OK"),
            ])
            .send()
            .await?;

        self.handle_empty_response(response).await?;
        tracing::info!("Created folder {} in {}", name, parent);
        Ok(())
    }
}
