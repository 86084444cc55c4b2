//! Membership Synchronizer
//!
//! Keeps the authorization matrix of a folder and of all its ancestors in
//! line with the role granted to a group.

use std::sync::Arc;

use gantry_client::CiServer;
use gantry_core::{Membership, Role};

use crate::authorization::{AuthorizationDocument, role_for_permissions, role_permissions};
use crate::error::Result;

/// `path` followed by each of its ancestors, deepest first
pub fn ancestor_paths(path: &str) -> Vec<String> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    (1..=segments.len())
        .rev()
        .map(|depth| segments[..depth].join("/"))
        .collect()
}

pub struct MembershipSynchronizer {
    server: Arc<dyn CiServer>,
}

impl MembershipSynchronizer {
    pub fn new(server: Arc<dyn CiServer>) -> Self {
        Self { server }
    }

    /// Grant `role` to `principal` on `path` and every ancestor
    ///
    /// Levels that do not exist remotely are skipped. The first failing level
    /// aborts the call; levels already written stay written.
    pub async fn grant(&self, path: &str, principal: &str, role: Role) -> Result<()> {
        let permissions = role_permissions(role);

        for level in ancestor_paths(path) {
            let Some(item) = self.server.get_job(&level).await? else {
                tracing::debug!("Skipping {}: no such item", level);
                continue;
            };

            let config = self.server.get_job_config(&item.path).await?;
            let mut document = AuthorizationDocument::parse(&config)?;
            document.set_grants(principal, &permissions)?;
            self.server
                .update_job_config(&item.path, &document.to_xml()?)
                .await?;

            tracing::info!("Granted {} to {} on {}", role, principal, item.path);
        }

        Ok(())
    }

    /// Memberships recorded in the matrix of `path`
    pub async fn memberships(&self, path: &str) -> Result<Vec<Membership>> {
        let Some(item) = self.server.get_job(path).await? else {
            return Ok(Vec::new());
        };

        let config = self.server.get_job_config(&item.path).await?;
        let document = AuthorizationDocument::parse(&config)?;
        if !document.has_matrix() {
            tracing::debug!("{} has no authorization matrix", item.path);
            return Ok(Vec::new());
        }

        let mut memberships = Vec::new();
        for (principal, permissions) in document.grants() {
            match role_for_permissions(&permissions) {
                Some(role) => memberships.push(Membership::group(path, principal, role)),
                None => tracing::warn!(
                    "Permissions of {} on {} match no role: {:?}",
                    principal,
                    path,
                    permissions
                ),
            }
        }

        Ok(memberships)
    }
}
