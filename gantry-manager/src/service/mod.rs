//! Service Module
//!
//! Adapter logic on top of the CI server gateway. [`PipelineService`] is the
//! entry point; the other services each own one concern of it.

pub mod builds;
pub mod folders;
pub mod memberships;
pub mod pipelines;

#[cfg(test)]
pub(crate) mod testing;

pub use builds::BuildDetector;
pub use folders::{FolderProvisioner, KeyedLocks, folder_chain};
pub use memberships::MembershipSynchronizer;
pub use pipelines::PipelineService;
