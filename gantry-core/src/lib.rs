//! Gantry Core
//!
//! Provider-neutral types for the Gantry pipeline adapter.
//!
//! This crate contains the domain model exchanged between the outward layer
//! and the adapter: pipelines, builds, memberships and credentials. It knows
//! nothing about the remote CI server these are mapped onto.

pub mod domain;

pub use domain::build::{Build, BuildArgument, BuildStatus};
pub use domain::credential::Credential;
pub use domain::membership::{MemberType, Membership, Role};
pub use domain::pipeline::{Pipeline, PipelineTemplate, ResourceStatus, SourceRepository};
