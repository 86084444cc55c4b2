//! Gantry Manager
//!
//! Exposes provider-neutral pipeline, build, membership and credential
//! operations over a Jenkins server.
//!
//! # Architecture
//!
//! - [`controller`] - Outward entry point: retries and error codes
//! - [`service`] - Folder provisioning, authorization sync, build detection
//! - [`authorization`] - Role to permission mapping on folder configurations
//! - [`templates`] - Job definitions used to create pipelines
//! - [`retry`] - Retry executor shared by the controller and provisioner
//!
//! # Example
//!
//! ```no_run
//! use gantry_core::{Pipeline, PipelineTemplate};
//! use gantry_manager::{Config, PipelineController};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! let controller = PipelineController::from_config(&config)?;
//!
//! let pipeline = Pipeline::new("team/libs/art")
//!     .with_template(PipelineTemplate::JavaLibrary)
//!     .with_repository("git@git.example.org:team/art.git");
//! let created = controller.create_pipeline(pipeline).await?;
//! println!("{:?}", created.provider_id);
//! # Ok(())
//! # }
//! ```

pub mod authorization;
pub mod config;
pub mod controller;
pub mod error;
pub mod retry;
pub mod service;
pub mod templates;

pub use config::Config;
pub use controller::{ApiError, ApiResult, ErrorCode, PipelineController};
pub use error::{Result, ServiceError};
pub use retry::{Backoff, RetryPolicy};
pub use service::PipelineService;
pub use templates::TemplateStore;
