//! Configuration module
//!
//! Settings shared by every command: how to reach the adapter's CI server
//! and how to print results.

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Adapter settings, validated when a command connects
    pub adapter: gantry_manager::Config,

    /// Print results as JSON instead of human-readable text
    pub json: bool,
}
