//! High-level operations.

pub mod deploy;

pub use deploy::{deploy, resolve_pipeline_config, DeployOptions, DeployOutcome};
