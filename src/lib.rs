//! synctool-deploy - build, install and strip the synctool release binary
//!
//! This crate provides the library behind the `synctool-deploy` binary:
//! configuration loading, the fail-fast stage pipeline, and the process and
//! filesystem helpers the stages use.

pub mod ops;
pub mod pipeline;
pub mod util;

/// Test fixtures for unit tests.
///
/// Only compiled for tests. Provides quiet shells and shell-script stand-ins
/// for the toolchain and the stripping utility.
#[cfg(test)]
pub mod test_support;

pub use ops::{deploy, DeployOptions, DeployOutcome};
pub use pipeline::{Pipeline, PipelineConfig, PipelineError, PipelineReport, StageKind};
pub use util::context::GlobalContext;
