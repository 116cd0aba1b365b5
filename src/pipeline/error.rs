//! Error types for pipeline stages.

use std::io;
use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::pipeline::stage::StageKind;
use crate::util::process::{spawn_exit_code, EXIT_NOT_FOUND};

/// Why a single stage failed.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("`{program}` could not be found")]
    ToolNotFound { program: String },

    #[error("failed to run `{command}`")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` failed with exit code {code}")]
    CommandFailed { command: String, code: i32 },

    #[error("`{command}` did not produce an executable for `{bin}`")]
    MissingArtifact { command: String, bin: String },

    #[error("installed copy `{}` does not match the release artifact", .path.display())]
    ChecksumMismatch { path: PathBuf },

    #[error("no {what} was handed over by the previous stage")]
    MissingInput { what: &'static str },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StageError {
    /// Exit code to report for this failure.
    ///
    /// Command failures pass the tool's own code through.
    pub fn exit_code(&self) -> i32 {
        match self {
            StageError::ToolNotFound { .. } => EXIT_NOT_FOUND,
            StageError::Spawn { source, .. } => spawn_exit_code(source),
            StageError::CommandFailed { code, .. } => *code,
            StageError::MissingArtifact { .. }
            | StageError::ChecksumMismatch { .. }
            | StageError::MissingInput { .. }
            | StageError::Other(_) => 1,
        }
    }
}

/// A stage failure that stopped the pipeline.
#[derive(Debug, Error, Diagnostic)]
pub enum PipelineError {
    #[error("build failed")]
    #[diagnostic(
        code(synctool_deploy::build::failed),
        help("the deployed binary was not touched")
    )]
    Build(#[source] StageError),

    #[error("install failed")]
    #[diagnostic(
        code(synctool_deploy::install::failed),
        help("the deployed binary was not touched; the release artifact is still in the build output")
    )]
    Install(#[source] StageError),

    #[error("strip failed")]
    #[diagnostic(
        code(synctool_deploy::strip::failed),
        help("the new binary is installed but still carries debug symbols")
    )]
    Strip(#[source] StageError),
}

impl PipelineError {
    pub fn new(stage: StageKind, source: StageError) -> Self {
        match stage {
            StageKind::Build => PipelineError::Build(source),
            StageKind::Install => PipelineError::Install(source),
            StageKind::Strip => PipelineError::Strip(source),
        }
    }

    /// The stage that failed.
    pub fn stage(&self) -> StageKind {
        match self {
            PipelineError::Build(_) => StageKind::Build,
            PipelineError::Install(_) => StageKind::Install,
            PipelineError::Strip(_) => StageKind::Strip,
        }
    }

    /// The underlying stage error.
    pub fn stage_error(&self) -> &StageError {
        match self {
            PipelineError::Build(e) | PipelineError::Install(e) | PipelineError::Strip(e) => e,
        }
    }

    /// Exit code of the failing stage.
    pub fn exit_code(&self) -> i32 {
        self.stage_error().exit_code()
    }
}
