//! The stage abstraction shared by build, install and strip.

use std::fmt;
use std::path::PathBuf;
use std::process::Output;

use crate::pipeline::error::StageError;
use crate::pipeline::PipelineConfig;
use crate::util::process::{exit_code, find_executable, ProcessBuilder};
use crate::util::Shell;

/// Which stage of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Build,
    Install,
    Strip,
}

impl StageKind {
    /// All stages in execution order.
    pub const ALL: [StageKind; 3] = [StageKind::Build, StageKind::Install, StageKind::Strip];

    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::Build => "build",
            StageKind::Install => "install",
            StageKind::Strip => "strip",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The release binary produced by the build stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub size: u64,
}

/// The binary at the deployment target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployed {
    pub path: PathBuf,
    /// Size as installed, before stripping
    pub size: u64,
    /// SHA-256 of the installed bytes, before stripping
    pub sha256: String,
    /// Size after stripping, once the strip stage has run
    pub stripped_size: Option<u64>,
}

/// Values handed forward from one stage to the next.
#[derive(Debug, Clone, Default)]
pub struct StageData {
    pub artifact: Option<Artifact>,
    pub deployed: Option<Deployed>,
}

impl StageData {
    pub fn artifact(&self) -> Result<&Artifact, StageError> {
        self.artifact
            .as_ref()
            .ok_or(StageError::MissingInput { what: "release artifact" })
    }

    pub fn deployed_mut(&mut self) -> Result<&mut Deployed, StageError> {
        self.deployed
            .as_mut()
            .ok_or(StageError::MissingInput { what: "deployed binary" })
    }
}

/// Read-only environment a stage runs in.
pub struct StageContext<'a> {
    pub config: &'a PipelineConfig,
    pub shell: &'a Shell,
}

impl<'a> StageContext<'a> {
    pub fn new(config: &'a PipelineConfig, shell: &'a Shell) -> Self {
        StageContext { config, shell }
    }

    /// Trace and run a command with all stdio inherited.
    pub fn run(&self, cmd: &ProcessBuilder) -> Result<(), StageError> {
        let (cmd, display) = self.prepare(cmd)?;
        let status = cmd.status().map_err(|source| StageError::Spawn {
            command: display.clone(),
            source,
        })?;

        if !status.success() {
            return Err(StageError::CommandFailed {
                command: display,
                code: exit_code(status),
            });
        }
        Ok(())
    }

    /// Trace and run a command, capturing stdout; stderr stays on the terminal.
    pub fn run_capture_stdout(&self, cmd: &ProcessBuilder) -> Result<Output, StageError> {
        let (cmd, display) = self.prepare(cmd)?;
        let output = cmd
            .exec_capture_stdout()
            .map_err(|source| StageError::Spawn {
                command: display.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(StageError::CommandFailed {
                command: display,
                code: exit_code(output.status),
            });
        }
        Ok(output)
    }

    /// Print the trace line, then locate the program.
    ///
    /// An explicit path that exists is used as is, so a file without the
    /// execute bit fails at spawn time instead of looking missing.
    fn prepare(&self, cmd: &ProcessBuilder) -> Result<(ProcessBuilder, String), StageError> {
        let display = cmd.display_command();
        self.shell.trace(&display);

        let requested = cmd.get_program();
        let program = if requested.components().count() > 1 && requested.is_file() {
            requested.to_path_buf()
        } else {
            find_executable(requested).ok_or_else(|| StageError::ToolNotFound {
                program: requested.display().to_string(),
            })?
        };
        tracing::debug!("resolved `{}` to {}", requested.display(), program.display());

        Ok((cmd.clone().with_program(program), display))
    }
}

/// One step of the pipeline.
pub trait Stage {
    /// Which step this is.
    fn kind(&self) -> StageKind;

    /// Human-readable form of what `run` will do, for `--print`.
    fn describe(&self, cx: &StageContext<'_>) -> String;

    /// Run the step, reading inputs from and writing outputs to `data`.
    fn run(&self, cx: &StageContext<'_>, data: &mut StageData) -> Result<(), StageError>;
}
