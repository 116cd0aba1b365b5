//! Resolved settings for a single pipeline run.

use std::path::{Path, PathBuf};

use crate::util::config::{DEFAULT_BIN, DEFAULT_STRIP, DEFAULT_TOOLCHAIN};

/// Concrete settings for one pipeline run.
///
/// Built once at start (usually by [`crate::util::Config::resolve`]) and
/// never modified while the stages run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Working context; every relative path is anchored here
    pub work_dir: PathBuf,
    /// Toolchain driver used by the build stage
    pub toolchain: PathBuf,
    /// Binary target to build
    pub bin: String,
    /// Extra arguments for the build command
    pub build_args: Vec<String>,
    /// Deployment target
    pub target: PathBuf,
    /// Symbol-stripping utility
    pub strip_program: PathBuf,
    /// Extra arguments for the strip command
    pub strip_args: Vec<String>,
}

impl PipelineConfig {
    pub fn new(work_dir: impl AsRef<Path>, target: impl AsRef<Path>) -> Self {
        Self {
            work_dir: work_dir.as_ref().to_path_buf(),
            toolchain: PathBuf::from(DEFAULT_TOOLCHAIN),
            bin: DEFAULT_BIN.to_string(),
            build_args: Vec::new(),
            target: target.as_ref().to_path_buf(),
            strip_program: PathBuf::from(DEFAULT_STRIP),
            strip_args: Vec::new(),
        }
    }

    pub fn with_toolchain(mut self, toolchain: impl AsRef<Path>) -> Self {
        self.toolchain = toolchain.as_ref().to_path_buf();
        self
    }

    pub fn with_bin(mut self, bin: impl Into<String>) -> Self {
        self.bin = bin.into();
        self
    }

    pub fn with_build_args(mut self, args: Vec<String>) -> Self {
        self.build_args = args;
        self
    }

    pub fn with_strip_program(mut self, program: impl AsRef<Path>) -> Self {
        self.strip_program = program.as_ref().to_path_buf();
        self
    }

    pub fn with_strip_args(mut self, args: Vec<String>) -> Self {
        self.strip_args = args;
        self
    }

    /// Where cargo puts the release binary when it does not say otherwise.
    pub fn conventional_artifact(&self) -> PathBuf {
        self.work_dir
            .join("target")
            .join("release")
            .join(format!("{}{}", self.bin, std::env::consts::EXE_SUFFIX))
    }
}
