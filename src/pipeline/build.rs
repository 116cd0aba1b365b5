//! Build stage: compile the release binary with cargo.
//!
//! Cargo runs with `--message-format=json-render-diagnostics`, so compiler
//! diagnostics are still rendered to the inherited stderr while stdout
//! carries one JSON message per line. The `compiler-artifact` message for
//! the binary target names the executable, which is the release artifact.

use std::path::PathBuf;

use serde::Deserialize;

use crate::pipeline::error::StageError;
use crate::pipeline::stage::{Artifact, Stage, StageContext, StageData, StageKind};
use crate::pipeline::PipelineConfig;
use crate::util::fs::file_size;
use crate::util::process::ProcessBuilder;
use crate::util::shell::Status;

/// Subset of cargo's JSON message we care about.
#[derive(Debug, Deserialize)]
struct CargoMessage {
    reason: String,
    #[serde(default)]
    target: Option<CargoTarget>,
    #[serde(default)]
    executable: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct CargoTarget {
    name: String,
    #[serde(default)]
    kind: Vec<String>,
}

/// Find the executable cargo reported for binary target `bin`.
///
/// Lines that are not JSON messages are ignored. If several artifacts match,
/// the last one wins.
pub fn find_executable_in_messages(stdout: &str, bin: &str) -> Option<PathBuf> {
    let mut found = None;

    for line in stdout.lines().map(str::trim).filter(|l| l.starts_with('{')) {
        let message: CargoMessage = match serde_json::from_str(line) {
            Ok(message) => message,
            Err(e) => {
                tracing::debug!("skipping unparseable cargo message: {}", e);
                continue;
            }
        };

        if message.reason != "compiler-artifact" {
            continue;
        }
        let Some(target) = message.target else {
            continue;
        };
        if target.name == bin && target.kind.iter().any(|k| k == "bin") {
            if let Some(executable) = message.executable {
                found = Some(executable);
            }
        }
    }

    found
}

/// Compiles the project in release mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuildStage;

impl BuildStage {
    /// The toolchain command for `config`.
    pub fn command(config: &PipelineConfig) -> ProcessBuilder {
        ProcessBuilder::new(&config.toolchain)
            .args([
                "build",
                "--release",
                "--message-format=json-render-diagnostics",
                "--bin",
            ])
            .arg(&config.bin)
            .args(&config.build_args)
            .cwd(&config.work_dir)
    }
}

impl Stage for BuildStage {
    fn kind(&self) -> StageKind {
        StageKind::Build
    }

    fn describe(&self, cx: &StageContext<'_>) -> String {
        Self::command(cx.config).display_command()
    }

    fn run(&self, cx: &StageContext<'_>, data: &mut StageData) -> Result<(), StageError> {
        let config = cx.config;
        cx.shell.status(
            Status::Building,
            format!("`{}` in {}", config.bin, config.work_dir.display()),
        );

        let cmd = Self::command(config);
        let output = cx.run_capture_stdout(&cmd)?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        let path = match find_executable_in_messages(&stdout, &config.bin) {
            Some(path) => path,
            None => {
                let fallback = config.conventional_artifact();
                if !fallback.is_file() {
                    return Err(StageError::MissingArtifact {
                        command: cmd.display_command(),
                        bin: config.bin.clone(),
                    });
                }
                tracing::debug!(
                    "toolchain reported no executable; using {}",
                    fallback.display()
                );
                fallback
            }
        };

        let size = file_size(&path)?;
        tracing::debug!("release artifact: {} ({} bytes)", path.display(), size);

        data.artifact = Some(Artifact { path, size });
        Ok(())
    }
}
