//! Strip stage: remove debug symbols from the deployed binary in place.

use std::path::Path;

use crate::pipeline::error::StageError;
use crate::pipeline::stage::{Stage, StageContext, StageData, StageKind};
use crate::pipeline::PipelineConfig;
use crate::util::fs::file_size;
use crate::util::process::ProcessBuilder;
use crate::util::shell::Status;

/// Runs the stripping utility on the deployment target.
///
/// On failure the unstripped binary stays installed.
#[derive(Debug, Default, Clone, Copy)]
pub struct StripStage;

impl StripStage {
    /// The strip command for the binary at `path`.
    pub fn command(config: &PipelineConfig, path: &Path) -> ProcessBuilder {
        ProcessBuilder::new(&config.strip_program)
            .args(&config.strip_args)
            .arg(path)
            .cwd(&config.work_dir)
    }
}

impl Stage for StripStage {
    fn kind(&self) -> StageKind {
        StageKind::Strip
    }

    fn describe(&self, cx: &StageContext<'_>) -> String {
        Self::command(cx.config, &cx.config.target).display_command()
    }

    fn run(&self, cx: &StageContext<'_>, data: &mut StageData) -> Result<(), StageError> {
        let deployed = data.deployed_mut()?;
        cx.shell.status(Status::Stripping, deployed.path.display());

        cx.run(&Self::command(cx.config, &deployed.path))?;

        let stripped = file_size(&deployed.path)?;
        tracing::debug!(
            "stripped {}: {} -> {} bytes",
            deployed.path.display(),
            deployed.size,
            stripped
        );
        deployed.stripped_size = Some(stripped);
        Ok(())
    }
}
