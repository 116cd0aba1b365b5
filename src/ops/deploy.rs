//! Implementation of a deployment run.

use std::path::PathBuf;

use anyhow::Result;

use crate::pipeline::{Pipeline, PipelineConfig, PipelineReport};
use crate::util::config::load_config;
use crate::util::{GlobalContext, Shell};

/// Options for a deployment run.
#[derive(Debug, Clone, Default)]
pub struct DeployOptions {
    /// Explicit configuration file (highest precedence)
    pub config_path: Option<PathBuf>,

    /// Only print the commands that would run
    pub print_only: bool,
}

/// What a deployment run did.
#[derive(Debug)]
pub enum DeployOutcome {
    /// Commands that would run, in order; nothing was executed.
    Planned(Vec<String>),

    /// All stages completed.
    Deployed(PipelineReport),
}

/// Resolve configuration into concrete pipeline settings.
pub fn resolve_pipeline_config(ctx: &GlobalContext, opts: &DeployOptions) -> Result<PipelineConfig> {
    let (config, work_dir) = load_config(ctx, opts.config_path.as_deref())?;
    let resolved = config.resolve(ctx, &work_dir)?;

    tracing::debug!("toolchain: {}", resolved.toolchain.display());
    tracing::debug!("deployment target: {}", resolved.target.display());

    Ok(resolved)
}

/// Build, install and strip.
///
/// Stage failures come back as a [`crate::pipeline::PipelineError`] inside
/// the `anyhow::Error`, so callers can downcast for the exit code.
pub fn deploy(ctx: &GlobalContext, shell: &Shell, opts: &DeployOptions) -> Result<DeployOutcome> {
    let config = resolve_pipeline_config(ctx, opts)?;
    let mut pipeline = Pipeline::new(&config, shell);

    if opts.print_only {
        return Ok(DeployOutcome::Planned(pipeline.plan()));
    }

    let report = pipeline.run()?;
    Ok(DeployOutcome::Deployed(report))
}
