//! The build → install → strip pipeline.
//!
//! The driver runs an ordered list of [`Stage`]s. Each stage reads what the
//! previous one left in [`StageData`] and adds its own output. The first
//! failure stops the run: later stages never start, nothing is retried and
//! nothing already done is rolled back.
//!
//! ```text
//! Start → Building → Installing → Stripping → Done
//!             └───────────┴────────────┴──────→ Failed
//! ```

pub mod build;
pub mod config;
pub mod error;
pub mod install;
pub mod stage;
pub mod strip;

use std::time::{Duration, Instant};

pub use build::BuildStage;
pub use config::PipelineConfig;
pub use error::{PipelineError, StageError};
pub use install::InstallStage;
pub use stage::{Artifact, Deployed, Stage, StageContext, StageData, StageKind};
pub use strip::StripStage;

use crate::util::Shell;

/// Where the pipeline is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Start,
    Building,
    Installing,
    Stripping,
    Done,
    Failed(StageKind),
}

impl PipelineState {
    /// The state while `stage` runs.
    pub fn running(stage: StageKind) -> Self {
        match stage {
            StageKind::Build => PipelineState::Building,
            StageKind::Install => PipelineState::Installing,
            StageKind::Strip => PipelineState::Stripping,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed(_))
    }
}

/// Time spent in one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageTiming {
    pub stage: StageKind,
    pub duration: Duration,
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub artifact: Option<Artifact>,
    pub deployed: Option<Deployed>,
    pub timings: Vec<StageTiming>,
    pub elapsed: Duration,
}

/// Sequential stage driver.
pub struct Pipeline<'a> {
    config: &'a PipelineConfig,
    shell: &'a Shell,
    stages: Vec<Box<dyn Stage>>,
    state: PipelineState,
}

impl<'a> Pipeline<'a> {
    /// The standard build, install, strip sequence.
    pub fn new(config: &'a PipelineConfig, shell: &'a Shell) -> Self {
        Self::with_stages(
            config,
            shell,
            vec![
                Box::new(BuildStage),
                Box::new(InstallStage),
                Box::new(StripStage),
            ],
        )
    }

    /// A pipeline over a custom stage list.
    pub fn with_stages(
        config: &'a PipelineConfig,
        shell: &'a Shell,
        stages: Vec<Box<dyn Stage>>,
    ) -> Self {
        Pipeline {
            config,
            shell,
            stages,
            state: PipelineState::Start,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// What each stage would run, in order, without running anything.
    pub fn plan(&self) -> Vec<String> {
        let cx = StageContext::new(self.config, self.shell);
        self.stages.iter().map(|stage| stage.describe(&cx)).collect()
    }

    /// Run every stage in order, stopping at the first failure.
    ///
    /// Calling this again starts over from the first stage.
    pub fn run(&mut self) -> Result<PipelineReport, PipelineError> {
        let start = Instant::now();
        let cx = StageContext::new(self.config, self.shell);
        let mut data = StageData::default();
        let mut timings = Vec::with_capacity(self.stages.len());

        self.state = PipelineState::Start;
        tracing::debug!("working directory: {}", self.config.work_dir.display());

        for stage in &self.stages {
            let kind = stage.kind();
            self.state = PipelineState::running(kind);
            tracing::debug!("stage {} started", kind);

            let stage_start = Instant::now();
            if let Err(err) = stage.run(&cx, &mut data) {
                self.state = PipelineState::Failed(kind);
                tracing::debug!("stage {} failed: {}", kind, err);
                return Err(PipelineError::new(kind, err));
            }

            let duration = stage_start.elapsed();
            tracing::debug!("stage {} finished in {:?}", kind, duration);
            timings.push(StageTiming {
                stage: kind,
                duration,
            });
        }

        self.state = PipelineState::Done;
        Ok(PipelineReport {
            artifact: data.artifact,
            deployed: data.deployed,
            timings,
            elapsed: start.elapsed(),
        })
    }
}
