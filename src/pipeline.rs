use std::env;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{instrument, warn};

use crate::artifact::ArtifactLocation;
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::observability::MetricsCollector;
use crate::steps::default_steps;

/// State threaded through the steps of one run.
pub struct PipelineContext<'a> {
    pub root: &'a Path,
    pub config: &'a PipelineConfig,
    /// Operator-facing output: build stdout and the publish notice.
    pub console: &'a mut dyn Write,
    pub build_stdout: Option<String>,
    pub artifact: Option<ArtifactLocation>,
    pub published: Option<PathBuf>,
    pub sha256: Option<String>,
}

impl<'a> PipelineContext<'a> {
    pub fn new(root: &'a Path, config: &'a PipelineConfig, console: &'a mut dyn Write) -> Self {
        Self {
            root,
            config,
            console,
            build_stdout: None,
            artifact: None,
            published: None,
            sha256: None,
        }
    }

    fn into_report(self) -> PipelineReport {
        PipelineReport {
            artifact: self.artifact.map(|artifact| artifact.path),
            published: self.published,
            build_stdout: self.build_stdout.unwrap_or_default(),
            sha256: self.sha256,
        }
    }
}

pub trait Step {
    fn name(&self) -> &'static str;
    fn run(&self, ctx: &mut PipelineContext<'_>) -> Result<(), PipelineError>;
}

#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    /// Original location of the build artifact.
    pub artifact: Option<PathBuf>,
    pub published: Option<PathBuf>,
    pub build_stdout: String,
    pub sha256: Option<String>,
}

pub struct PipelineRunner {
    steps: Vec<Box<dyn Step>>,
    config: PipelineConfig,
    root: PathBuf,
    metrics: MetricsCollector,
}

impl PipelineRunner {
    pub fn new(config: PipelineConfig, root: impl Into<PathBuf>) -> Self {
        Self::with_steps(default_steps(), config, root)
    }

    pub fn with_steps(
        steps: Vec<Box<dyn Step>>,
        config: PipelineConfig,
        root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            steps,
            config,
            root: root.into(),
            metrics: MetricsCollector::new(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|step| step.name()).collect()
    }

    pub fn metrics(&self) -> MetricsCollector {
        self.metrics.clone()
    }

    /// Runs every step in order, stopping at the first failure. Nothing done
    /// by earlier steps is undone.
    #[instrument(skip_all, fields(root = %self.root.display()))]
    pub fn execute(&self, console: &mut dyn Write) -> Result<PipelineReport, PipelineError> {
        self.metrics.begin_run();
        let started = Instant::now();
        let mut ctx = PipelineContext::new(&self.root, &self.config, console);
        let outcome = self.run_steps(&mut ctx);
        self.metrics.record_total_duration(started.elapsed());
        outcome?;
        Ok(ctx.into_report())
    }

    fn run_steps(&self, ctx: &mut PipelineContext<'_>) -> Result<(), PipelineError> {
        for step in &self.steps {
            let span = tracing::span!(tracing::Level::DEBUG, "step", step = step.name());
            let _span_guard = span.enter();
            let _timer = self.metrics.start_step(step.name());
            if let Err(err) = step.run(ctx) {
                self.metrics.record_failure(step.name());
                warn!(origin = err.origin(), "Step failed; aborting pipeline");
                return Err(err);
            }
        }
        Ok(())
    }
}

/// Runs the default pipeline in the current directory, echoing to stdout.
pub fn run() -> Result<PipelineReport, PipelineError> {
    let root = env::current_dir().map_err(|source| PipelineError::Directory {
        path: PathBuf::from("."),
        source,
    })?;
    let runner = PipelineRunner::new(PipelineConfig::default(), root);
    let stdout = io::stdout();
    let mut console = stdout.lock();
    runner.execute(&mut console)
}

pub fn report_failure(err: &PipelineError, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "Error: {err}")?;
    if let Some(stderr) = err.stderr() {
        writeln!(out, "stderr: {stderr}")?;
    }
    out.flush()
}
