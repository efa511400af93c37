use std::env;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, ValueHint};
use distpipe::artifact::resolve_artifact;
use distpipe::config::{ArtifactSource, OverwritePolicy, PipelineConfig};
use distpipe::observability::log_snapshot;
use distpipe::pipeline::{PipelineRunner, report_failure};
use distpipe::validation::validate_config;
use serde_json::to_writer_pretty;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, prelude::*};

fn main() -> Result<()> {
    let cli = Cli::parse();
    configure_tracing()?;

    let root = env::current_dir().context("Failed to determine current directory")?;
    let config = resolve_config(&cli)?;

    let report = validate_config(&config);
    for warning in &report.warnings {
        warn!("{warning}");
    }
    if !report.is_ok() {
        for err in &report.errors {
            error!("{err}");
        }
        bail!(
            "Configuration is invalid ({} error(s)); nothing was run",
            report.errors.len()
        );
    }

    let runner = PipelineRunner::new(config, root);
    if cli.dry_run {
        describe_run(&runner);
        return Ok(());
    }

    let stdout = io::stdout();
    let outcome = runner.execute(&mut stdout.lock());
    match &outcome {
        Ok(report) => {
            if let Some(published) = &report.published {
                info!(published = %published.display(), "Pipeline completed");
            }
        }
        // Reported, not propagated: a failed pipeline does not change the exit code.
        Err(err) => report_failure(err, &mut io::stderr().lock())?,
    }

    emit_metrics(&runner, cli.print_metrics, cli.metrics_json.as_deref())
}

fn configure_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .try_init()
        .map_err(|err| anyhow!(err.to_string()))?;

    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };

    if let Some(name) = &cli.artifact_name {
        config.artifact_name = Some(name.clone());
    }
    if let Some(source) = cli.artifact_source {
        config.artifact_source = source;
    }
    if let Some(name) = &cli.publish_name {
        config.publish_name = name.clone();
    }
    if let Some(dir) = &cli.dist_dir {
        config.dist_dir = dir.clone();
    }
    if let Some(policy) = cli.on_existing {
        config.on_existing = policy;
    }

    Ok(config)
}

fn describe_run(runner: &PipelineRunner) {
    let config = runner.config();
    let root = runner.root();
    info!(
        steps = ?runner.step_names(),
        dist_dir = %config.dist_path(root).display(),
        command = %config.build_command_line(),
        publish = %config.publish_path(root).display(),
        "Dry run; no step executed"
    );
    match resolve_artifact(config, root) {
        Ok(artifact) => info!(artifact = %artifact.path.display(), "Expected build artifact"),
        Err(err) => warn!("Artifact path cannot be resolved yet: {err}"),
    }
}

fn emit_metrics(
    runner: &PipelineRunner,
    print_metrics: bool,
    metrics_json: Option<&Path>,
) -> Result<()> {
    if !print_metrics && metrics_json.is_none() {
        return Ok(());
    }

    let snapshot = runner.metrics().snapshot();
    if print_metrics {
        log_snapshot(&snapshot);
    }
    if let Some(path) = metrics_json {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create metrics directory: {}", parent.display())
            })?;
        }
        let file = File::create(path)
            .with_context(|| format!("Failed to create metrics file: {}", path.display()))?;
        to_writer_pretty(file, &snapshot)
            .with_context(|| format!("Failed to write metrics JSON: {}", path.display()))?;
        info!(metrics = %path.display(), "Metrics JSON written");
    }
    Ok(())
}

#[derive(Parser, Debug)]
#[command(
    name = "distpipe",
    author,
    version,
    about = "Build the release binary and publish it under dist/"
)]
struct Cli {
    /// YAML file overriding the built-in pipeline configuration.
    #[arg(long, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Name of the binary produced by the build, instead of deriving it.
    #[arg(long)]
    artifact_name: Option<String>,

    #[arg(long, value_enum)]
    artifact_source: Option<ArtifactSource>,

    /// File name of the published binary inside the dist directory.
    #[arg(long)]
    publish_name: Option<String>,

    #[arg(long, value_hint = ValueHint::DirPath)]
    dist_dir: Option<PathBuf>,

    /// Behaviour when the publish path already exists.
    #[arg(long, value_enum)]
    on_existing: Option<OverwritePolicy>,

    /// Validate the configuration and print the resolved paths only.
    #[arg(long)]
    dry_run: bool,

    /// Log step timings once the pipeline settles.
    #[arg(long)]
    print_metrics: bool,

    #[arg(long, value_hint = ValueHint::FilePath)]
    metrics_json: Option<PathBuf>,
}
