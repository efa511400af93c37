use std::fs;
use std::io;
use std::path::Path;
use std::process::Command;

use tracing::{debug, info, warn};

use crate::artifact::resolve_artifact;
use crate::config::OverwritePolicy;
use crate::error::PipelineError;
use crate::pipeline::{PipelineContext, Step};
use crate::security::artifact_digest;

pub fn default_steps() -> Vec<Box<dyn Step>> {
    vec![
        Box::new(EnsureDistDir),
        Box::new(ReleaseBuild),
        Box::new(PublishArtifact),
    ]
}

/// Creates the distribution directory and any missing parents.
pub struct EnsureDistDir;

impl Step for EnsureDistDir {
    fn name(&self) -> &'static str {
        "ensure_dist_dir"
    }

    fn run(&self, ctx: &mut PipelineContext<'_>) -> Result<(), PipelineError> {
        let path = ctx.config.dist_path(ctx.root);
        fs::create_dir_all(&path).map_err(|source| PipelineError::Directory {
            path: ctx.config.dist_dir.clone(),
            source,
        })?;
        debug!(dir = %path.display(), "Output directory ready");
        Ok(())
    }
}

/// Runs the configured build command without a shell.
pub struct ReleaseBuild;

impl Step for ReleaseBuild {
    fn name(&self) -> &'static str {
        "release_build"
    }

    fn run(&self, ctx: &mut PipelineContext<'_>) -> Result<(), PipelineError> {
        let command_line = ctx.config.build_command_line();
        let (program, args) = ctx
            .config
            .build_command
            .split_first()
            .ok_or_else(|| PipelineError::build("Build command is empty"))?;

        info!(command = %command_line, "Running release build");
        let output = Command::new(program)
            .args(args)
            .current_dir(ctx.root)
            .output()
            .map_err(|err| PipelineError::build(format!("Failed to run `{command_line}`: {err}")))?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(PipelineError::Build {
                message: format!("Command failed: {command_line} ({})", output.status),
                stderr: Some(stderr),
            });
        }

        if !stderr.trim().is_empty() {
            debug!(stderr = stderr.trim_end(), "Build diagnostics");
        }

        ctx.console
            .write_all(&output.stdout)
            .and_then(|()| ctx.console.write_all(b"\n"))
            .and_then(|()| ctx.console.flush())
            .map_err(|err| PipelineError::build(format!("Failed to echo build output: {err}")))?;
        ctx.build_stdout = Some(stdout);
        Ok(())
    }
}

/// Moves the build artifact to the publish path.
pub struct PublishArtifact;

impl Step for PublishArtifact {
    fn name(&self) -> &'static str {
        "publish_artifact"
    }

    fn run(&self, ctx: &mut PipelineContext<'_>) -> Result<(), PipelineError> {
        let artifact = resolve_artifact(ctx.config, ctx.root)?;
        let destination = ctx.config.publish_path(ctx.root);
        let shown = ctx.config.dist_dir.join(&ctx.config.publish_name);

        // Checked ahead of the rename, not atomically with it.
        if ctx.config.on_existing == OverwritePolicy::Reject
            && fs::symlink_metadata(&destination).is_ok()
        {
            return Err(PipelineError::publish(format!(
                "Publish path {} already exists and on_existing is 'reject'",
                shown.display()
            )));
        }

        move_file(&artifact.path, &destination).map_err(|err| {
            let hint = if err.kind() == io::ErrorKind::NotFound {
                format!(" (expected a binary named '{}')", artifact.name)
            } else {
                String::new()
            };
            PipelineError::publish(format!(
                "Failed to move {} to {}: {err}{hint}",
                artifact.path.display(),
                shown.display()
            ))
        })?;

        let digest = match artifact_digest(&destination) {
            Ok(digest) => Some(digest),
            Err(err) => {
                warn!("Published artifact could not be hashed: {err:#}");
                None
            }
        };
        info!(
            artifact = %artifact.path.display(),
            published = %destination.display(),
            sha256 = digest.as_deref().unwrap_or("unavailable"),
            "Artifact published"
        );

        writeln!(ctx.console, "Moved binary to {}", shown.display()).map_err(|err| {
            PipelineError::publish(format!("Failed to report published artifact: {err}"))
        })?;

        ctx.published = Some(destination);
        ctx.artifact = Some(artifact);
        ctx.sha256 = digest;
        Ok(())
    }
}

/// `rename`, falling back to copy-then-remove across filesystems.
fn move_file(source: &Path, destination: &Path) -> io::Result<()> {
    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::CrossesDevices => {
            debug!("Rename crosses devices, copying instead");
            fs::copy(source, destination)?;
            fs::remove_file(source)
        }
        Err(err) => Err(err),
    }
}
