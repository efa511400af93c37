use std::env::consts::EXE_SUFFIX;
use std::path::{Path, PathBuf};

use cargo_metadata::MetadataCommand;

use crate::config::{ArtifactSource, PipelineConfig};
use crate::error::PipelineError;

/// Where the release build is expected to leave its binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLocation {
    pub name: String,
    pub path: PathBuf,
}

pub fn resolve_artifact(config: &PipelineConfig, root: &Path) -> Result<ArtifactLocation, PipelineError> {
    if let Some(name) = &config.artifact_name {
        return Ok(locate(root.join(&config.target_dir), &config.profile, name));
    }

    match config.artifact_source {
        ArtifactSource::DirName => {
            let name = working_directory_name(root)?;
            Ok(locate(root.join(&config.target_dir), &config.profile, &name))
        }
        ArtifactSource::CargoMetadata => {
            let (name, target_dir) = metadata_binary(root)?;
            Ok(locate(target_dir, &config.profile, &name))
        }
    }
}

pub fn working_directory_name(root: &Path) -> Result<String, PipelineError> {
    root.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .ok_or_else(|| {
            PipelineError::publish(format!(
                "Cannot derive artifact name: '{}' has no directory name",
                root.display()
            ))
        })
}

fn locate(target_dir: PathBuf, profile: &str, name: &str) -> ArtifactLocation {
    ArtifactLocation {
        name: name.to_string(),
        path: target_dir.join(profile).join(format!("{name}{EXE_SUFFIX}")),
    }
}

fn metadata_binary(root: &Path) -> Result<(String, PathBuf), PipelineError> {
    let metadata = MetadataCommand::new()
        .current_dir(root)
        .no_deps()
        .exec()
        .map_err(|err| PipelineError::publish(format!("Failed to fetch cargo metadata: {err}")))?;

    let package = metadata.root_package().ok_or_else(|| {
        PipelineError::publish(format!(
            "No root package found in cargo metadata for {}",
            root.display()
        ))
    })?;

    let target = package
        .targets
        .iter()
        .find(|target| target.kind.iter().any(|kind| kind == "bin"))
        .ok_or_else(|| {
            PipelineError::publish(format!(
                "Package '{}' has no binary target to publish",
                package.name
            ))
        })?;

    tracing::debug!(
        package = package.name.as_str(),
        binary = target.name.as_str(),
        "Resolved artifact from cargo metadata"
    );

    Ok((
        target.name.clone(),
        metadata.target_directory.clone().into_std_path_buf(),
    ))
}
