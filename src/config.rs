use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub const DEFAULT_DIST_DIR: &str = "dist";
pub const DEFAULT_PUBLISH_NAME: &str = "crypto-rs";
pub const DEFAULT_TARGET_DIR: &str = "target";
pub const DEFAULT_PROFILE: &str = "release";

/// How the expected artifact name is derived when no explicit name is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactSource {
    /// Base name of the project directory.
    DirName,
    /// First binary target of the root package reported by `cargo metadata`.
    CargoMetadata,
}

impl Default for ArtifactSource {
    fn default() -> Self {
        ArtifactSource::DirName
    }
}

/// What publishing does when the publish path is already occupied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OverwritePolicy {
    Overwrite,
    Reject,
}

impl Default for OverwritePolicy {
    fn default() -> Self {
        OverwritePolicy::Overwrite
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub dist_dir: PathBuf,
    pub publish_name: String,
    pub target_dir: PathBuf,
    pub profile: String,
    pub build_command: Vec<String>,
    pub artifact_name: Option<String>,
    pub artifact_source: ArtifactSource,
    pub on_existing: OverwritePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dist_dir: PathBuf::from(DEFAULT_DIST_DIR),
            publish_name: DEFAULT_PUBLISH_NAME.to_string(),
            target_dir: PathBuf::from(DEFAULT_TARGET_DIR),
            profile: DEFAULT_PROFILE.to_string(),
            build_command: default_build_command(),
            artifact_name: None,
            artifact_source: ArtifactSource::default(),
            on_existing: OverwritePolicy::default(),
        }
    }
}

fn default_build_command() -> Vec<String> {
    ["cargo", "build", "--release"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config YAML: {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: PipelineConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// `<dist_dir>/<publish_name>` relative to `root` unless `dist_dir` is absolute.
    pub fn publish_path(&self, root: &Path) -> PathBuf {
        root.join(&self.dist_dir).join(&self.publish_name)
    }

    pub fn dist_path(&self, root: &Path) -> PathBuf {
        root.join(&self.dist_dir)
    }

    /// The build command as typed on a shell, for log and error messages.
    pub fn build_command_line(&self) -> String {
        self.build_command.join(" ")
    }
}
