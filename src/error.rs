use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure of one pipeline step, tagged by where it originated.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to create output directory {}: {source}", .path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{message}")]
    Build {
        message: String,
        stderr: Option<String>,
    },
    #[error("{message}")]
    Publish {
        message: String,
        stderr: Option<String>,
    },
}

impl PipelineError {
    pub fn build(message: impl Into<String>) -> Self {
        PipelineError::Build {
            message: message.into(),
            stderr: None,
        }
    }

    pub fn publish(message: impl Into<String>) -> Self {
        PipelineError::Publish {
            message: message.into(),
            stderr: None,
        }
    }

    /// Captured error stream of the external command, if the failure came from one.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            PipelineError::Directory { .. } => None,
            PipelineError::Build { stderr, .. } | PipelineError::Publish { stderr, .. } => stderr
                .as_deref()
                .filter(|text| !text.trim().is_empty()),
        }
    }

    pub fn origin(&self) -> &'static str {
        match self {
            PipelineError::Directory { .. } => "directory",
            PipelineError::Build { .. } => "build",
            PipelineError::Publish { .. } => "publish",
        }
    }
}
