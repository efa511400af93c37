pub mod artifact;
pub mod config;
pub mod error;
pub mod observability;
pub mod pipeline;
pub mod security;
pub mod steps;
pub mod validation;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use pipeline::{PipelineReport, PipelineRunner, Step, report_failure, run};
