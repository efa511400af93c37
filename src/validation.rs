use serde::Serialize;

use crate::config::PipelineConfig;

#[derive(Debug, Default, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

pub fn validate_config(config: &PipelineConfig) -> ValidationReport {
    let mut report = ValidationReport::default();

    if config.dist_dir.as_os_str().is_empty() {
        report
            .errors
            .push("Distribution directory cannot be empty".into());
    }

    if config.target_dir.as_os_str().is_empty() {
        report.errors.push("Target directory cannot be empty".into());
    }

    if config.profile.trim().is_empty() {
        report.errors.push("Build profile cannot be empty".into());
    }

    report.merge(validate_file_name("Publish name", &config.publish_name));
    if let Some(name) = &config.artifact_name {
        report.merge(validate_file_name("Artifact name", name));
    }

    report.merge(validate_build_command(config));

    report
}

fn validate_file_name(label: &str, name: &str) -> ValidationReport {
    let mut report = ValidationReport::default();
    if name.trim().is_empty() {
        report.errors.push(format!("{label} cannot be empty"));
    } else if name == "." || name == ".." {
        report
            .errors
            .push(format!("{label} '{name}' is not a file name"));
    } else if name.contains('/') || name.contains('\\') {
        report.errors.push(format!(
            "{label} '{name}' must be a plain file name without path separators"
        ));
    }
    report
}

fn validate_build_command(config: &PipelineConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    match config.build_command.first() {
        None => report
            .errors
            .push("Build command must contain at least a program".into()),
        Some(program) if program.trim().is_empty() => report
            .errors
            .push("Build command program cannot be empty".into()),
        Some(_) => {
            let is_cargo_build = config
                .build_command
                .iter()
                .take(2)
                .map(String::as_str)
                .eq(["cargo", "build"]);
            if is_cargo_build
                && config.profile == "release"
                && !config.build_command.iter().any(|arg| arg == "--release")
            {
                report.warnings.push(format!(
                    "Build command '{}' does not pass --release but artifacts are read from the release profile",
                    config.build_command_line()
                ));
            }
        }
    }
    report
}
