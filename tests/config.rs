use std::path::{Path, PathBuf};

use distpipe::artifact::{resolve_artifact, working_directory_name};
use distpipe::config::{ArtifactSource, OverwritePolicy, PipelineConfig};
use distpipe::validation::validate_config;
use tempfile::tempdir;

#[test]
fn defaults_publish_to_dist_crypto_rs() {
    let config = PipelineConfig::default();
    let root = Path::new("/work/foo");

    assert_eq!(config.publish_path(root), PathBuf::from("/work/foo/dist/crypto-rs"));
    assert_eq!(config.build_command_line(), "cargo build --release");
    assert_eq!(config.artifact_source, ArtifactSource::DirName);
    assert_eq!(config.on_existing, OverwritePolicy::Overwrite);
    assert!(validate_config(&config).is_ok());
    assert!(validate_config(&config).warnings.is_empty());
}

#[test]
fn artifact_path_follows_directory_name() {
    let artifact = resolve_artifact(&PipelineConfig::default(), Path::new("/work/foo")).unwrap();
    assert_eq!(artifact.name, "foo");
    assert_eq!(
        artifact.path,
        PathBuf::from(format!(
            "/work/foo/target/release/foo{}",
            std::env::consts::EXE_SUFFIX
        ))
    );
}

#[test]
fn root_without_name_cannot_derive_artifact() {
    let err = working_directory_name(Path::new("/")).unwrap_err();
    assert_eq!(err.origin(), "publish");
}

#[test]
fn yaml_overrides_selected_fields() {
    let config = PipelineConfig::from_yaml(
        r#"
publish_name: crypto-cli
on_existing: reject
artifact_source: cargo-metadata
build_command: ["cargo", "build", "--release", "--locked"]
"#,
    )
    .unwrap();

    assert_eq!(config.publish_name, "crypto-cli");
    assert_eq!(config.on_existing, OverwritePolicy::Reject);
    assert_eq!(config.artifact_source, ArtifactSource::CargoMetadata);
    assert_eq!(config.build_command.len(), 4);
    assert_eq!(config.dist_dir, PathBuf::from("dist"));
    assert_eq!(config.profile, "release");
}

#[test]
fn empty_yaml_is_the_default_config() {
    assert_eq!(
        PipelineConfig::from_yaml("\n").unwrap(),
        PipelineConfig::default()
    );
}

#[test]
fn unknown_keys_are_rejected() {
    assert!(PipelineConfig::from_yaml("publish_path: dist/x\n").is_err());
}

#[test]
fn load_reports_missing_file() {
    let temp = tempdir().unwrap();
    let err = PipelineConfig::load(&temp.path().join("distpipe.yaml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test]
fn load_reads_yaml_file() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("distpipe.yaml");
    std::fs::write(&path, "dist_dir: out\n").unwrap();

    let config = PipelineConfig::load(&path).unwrap();
    assert_eq!(config.dist_dir, PathBuf::from("out"));
}

#[test]
fn publish_name_must_be_plain_file_name() {
    for name in ["", "..", "bin/crypto-rs", "bin\\crypto-rs"] {
        let config = PipelineConfig {
            publish_name: name.to_string(),
            ..PipelineConfig::default()
        };
        let report = validate_config(&config);
        assert!(!report.is_ok(), "publish name {name:?} should be rejected");
    }
}

#[test]
fn explicit_artifact_name_is_validated() {
    let config = PipelineConfig {
        artifact_name: Some("../escape".into()),
        ..PipelineConfig::default()
    };
    let report = validate_config(&config);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].starts_with("Artifact name"));
}

#[test]
fn empty_build_command_is_an_error() {
    let config = PipelineConfig {
        build_command: Vec::new(),
        ..PipelineConfig::default()
    };
    assert!(!validate_config(&config).is_ok());
}

#[test]
fn cargo_build_without_release_flag_warns() {
    let config = PipelineConfig {
        build_command: vec!["cargo".into(), "build".into()],
        ..PipelineConfig::default()
    };
    let report = validate_config(&config);
    assert!(report.is_ok());
    assert_eq!(report.warnings.len(), 1);
}
