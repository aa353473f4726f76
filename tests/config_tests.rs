// SPDX-License-Identifier: MPL-2.0

//! Integration tests for configuration module

use photoshot::Config;
use photoshot::backends::camera::types::{CameraBackendType, CameraFacing, SessionPreset};
use photoshot::pipelines::photo::EncodingQuality;
use std::path::PathBuf;

#[test]
fn test_config_default() {
    let config = Config::default();

    assert!(
        config.high_resolution,
        "High resolution should be enabled by default"
    );
    assert_eq!(config.initial_facing, CameraFacing::Back);
    assert_eq!(config.session_preset, SessionPreset::Photo);
    assert!(config.library_dir.is_none());
}

#[test]
fn test_config_roundtrip_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/config.json");
    let config = Config {
        backend: CameraBackendType::Virtual,
        initial_facing: CameraFacing::Front,
        high_resolution: false,
        jpeg_quality: EncodingQuality::Maximum,
        library_dir: Some(PathBuf::from("/srv/photos")),
        ..Config::default()
    };

    config.save_to(&path).unwrap();
    assert_eq!(Config::load_from(&path), config);
}

#[test]
fn test_missing_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(
        Config::load_from(&dir.path().join("absent.json")),
        Config::default()
    );
}

#[test]
fn test_invalid_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert_eq!(Config::load_from(&path), Config::default());
}

#[test]
fn test_partial_file_fills_in_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "initial_facing": "front" }"#).unwrap();

    let config = Config::load_from(&path);
    assert_eq!(config.initial_facing, CameraFacing::Front);
    assert!(config.high_resolution);
    assert_eq!(config.backend, CameraBackendType::PipeWire);
}
