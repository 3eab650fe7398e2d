// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn explicit_missing_path_is_an_error() {
    let temp = tempdir().unwrap();
    let missing = temp.path().join("nope.toml");

    let err = load_config(Some(&missing)).unwrap_err();

    let err = err.downcast::<FlockError>().unwrap();
    assert!(err.message.contains("not found"));
}

#[test]
fn explicit_path_is_loaded_and_validated() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("flock.toml");
    fs::write(&path, "[run]\ntotal_users = 7\nconcurrency = 3\n").unwrap();

    let (config, source) = load_config(Some(&path)).unwrap();

    assert_eq!(config.run.total_users, 7);
    assert_eq!(config.run.concurrency, 3);
    assert_eq!(source, ConfigSource::File(path));
}

#[test]
fn invalid_file_reports_the_path() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("flock.toml");
    fs::write(&path, "[run]\nconcurrency = 50\n").unwrap();

    let err = load_config(Some(&path)).unwrap_err();

    let output = err.downcast::<FlockError>().unwrap().to_string();
    assert!(output.contains("Invalid configuration"));
    assert!(output.contains("flock.toml"));
}

#[test]
fn resolved_config_renders_as_toml() {
    let rendered = toml::to_string_pretty(&FlockConfig::default()).unwrap();

    let parsed = FlockConfig::parse(&rendered).unwrap();

    assert_eq!(parsed, FlockConfig::default());
}
