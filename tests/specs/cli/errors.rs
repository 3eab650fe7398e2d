//! Error reporting specs

use crate::prelude::*;

#[test]
fn unknown_command_fails() {
    Project::empty().flock().args(&["launch"]).fails();
}

#[test]
fn concurrency_above_limit_is_rejected() {
    Project::fast()
        .run(&["--concurrency", "11"])
        .fails()
        .stderr_has("Run could not be started")
        .stderr_has("between 1 and 10");
}

#[test]
fn zero_users_is_rejected() {
    Project::fast()
        .run(&["--users", "0"])
        .fails()
        .stderr_has("total users must be at least 1");
}

#[test]
fn missing_config_file_is_reported() {
    Project::empty()
        .flock()
        .args(&["run", "--config", "absent.toml"])
        .fails()
        .stderr_has("Config file 'absent.toml' not found");
}

#[test]
fn invalid_config_file_is_reported() {
    let project = Project::empty();
    project.file("flock.toml", "[run]\nconcurrency = 0\n");

    project
        .flock()
        .args(&["run", "--config", "flock.toml"])
        .fails()
        .stderr_has("Invalid configuration in 'flock.toml'")
        .stderr_has("flock config check flock.toml");
}

#[test]
fn failure_rate_must_be_a_probability() {
    Project::fast()
        .run(&["--failure-rate", "1.5"])
        .fails()
        .stderr_has("between 0.0 and 1.0");
}
