//! Help and version specs

use crate::prelude::*;

#[test]
fn help_lists_commands() {
    Project::empty()
        .flock()
        .args(&["--help"])
        .passes()
        .stdout_has("run")
        .stdout_has("config");
}

#[test]
fn run_help_lists_scheduling_flags() {
    Project::empty()
        .flock()
        .args(&["run", "--help"])
        .passes()
        .stdout_has("--concurrency")
        .stdout_has("--mode")
        .stdout_has("adaptive");
}

#[test]
fn version_is_printed() {
    Project::empty()
        .flock()
        .args(&["--version"])
        .passes()
        .stdout_has("flock");
}
