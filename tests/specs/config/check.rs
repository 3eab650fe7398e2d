//! `flock config check` specs

use crate::prelude::*;

#[test]
fn valid_file_is_accepted_and_resolved() {
    Project::fast()
        .flock()
        .args(&["config", "check", "flock.toml"])
        .passes()
        .stdout_has("Configuration OK (flock.toml)")
        .stdout_has("[scheduler]")
        .stdout_has("attempt_stagger = \"0s\"");
}

#[test]
fn defaults_are_used_without_a_file() {
    Project::empty()
        .flock()
        .args(&["config", "check"])
        .passes()
        .stdout_has("Configuration OK (built-in defaults)");
}

#[test]
fn json_output_carries_the_config() {
    let project = Project::fast();
    let outcome = project
        .flock()
        .args(&["config", "check", "flock.toml", "--format", "json"])
        .passes();

    let json = outcome.stdout_json();
    assert_eq!(json["source"], "flock.toml");
    assert_eq!(json["config"]["inbox"]["max_attempts"], 2);
    assert_eq!(json["config"]["run"]["mode"], "fixed");
}

#[test]
fn fallback_artifact_off_the_target_domain_is_rejected() {
    let project = Project::empty();
    project.file(
        "flock.toml",
        "[target]\ndomain = \"app.example.test\"\nfallback_artifact_url = \"https://elsewhere.test/p/1\"\n",
    );

    project
        .flock()
        .args(&["config", "check", "flock.toml"])
        .fails()
        .stderr_has("is not on app.example.test");
}

#[test]
fn unknown_keys_are_rejected() {
    let project = Project::empty();
    project.file("flock.toml", "[run]\nworkers = 3\n");

    project
        .flock()
        .args(&["config", "check", "flock.toml"])
        .fails()
        .stderr_has("unknown field");
}
