// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[test]
fn empty_document_uses_defaults() {
    let config = FlockConfig::parse("").unwrap();
    assert_eq!(config, FlockConfig::default());
}

#[test]
fn durations_parse_as_human_strings() {
    let config = FlockConfig::parse(
        r#"
[timeouts]
visibility = "2s"
pause = "150ms"

[scheduler]
attempt_stagger = "0s"
"#,
    )
    .unwrap();
    assert_eq!(config.timeouts.visibility, Duration::from_secs(2));
    assert_eq!(config.timeouts.pause, Duration::from_millis(150));
    assert_eq!(config.timeouts.navigation, Duration::from_secs(30));
    assert_eq!(config.scheduler.attempt_stagger, Duration::ZERO);
}

#[test]
fn run_defaults_become_run_config() {
    let config = FlockConfig::parse(
        r#"
[run]
total_users = 5
concurrency = 2
mode = "adaptive"
proxy = "http://10.0.0.2:3128"
"#,
    )
    .unwrap();
    let run = config.run.to_run_config();
    assert_eq!(run.total_users, 5);
    assert_eq!(run.mode, ScheduleMode::Adaptive);
    assert!(run.params.is_degraded());
}

#[test]
fn invalid_concurrency_is_rejected() {
    let err = FlockConfig::parse("[run]\nconcurrency = 11\n").unwrap_err();
    assert!(matches!(err, ConfigError::Run(RunConfigError::Concurrency(11))));
}

#[test]
fn unknown_keys_are_rejected() {
    let err = FlockConfig::parse("[run]\nworkers = 3\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn fallback_must_live_on_target_domain() {
    let err = FlockConfig::parse(
        r#"
[target]
domain = "app.example.test"
fallback_artifact_url = "https://elsewhere.test/p/1"
"#,
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::Target(_)));
}

#[test]
fn load_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = FlockConfig::load(&dir.path().join("missing.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn load_reads_file_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flock.toml");
    std::fs::write(&path, "[inbox]\nmax_attempts = 4\n").unwrap();
    let config = FlockConfig::load(&path).unwrap();
    assert_eq!(config.inbox.max_attempts, 4);
}

#[parameterized(
    plain = { "https://app.example.test/x", Some("app.example.test") },
    port = { "http://app.example.test:8080/x", Some("app.example.test") },
    userinfo = { "https://u:p@app.example.test", Some("app.example.test") },
    query_only = { "https://app.example.test?x=1", Some("app.example.test") },
    not_http = { "ftp://app.example.test", None },
    empty_host = { "https:///path", None },
)]
fn url_host_extraction(url: &str, expected: Option<&str>) {
    assert_eq!(url_host(url), expected);
}

#[parameterized(
    exact = { "app.example.test", true },
    subdomain = { "mail.app.example.test", true },
    case = { "APP.Example.test", true },
    suffix_trick = { "evilapp.example.test", false },
    other = { "example.test", false },
)]
fn host_domain_matching(host: &str, expected: bool) {
    assert_eq!(host_on_domain(host, "app.example.test"), expected);
}
