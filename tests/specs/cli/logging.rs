//! Logging specs

use crate::prelude::*;

#[test]
fn log_file_receives_structured_logs() {
    let project = Project::fast();

    project
        .flock()
        .args(&["--log-level", "info", "--log-file", "logs/flock.log"])
        .args(&["run", "--config", "flock.toml", "--users", "2"])
        .passes();

    let log = project.read("logs/flock.log");
    assert!(log.contains("run started"), "{}", log);
    assert!(log.contains("attempt succeeded"), "{}", log);
    assert!(log.contains("run finished"), "{}", log);
}

#[test]
fn default_filter_keeps_stderr_quiet() {
    let outcome = Project::fast().run(&["--users", "2"]).passes();

    assert!(!outcome.stderr().contains("INFO"), "{}", outcome.stderr());
}
