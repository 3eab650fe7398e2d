//! JSON-lines record specs

use crate::prelude::*;

#[test]
fn output_dir_receives_accounts_attempts_and_runs() {
    let project = Project::fast();

    project
        .run(&["--users", "3", "--output-dir", "records"])
        .passes()
        .stdout_has("Records:");

    let attempts = project.read("records/attempts.jsonl");
    assert_eq!(attempts.lines().count(), 3);
    let accounts = project.read("records/accounts.jsonl");
    assert_eq!(accounts.lines().count(), 3);

    let runs = project.read("records/runs.jsonl");
    let last: serde_json::Value = serde_json::from_str(runs.lines().last().unwrap()).unwrap();
    assert_eq!(last["status"], "completed");
    assert_eq!(last["counters"]["succeeded"], 3);
}

#[test]
fn attempt_records_carry_stage_reports() {
    let project = Project::fast();
    project
        .run(&["--users", "1", "--output-dir", "records"])
        .passes();

    let attempts = project.read("records/attempts.jsonl");
    let attempt: serde_json::Value = serde_json::from_str(attempts.trim()).unwrap();
    assert_eq!(attempt["status"], "success");
    let stages = attempt["result"]["stages"].as_array().unwrap();
    assert_eq!(stages.len(), 5);
    assert!(attempt["result"]["identity"]["address"].is_string());
}
