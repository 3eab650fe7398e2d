//! Fixed-count run specs

use crate::prelude::*;

#[test]
fn healthy_fixed_run_makes_every_attempt() {
    Project::fast()
        .run(&["--users", "5", "--concurrency", "2"])
        .passes()
        .stdout_has("Status:     completed")
        .stdout_has("Attempted:  5")
        .stdout_has("Succeeded:  5")
        .stdout_has("Failed:     0")
        .stdout_has("Credits:    50")
        .stdout_lacks("Failures:");
}

#[test]
fn fixed_run_counts_attempts_not_successes() {
    let outcome = Project::fast()
        .run(&[
            "--users",
            "8",
            "--concurrency",
            "4",
            "--failure-rate",
            "1.0",
            "--seed",
            "3",
            "--format",
            "json",
        ])
        .passes();

    let json = outcome.stdout_json();
    let counters = &json["run"]["counters"];
    assert_eq!(json["run"]["status"], "completed");
    assert_eq!(counters["attempted"], 8);
    assert_eq!(
        counters["succeeded"].as_u64().unwrap() + counters["failed"].as_u64().unwrap(),
        8
    );
    assert!(json["run"]["peak_in_flight"].as_u64().unwrap() <= 4);
    assert_eq!(json["sessions"]["acquired"], json["sessions"]["released"]);
}

#[test]
fn injected_selection_failure_still_succeeds_through_recovery() {
    let outcome = Project::fast()
        .run(&["--users", "2", "--inject-select-failure", "--format", "json"])
        .passes();

    let json = outcome.stdout_json();
    assert_eq!(json["run"]["counters"]["succeeded"], 2);
}
