//! Adaptive run specs

use crate::prelude::*;

#[test]
fn adaptive_run_meets_the_goal_exactly() {
    let outcome = Project::fast()
        .run(&[
            "--users",
            "4",
            "--concurrency",
            "3",
            "--mode",
            "adaptive",
            "--failure-rate",
            "0.5",
            "--seed",
            "11",
            "--format",
            "json",
        ])
        .passes();

    let json = outcome.stdout_json();
    let run = &json["run"];
    let counters = &run["counters"];
    assert_eq!(run["status"], "completed");
    assert_eq!(run["mode"], "adaptive");
    assert_eq!(counters["succeeded"], 4);
    let failed = counters["failed"].as_u64().unwrap();
    assert_eq!(counters["attempted"].as_u64().unwrap(), 4 + failed);
    assert!(run["target"].as_u64().unwrap() >= 4);
}

#[test]
fn adaptive_run_without_failures_keeps_its_target() {
    let outcome = Project::fast()
        .run(&["--users", "3", "--mode", "adaptive", "--format", "json"])
        .passes();

    let json = outcome.stdout_json();
    assert_eq!(json["run"]["target"], 3);
    assert_eq!(json["run"]["counters"]["attempted"], 3);
}
