//! `--watch` specs

use crate::prelude::*;

#[test]
fn watch_prints_settled_attempts_to_stderr() {
    let outcome = Project::fast()
        .run(&["--users", "2", "--watch"])
        .passes()
        .stderr_has("success")
        .stderr_has("goal reached: 2/2 succeeded");

    assert_eq!(outcome.stderr().matches("#").count(), 2);
}

#[test]
fn watch_in_json_emits_event_lines() {
    let outcome = Project::fast()
        .run(&["--users", "1", "--watch", "--format", "json"])
        .passes()
        .stderr_has("\"type\":\"attempt:completed\"")
        .stderr_has("\"type\":\"run:target_reached\"");

    // stdout stays a single JSON document
    assert_eq!(outcome.stdout_json()["run"]["counters"]["succeeded"], 1);
}
