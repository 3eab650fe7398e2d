// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn spec() -> AttemptSpec {
    let run_id = RunId::new("run-1");
    AttemptSpec {
        attempt_id: AttemptId::for_run(&run_id, 1),
        run_id,
        ordinal: 1,
        params: AttemptParams::default(),
        credits_per_success: 10,
    }
}

fn success() -> AttemptResult {
    AttemptResult {
        success: true,
        credits_earned: 10,
        failed_stage: None,
        error: None,
        execution_time_ms: 1200,
        stages: vec![],
        identity: None,
        used_fallback: false,
    }
}

#[test]
fn complete_sets_status_from_result() {
    let mut attempt = Attempt::new(&spec(), Utc::now());
    assert_eq!(attempt.status, AttemptStatus::Running);

    assert!(attempt.complete(success(), Utc::now(), Instant::now()));
    assert_eq!(attempt.status, AttemptStatus::Success);
    assert!(attempt.ended_at.is_some());
    assert!(attempt.settled_at.is_some());
}

#[test]
fn terminal_attempt_ignores_later_updates() {
    let mut attempt = Attempt::new(&spec(), Utc::now());
    assert!(attempt.cancel(Utc::now(), Instant::now()));

    assert!(!attempt.complete(success(), Utc::now(), Instant::now()));
    assert_eq!(attempt.status, AttemptStatus::Cancelled);
    assert!(attempt.result.is_none());
}

#[test]
fn proxy_implies_degraded() {
    let params = AttemptParams {
        proxy: Some("http://10.0.0.1:8080".to_string()),
        ..Default::default()
    };
    assert!(params.is_degraded());
    assert!(!AttemptParams::default().is_degraded());
}

#[test]
fn failed_stage_label_is_human_readable() {
    let mut result = AttemptResult::infrastructure_failure("no session", Duration::ZERO);
    assert_eq!(result.failed_stage_label(), "Setup");

    result.failed_stage = Some(Stage::Publish);
    assert_eq!(result.failed_stage_label(), "Publish");

    assert_eq!(success().failed_stage_label(), "");
}

#[test]
fn snapshot_display_shows_failure_reason() {
    let mut attempt = Attempt::new(&spec(), Utc::now());
    let mut result = AttemptResult::infrastructure_failure("boom", Duration::from_millis(5));
    result.failed_stage = Some(Stage::Enroll);
    attempt.complete(result, Utc::now(), Instant::now());

    let line = attempt.snapshot().to_string();
    assert!(line.contains("failed"));
    assert!(line.contains("Account creation: boom"));
}
