// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::Utc;
use flock_core::{
    Attempt, AttemptId, AttemptParams, AttemptResult, AttemptSpec, Run, RunConfig, RunId,
    ScheduleMode,
};
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn account(n: u32) -> AccountRecord {
    AccountRecord {
        run_id: RunId::new("run-1"),
        address: format!("user{}@mail.test", n),
        handle: format!("user{}", n),
        created_at: Utc::now(),
    }
}

fn read_lines(path: &Path) -> Vec<serde_json::Value> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[tokio::test]
async fn open_creates_missing_directory() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("nested/out");

    let sink = JsonlSink::open(&dir).await.unwrap();

    assert!(dir.is_dir());
    assert_eq!(sink.dir(), dir.as_path());
}

#[tokio::test]
async fn accounts_are_appended_one_per_line() {
    let tmp = TempDir::new().unwrap();
    let sink = JsonlSink::open(tmp.path()).await.unwrap();

    sink.record_account(&account(1)).await.unwrap();
    sink.record_account(&account(2)).await.unwrap();

    let lines = read_lines(&tmp.path().join(ACCOUNTS_FILE));
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["address"], "user1@mail.test");
    assert_eq!(lines[1]["handle"], "user2");
    assert_eq!(lines[1]["run_id"], "run-1");
}

#[tokio::test]
async fn concurrent_appends_do_not_interleave() {
    let tmp = TempDir::new().unwrap();
    let sink = JsonlSink::open(tmp.path()).await.unwrap();

    let mut handles = Vec::new();
    for n in 0..20 {
        let sink = sink.clone();
        handles.push(tokio::spawn(async move {
            sink.record_account(&account(n)).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let lines = read_lines(&tmp.path().join(ACCOUNTS_FILE));
    assert_eq!(lines.len(), 20);
}

#[tokio::test]
async fn attempt_and_run_records_go_to_separate_files() {
    let tmp = TempDir::new().unwrap();
    let sink = JsonlSink::open(tmp.path()).await.unwrap();

    let run_id = RunId::new("run-7");
    let spec = AttemptSpec {
        run_id: run_id.clone(),
        attempt_id: AttemptId::for_run(&run_id, 1),
        ordinal: 1,
        params: AttemptParams::default(),
        credits_per_success: 10,
    };
    let mut attempt = Attempt::new(&spec, Utc::now());
    attempt.complete(
        AttemptResult::infrastructure_failure("no session", Duration::from_millis(5)),
        Utc::now(),
        Instant::now(),
    );
    sink.record_attempt_outcome(&attempt.snapshot()).await.unwrap();

    let run = Run::new(run_id, RunConfig::new(2, 1, ScheduleMode::Adaptive), Utc::now());
    sink.record_run_snapshot(&run.snapshot(Instant::now())).await.unwrap();

    let attempts = read_lines(&tmp.path().join(ATTEMPTS_FILE));
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0]["status"], "failed");
    assert_eq!(attempts[0]["result"]["error"], "no session");

    let runs = read_lines(&tmp.path().join(RUNS_FILE));
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0]["id"], "run-7");
    assert_eq!(runs[0]["mode"], "adaptive");
    assert!(!tmp.path().join(ACCOUNTS_FILE).exists());
}
