// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use clap::Parser;
use yare::parameterized;

#[derive(Parser)]
struct TestCli {
    #[command(flatten)]
    run: RunArgs,
}

fn parse(args: &[&str]) -> RunArgs {
    let argv = std::iter::once("flock-run").chain(args.iter().copied());
    TestCli::try_parse_from(argv).unwrap().run
}

#[test]
fn flags_override_run_defaults() {
    let mut config = FlockConfig::default();
    config.run.total_users = 2;
    config.run.concurrency = 1;

    let args = parse(&[
        "--users",
        "8",
        "--concurrency",
        "4",
        "--mode",
        "adaptive",
        "--degraded",
        "--label",
        "smoke",
    ]);
    let run = args.run_config(&config);

    assert_eq!(run.total_users, 8);
    assert_eq!(run.concurrency, 4);
    assert_eq!(run.mode, ScheduleMode::Adaptive);
    assert_eq!(run.label.as_deref(), Some("smoke"));
    assert!(run.params.degraded);
    assert!(!run.params.inject_select_failure);
}

#[test]
fn missing_flags_keep_config_values() {
    let mut config = FlockConfig::default();
    config.run.total_users = 3;
    config.run.mode = ScheduleMode::Adaptive;
    config.run.inject_select_failure = true;

    let run = parse(&[]).run_config(&config);

    assert_eq!(run.total_users, 3);
    assert_eq!(run.mode, ScheduleMode::Adaptive);
    assert!(run.params.inject_select_failure);
}

#[test]
fn latency_accepts_human_durations() {
    let args = parse(&["--latency", "15ms"]);

    assert_eq!(args.latency, Duration::from_millis(15));
}

#[parameterized(
    zero = { "0", true },
    half = { "0.5", true },
    one = { "1.0", true },
    negative = { "-0.1", false },
    above_one = { "1.5", false },
    not_a_number = { "often", false },
)]
fn failure_rate_must_be_a_probability(input: &str, ok: bool) {
    assert_eq!(parse_rate(input).is_ok(), ok);
}

#[tokio::test]
async fn watcher_that_drains_joins_cleanly() {
    let watcher = tokio::spawn(async {});

    assert!(join_watcher(watcher).await);
}

#[tokio::test]
async fn crashed_watcher_is_reported() {
    let watcher = tokio::spawn(async {
        panic!("watcher crashed");
    });

    assert!(!join_watcher(watcher).await);
}
