// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::events::tests::{attempt_started, run_event};
use crate::id::RunId;

#[tokio::test]
async fn publish_to_matching_subscribers() {
    let bus = EventBus::new();
    let mut rx = bus.subscribe(Subscription::new("runs", &["run:*"]));

    bus.publish(run_event("run-1"));

    let event = rx.try_recv().unwrap();
    assert!(matches!(event, Event::RunUpdated { run } if run.id.as_str() == "run-1"));
}

#[tokio::test]
async fn non_matching_events_not_delivered() {
    let bus = EventBus::new();
    let mut rx = bus.subscribe(Subscription::new("runs", &["run:*"]));

    bus.publish(attempt_started("run-1", 1));

    assert!(rx.try_recv().is_err());
}

#[test]
fn unsubscribe_removes_subscriber() {
    let bus = EventBus::new();
    let _rx = bus.subscribe(Subscription::all("test-sub"));
    assert_eq!(bus.subscriber_count(), 1);

    bus.unsubscribe(&SubscriberId("test-sub".to_string()));
    assert_eq!(bus.subscriber_count(), 0);
}

#[test]
fn dropped_receivers_are_pruned_on_publish() {
    let bus = EventBus::new();
    let rx = bus.subscribe(Subscription::all("gone"));
    let _kept = bus.subscribe(Subscription::all("kept"));
    drop(rx);

    bus.publish(run_event("run-1"));
    assert_eq!(bus.subscriber_count(), 1);
}

#[test]
fn clone_shares_state() {
    let bus1 = EventBus::new();
    let bus2 = bus1.clone();
    let _rx = bus1.subscribe(Subscription::all("test-sub"));

    assert_eq!(bus2.subscriber_count(), 1);
}

#[tokio::test]
async fn run_scoped_subscriber_only_sees_its_run() {
    let bus = EventBus::new();
    let mut rx = bus.subscribe(Subscription::all("run-1-only").for_run(RunId::new("run-1")));

    bus.publish(run_event("run-2"));
    bus.publish(attempt_started("run-1", 1));

    assert!(matches!(rx.try_recv().unwrap(), Event::AttemptStarted { .. }));
    assert!(rx.try_recv().is_err());
}
