// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! flock-core: data model for the flock session runner
//!
//! This crate provides:
//! - Run and attempt state with admission accounting for both scheduling modes
//! - Workflow stages and stage results
//! - Degraded-network timeout scaling
//! - Events, an event bus and pattern subscriptions
//! - TOML configuration

pub mod clock;
pub mod id;

pub mod attempt;
pub mod config;
pub mod event;
pub mod events;
pub mod run;
pub mod stage;
pub mod timeout;

pub use attempt::{
    Attempt, AttemptParams, AttemptResult, AttemptSnapshot, AttemptSpec, AttemptStatus,
    IdentityRecord,
};
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{ConfigError, FlockConfig};
pub use event::Event;
pub use events::{EventBus, EventPattern, EventReceiver, SubscriberId, Subscription};
pub use id::{AttemptId, IdGen, RunId, SequentialIdGen, UuidIdGen};
pub use run::{
    Run, RunConfig, RunConfigError, RunCounters, RunSnapshot, RunStatus, ScheduleMode,
    Settlement, TimelineEntry, TimelineKind, MAX_CONCURRENCY,
};
pub use stage::{Stage, StageResult};
pub use timeout::{scaled_duration, TimeoutClass, TimeoutPolicy};
