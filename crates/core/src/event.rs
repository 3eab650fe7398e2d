// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events published by the orchestrator
//!
//! Every event carries a plain-data snapshot, never a live reference into
//! orchestrator state.

use crate::attempt::AttemptSnapshot;
use crate::id::RunId;
use crate::run::RunSnapshot;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "run:created")]
    RunCreated { run: RunSnapshot },

    #[serde(rename = "run:started")]
    RunStarted { run: RunSnapshot },

    /// Counters, status or live metrics changed
    #[serde(rename = "run:updated")]
    RunUpdated { run: RunSnapshot },

    /// The run reached a terminal status
    #[serde(rename = "run:completed")]
    RunCompleted { run: RunSnapshot },

    /// The success goal was met; in-flight attempts are draining
    #[serde(rename = "run:target_reached")]
    RunTargetReached { run: RunSnapshot },

    #[serde(rename = "attempt:started")]
    AttemptStarted { attempt: AttemptSnapshot },

    #[serde(rename = "attempt:completed")]
    AttemptCompleted { attempt: AttemptSnapshot },
}

impl Event {
    /// Event name used for subscription pattern matching
    pub fn name(&self) -> &'static str {
        match self {
            Event::RunCreated { .. } => "run:created",
            Event::RunStarted { .. } => "run:started",
            Event::RunUpdated { .. } => "run:updated",
            Event::RunCompleted { .. } => "run:completed",
            Event::RunTargetReached { .. } => "run:target_reached",
            Event::AttemptStarted { .. } => "attempt:started",
            Event::AttemptCompleted { .. } => "attempt:completed",
        }
    }

    /// The run this event belongs to
    pub fn run_id(&self) -> &RunId {
        match self {
            Event::RunCreated { run }
            | Event::RunStarted { run }
            | Event::RunUpdated { run }
            | Event::RunCompleted { run }
            | Event::RunTargetReached { run } => &run.id,
            Event::AttemptStarted { attempt } | Event::AttemptCompleted { attempt } => {
                &attempt.run_id
            }
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
