// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timeout scaling for degraded-network sessions
//!
//! Sessions routed through a slow intermediary get proportionally larger
//! budgets. Waits (element visibility, navigation) scale by three and
//! inter-action pauses scale by two.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Multiplier applied to visibility and navigation waits when degraded
pub const WAIT_SCALE: u32 = 3;
/// Multiplier applied to inter-action pauses when degraded
pub const PAUSE_SCALE: u32 = 2;

/// The kind of wait a duration budgets for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutClass {
    /// Waiting for an element to become visible
    Visibility,
    /// Waiting for a page navigation to settle
    Navigation,
    /// Deliberate pause between two actions
    Pause,
}

impl TimeoutClass {
    fn factor(self) -> u32 {
        match self {
            TimeoutClass::Visibility | TimeoutClass::Navigation => WAIT_SCALE,
            TimeoutClass::Pause => PAUSE_SCALE,
        }
    }
}

/// Scale `base` for the given class. Unchanged unless `degraded`.
pub fn scaled_duration(base: Duration, class: TimeoutClass, degraded: bool) -> Duration {
    if degraded {
        base.saturating_mul(class.factor())
    } else {
        base
    }
}

/// Per-session timeout policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeoutPolicy {
    pub degraded: bool,
}

impl TimeoutPolicy {
    pub fn new(degraded: bool) -> Self {
        Self { degraded }
    }

    pub fn visibility(&self, base: Duration) -> Duration {
        scaled_duration(base, TimeoutClass::Visibility, self.degraded)
    }

    pub fn navigation(&self, base: Duration) -> Duration {
        scaled_duration(base, TimeoutClass::Navigation, self.degraded)
    }

    pub fn pause(&self, base: Duration) -> Duration {
        scaled_duration(base, TimeoutClass::Pause, self.degraded)
    }
}

#[cfg(test)]
#[path = "timeout_tests.rs"]
mod tests;
