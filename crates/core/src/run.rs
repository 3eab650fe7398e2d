// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run state machine and admission accounting
//!
//! A run owns the counters and the dynamic target shared by all of its
//! attempts. Every mutation goes through the methods here, called from a
//! single settlement path, so target math never sees a stale success count.

use crate::attempt::AttemptParams;
use crate::id::{AttemptId, RunId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use thiserror::Error;

/// Upper bound on per-run concurrency
pub const MAX_CONCURRENCY: u32 = 10;

/// Default credits accrued per successful attempt
pub const DEFAULT_CREDITS_PER_SUCCESS: u64 = 10;

/// Scheduling algorithm for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleMode {
    /// Make exactly `total_users` attempts
    #[default]
    Fixed,
    /// Keep attempting, growing the target on failure, until `total_users`
    /// attempts have succeeded
    Adaptive,
}

impl fmt::Display for ScheduleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleMode::Fixed => f.write_str("fixed"),
            ScheduleMode::Adaptive => f.write_str("adaptive"),
        }
    }
}

impl std::str::FromStr for ScheduleMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fixed" => Ok(ScheduleMode::Fixed),
            "adaptive" => Ok(ScheduleMode::Adaptive),
            other => Err(format!("unknown schedule mode: {}", other)),
        }
    }
}

/// Lifecycle status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Running,
    /// No new attempts are admitted; in-flight attempts are draining
    Finalizing,
    Completed,
    Cancelled,
    Failed,
}

impl RunStatus {
    /// Running or Finalizing. At most one run may be active process-wide.
    pub fn is_active(&self) -> bool {
        matches!(self, RunStatus::Running | RunStatus::Finalizing)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Cancelled | RunStatus::Failed
        )
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStatus::Pending => "pending",
            RunStatus::Running => "running",
            RunStatus::Finalizing => "finalizing",
            RunStatus::Completed => "completed",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Invalid run configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunConfigError {
    #[error("concurrency must be between 1 and {MAX_CONCURRENCY}, got {0}")]
    Concurrency(u32),
    #[error("total users must be at least 1")]
    TotalUsers,
}

/// Configuration of a run, fixed at creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Success goal (fixed mode: number of attempts)
    pub total_users: u32,
    /// Worker budget size
    pub concurrency: u32,
    #[serde(default)]
    pub mode: ScheduleMode,
    #[serde(default)]
    pub params: AttemptParams,
    #[serde(default = "default_credits")]
    pub credits_per_success: u64,
}

fn default_credits() -> u64 {
    DEFAULT_CREDITS_PER_SUCCESS
}

impl RunConfig {
    pub fn new(total_users: u32, concurrency: u32, mode: ScheduleMode) -> Self {
        Self {
            label: None,
            total_users,
            concurrency,
            mode,
            params: AttemptParams::default(),
            credits_per_success: DEFAULT_CREDITS_PER_SUCCESS,
        }
    }

    pub fn validate(&self) -> Result<(), RunConfigError> {
        if !(1..=MAX_CONCURRENCY).contains(&self.concurrency) {
            return Err(RunConfigError::Concurrency(self.concurrency));
        }
        if self.total_users < 1 {
            return Err(RunConfigError::TotalUsers);
        }
        Ok(())
    }
}

/// Run counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounters {
    pub attempted: u32,
    pub succeeded: u32,
    pub failed: u32,
    /// Attempts forcibly cancelled before settling
    #[serde(default)]
    pub cancelled: u32,
    pub credits: u64,
}

impl RunCounters {
    pub fn settled(&self) -> u32 {
        self.succeeded + self.failed + self.cancelled
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineKind {
    Success,
    Failure,
}

/// One settlement on the run timeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub kind: TimelineKind,
    /// Milliseconds since the run started
    pub at_ms: u64,
    pub attempt_id: AttemptId,
}

/// Effect of a settlement on the run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Settlement {
    /// The success goal was met by this settlement
    pub goal_reached: bool,
    /// The adaptive target grew by one
    pub target_grew: bool,
}

/// Invalid run status transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot {action} run in status {status}")]
pub struct TransitionError {
    pub action: &'static str,
    pub status: RunStatus,
}

/// A batch of attempts sharing a target and a concurrency limit
#[derive(Debug, Clone)]
pub struct Run {
    pub id: RunId,
    pub config: RunConfig,
    pub status: RunStatus,
    pub counters: RunCounters,
    /// Number of attempts the run is prepared to make
    pub target: u32,
    pub timeline: Vec<TimelineEntry>,
    pub cancelled: bool,
    pub in_flight: u32,
    pub peak_in_flight: u32,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    started: Option<Instant>,
    finished: Option<Instant>,
}

impl Run {
    pub fn new(id: RunId, config: RunConfig, now: DateTime<Utc>) -> Self {
        Self {
            id,
            target: config.total_users,
            config,
            status: RunStatus::Pending,
            counters: RunCounters::default(),
            timeline: Vec::new(),
            cancelled: false,
            in_flight: 0,
            peak_in_flight: 0,
            error: None,
            created_at: now,
            started_at: None,
            finished_at: None,
            started: None,
            finished: None,
        }
    }

    /// Pending -> Running
    pub fn start(&mut self, at: Instant, now: DateTime<Utc>) -> Result<(), TransitionError> {
        if self.status != RunStatus::Pending {
            return Err(TransitionError {
                action: "start",
                status: self.status,
            });
        }
        self.status = RunStatus::Running;
        self.started = Some(at);
        self.started_at = Some(now);
        Ok(())
    }

    /// Request a cooperative stop. Returns true if anything changed.
    ///
    /// Pending runs are cancelled outright; running runs move to Finalizing
    /// and drain. Terminal runs are left untouched.
    pub fn request_stop(&mut self, at: Instant, now: DateTime<Utc>) -> bool {
        match self.status {
            RunStatus::Pending => {
                self.cancelled = true;
                self.finish(RunStatus::Cancelled, at, now);
                true
            }
            RunStatus::Running => {
                self.cancelled = true;
                self.status = RunStatus::Finalizing;
                true
            }
            RunStatus::Finalizing => {
                let changed = !self.cancelled;
                self.cancelled = true;
                changed
            }
            RunStatus::Completed | RunStatus::Cancelled | RunStatus::Failed => false,
        }
    }

    /// Move to a terminal status
    pub fn finish(&mut self, status: RunStatus, at: Instant, now: DateTime<Utc>) {
        if self.status.is_terminal() {
            return;
        }
        self.status = status;
        self.finished = Some(at);
        self.finished_at = Some(now);
    }

    /// Whether the success goal has been met
    pub fn goal_reached(&self) -> bool {
        self.counters.succeeded >= self.config.total_users
    }

    /// Attempts that may still be admitted under the current target
    pub fn remaining(&self) -> u32 {
        match self.config.mode {
            ScheduleMode::Fixed => self.config.total_users.saturating_sub(self.counters.attempted),
            ScheduleMode::Adaptive => self.target.saturating_sub(self.counters.attempted),
        }
    }

    /// Whether the admission loop may admit another attempt right now
    pub fn admission_open(&self) -> bool {
        self.status == RunStatus::Running
            && !self.cancelled
            && !self.goal_reached()
            && self.remaining() > 0
    }

    /// Account for a newly admitted attempt. Returns its 1-based ordinal.
    pub fn record_admission(&mut self) -> u64 {
        self.counters.attempted += 1;
        self.in_flight += 1;
        self.peak_in_flight = self.peak_in_flight.max(self.in_flight);
        u64::from(self.counters.attempted)
    }

    pub fn record_success(&mut self, attempt_id: AttemptId, credits: u64, at: Instant) -> Settlement {
        let was_reached = self.goal_reached();
        self.in_flight = self.in_flight.saturating_sub(1);
        self.counters.succeeded += 1;
        self.counters.credits += credits;
        self.push_timeline(TimelineKind::Success, attempt_id, at);

        let goal_reached = !was_reached && self.goal_reached();
        if goal_reached && self.status == RunStatus::Running {
            // Early stop: drain in-flight attempts, admit nothing new
            self.status = RunStatus::Finalizing;
        }
        Settlement {
            goal_reached,
            target_grew: false,
        }
    }

    pub fn record_failure(&mut self, attempt_id: AttemptId, at: Instant) -> Settlement {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.counters.failed += 1;
        self.push_timeline(TimelineKind::Failure, attempt_id, at);

        // The goal gate is evaluated here, at settlement, not at loop entry
        let target_grew = if self.config.mode == ScheduleMode::Adaptive && !self.goal_reached() {
            // Clamp: admissions still possible plus attempts in flight never
            // exceed the successes still required
            let before = self.target;
            let needed = self.config.total_users - self.counters.succeeded;
            let ceiling = (self.counters.attempted - self.in_flight) + needed;
            self.target = (self.target + 1).min(ceiling);
            self.target > before
        } else {
            false
        };
        Settlement {
            goal_reached: false,
            target_grew,
        }
    }

    /// Account for an attempt forcibly cancelled before it settled
    pub fn record_cancelled(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.counters.cancelled += 1;
    }

    fn push_timeline(&mut self, kind: TimelineKind, attempt_id: AttemptId, at: Instant) {
        self.timeline.push(TimelineEntry {
            kind,
            at_ms: self.elapsed_ms(at),
            attempt_id,
        });
    }

    /// Milliseconds since start, frozen once finished
    pub fn elapsed_ms(&self, now: Instant) -> u64 {
        let Some(started) = self.started else {
            return 0;
        };
        let end = self.finished.unwrap_or(now);
        end.saturating_duration_since(started).as_millis() as u64
    }

    pub fn snapshot(&self, now: Instant) -> RunSnapshot {
        let settled = self.counters.succeeded + self.counters.failed;
        let success_rate = if settled == 0 {
            0.0
        } else {
            f64::from(self.counters.succeeded) / f64::from(settled)
        };
        RunSnapshot {
            id: self.id.clone(),
            label: self.config.label.clone(),
            mode: self.config.mode,
            status: self.status,
            total_users: self.config.total_users,
            concurrency: self.config.concurrency,
            target: self.target,
            counters: self.counters,
            in_flight: self.in_flight,
            peak_in_flight: self.peak_in_flight,
            cancelled: self.cancelled,
            elapsed_ms: self.elapsed_ms(now),
            success_rate,
            created_at: self.created_at,
            started_at: self.started_at,
            finished_at: self.finished_at,
            timeline: self.timeline.clone(),
            error: self.error.clone(),
        }
    }
}

/// Plain-data view of a run, safe to hand to external consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSnapshot {
    pub id: RunId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub mode: ScheduleMode,
    pub status: RunStatus,
    pub total_users: u32,
    pub concurrency: u32,
    pub target: u32,
    #[serde(flatten)]
    pub counters: RunCounters,
    pub in_flight: u32,
    pub peak_in_flight: u32,
    pub cancelled: bool,
    pub elapsed_ms: u64,
    pub success_rate: f64,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub timeline: Vec<TimelineEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl fmt::Display for RunSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Run:        {}", self.id)?;
        if let Some(label) = &self.label {
            writeln!(f, "Label:      {}", label)?;
        }
        writeln!(f, "Status:     {}", self.status)?;
        writeln!(f, "Mode:       {}", self.mode)?;
        writeln!(
            f,
            "Target:     {} (goal {}, concurrency {})",
            self.target, self.total_users, self.concurrency
        )?;
        writeln!(f, "Attempted:  {}", self.counters.attempted)?;
        writeln!(f, "Succeeded:  {}", self.counters.succeeded)?;
        writeln!(f, "Failed:     {}", self.counters.failed)?;
        if self.counters.cancelled > 0 {
            writeln!(f, "Cancelled:  {}", self.counters.cancelled)?;
        }
        writeln!(f, "Credits:    {}", self.counters.credits)?;
        writeln!(f, "Success:    {:.1}%", self.success_rate * 100.0)?;
        write!(f, "Elapsed:    {}ms", self.elapsed_ms)
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
