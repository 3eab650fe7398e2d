// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Attempt state: one simulated end-to-end session through the workflow

use crate::id::{AttemptId, RunId};
use crate::stage::{Stage, StageResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

/// Status of an attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    Running,
    Success,
    Failed,
    Cancelled,
}

impl AttemptStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AttemptStatus::Running)
    }
}

impl fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AttemptStatus::Running => "running",
            AttemptStatus::Success => "success",
            AttemptStatus::Failed => "failed",
            AttemptStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Per-attempt parameters shared by every attempt of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttemptParams {
    /// Route the session through this intermediary
    pub proxy: Option<String>,
    /// Force degraded-network timeout scaling even without a proxy
    pub degraded: bool,
    /// Mailbox domain for minted identities
    pub identity_domain: Option<String>,
    /// Fail artifact selection on purpose to exercise the recovery path
    pub inject_select_failure: bool,
}

impl AttemptParams {
    /// Degraded scaling applies when forced or when routed through a proxy
    pub fn is_degraded(&self) -> bool {
        self.degraded || self.proxy.is_some()
    }
}

/// Work descriptor handed to an attempt executor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptSpec {
    pub run_id: RunId,
    pub attempt_id: AttemptId,
    /// 1-based session ordinal within the run
    pub ordinal: u64,
    pub params: AttemptParams,
    pub credits_per_success: u64,
}

/// Identity used by an attempt (no secrets)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub address: String,
    pub handle: String,
}

/// Terminal outcome of an attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptResult {
    pub success: bool,
    pub credits_earned: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<Stage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub execution_time_ms: u64,
    #[serde(default)]
    pub stages: Vec<StageResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<IdentityRecord>,
    #[serde(default)]
    pub used_fallback: bool,
}

impl AttemptResult {
    /// Failure that happened outside any stage (session or identity could
    /// not be obtained, executor crashed)
    pub fn infrastructure_failure(error: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            success: false,
            credits_earned: 0,
            failed_stage: None,
            error: Some(error.into()),
            execution_time_ms: elapsed.as_millis() as u64,
            stages: Vec::new(),
            identity: None,
            used_fallback: false,
        }
    }

    /// Human-readable label of the stage that failed
    pub fn failed_stage_label(&self) -> &'static str {
        match (self.success, self.failed_stage) {
            (true, _) => "",
            (false, Some(stage)) => stage.label(),
            (false, None) => "Setup",
        }
    }
}

/// Live attempt record owned by the run registry
#[derive(Debug, Clone)]
pub struct Attempt {
    pub id: AttemptId,
    pub run_id: RunId,
    pub ordinal: u64,
    pub status: AttemptStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub result: Option<AttemptResult>,
    /// Monotonic settle time, drives eviction from the live registry
    pub settled_at: Option<Instant>,
}

impl Attempt {
    pub fn new(spec: &AttemptSpec, now: DateTime<Utc>) -> Self {
        Self {
            id: spec.attempt_id.clone(),
            run_id: spec.run_id.clone(),
            ordinal: spec.ordinal,
            status: AttemptStatus::Running,
            started_at: now,
            ended_at: None,
            result: None,
            settled_at: None,
        }
    }

    /// Record the terminal result. Returns false if already terminal.
    pub fn complete(&mut self, result: AttemptResult, now: DateTime<Utc>, at: Instant) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = if result.success {
            AttemptStatus::Success
        } else {
            AttemptStatus::Failed
        };
        self.result = Some(result);
        self.ended_at = Some(now);
        self.settled_at = Some(at);
        true
    }

    /// Force the attempt into Cancelled. Returns false if already terminal.
    pub fn cancel(&mut self, now: DateTime<Utc>, at: Instant) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = AttemptStatus::Cancelled;
        self.ended_at = Some(now);
        self.settled_at = Some(at);
        true
    }

    pub fn snapshot(&self) -> AttemptSnapshot {
        AttemptSnapshot {
            id: self.id.clone(),
            run_id: self.run_id.clone(),
            ordinal: self.ordinal,
            status: self.status,
            started_at: self.started_at,
            ended_at: self.ended_at,
            result: self.result.clone(),
        }
    }
}

/// Plain-data view of an attempt, safe to hand to external consumers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptSnapshot {
    pub id: AttemptId,
    pub run_id: RunId,
    pub ordinal: u64,
    pub status: AttemptStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<AttemptResult>,
}

impl fmt::Display for AttemptSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:<4} {:<10}", self.ordinal, self.status)?;
        if let Some(result) = &self.result {
            write!(f, " {:>6}ms", result.execution_time_ms)?;
            if !result.success {
                write!(f, "  {}", result.failed_stage_label())?;
                if let Some(error) = &result.error {
                    write!(f, ": {}", error)?;
                }
            } else if result.used_fallback {
                write!(f, "  (via fallback)")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "attempt_tests.rs"]
mod tests;
