// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistence sinks for accounts, attempt outcomes and run snapshots

mod jsonl;
#[cfg(any(test, feature = "test-support"))]
mod memory;

pub use jsonl::JsonlSink;
#[cfg(any(test, feature = "test-support"))]
pub use memory::MemorySink;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flock_core::{AttemptSnapshot, RunId, RunSnapshot};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("sink serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// An account created by a successful enrollment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub run_id: RunId,
    pub address: String,
    pub handle: String,
    pub created_at: DateTime<Utc>,
}

/// Where run artifacts go. Failures are logged by callers, never fatal.
#[async_trait]
pub trait PersistenceSink: Clone + Send + Sync + 'static {
    async fn record_account(&self, account: &AccountRecord) -> Result<(), SinkError>;

    async fn record_attempt_outcome(&self, attempt: &AttemptSnapshot) -> Result<(), SinkError>;

    async fn record_run_snapshot(&self, run: &RunSnapshot) -> Result<(), SinkError>;
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSink;

#[async_trait]
impl PersistenceSink for NoOpSink {
    async fn record_account(&self, _account: &AccountRecord) -> Result<(), SinkError> {
        Ok(())
    }

    async fn record_attempt_outcome(&self, _attempt: &AttemptSnapshot) -> Result<(), SinkError> {
        Ok(())
    }

    async fn record_run_snapshot(&self, _run: &RunSnapshot) -> Result<(), SinkError> {
        Ok(())
    }
}
