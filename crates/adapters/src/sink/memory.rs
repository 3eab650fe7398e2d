// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory sink for tests
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{AccountRecord, PersistenceSink, SinkError};
use async_trait::async_trait;
use flock_core::{AttemptSnapshot, RunSnapshot};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct MemoryState {
    accounts: Vec<AccountRecord>,
    attempts: Vec<AttemptSnapshot>,
    runs: Vec<RunSnapshot>,
    fail_writes: bool,
}

/// Records everything written, optionally failing every write
#[derive(Clone, Default)]
pub struct MemorySink {
    inner: Arc<Mutex<MemoryState>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose writes all fail
    pub fn failing() -> Self {
        let sink = Self::default();
        sink.lock().fail_writes = true;
        sink
    }

    pub fn accounts(&self) -> Vec<AccountRecord> {
        self.lock().accounts.clone()
    }

    pub fn attempts(&self) -> Vec<AttemptSnapshot> {
        self.lock().attempts.clone()
    }

    pub fn runs(&self) -> Vec<RunSnapshot> {
        self.lock().runs.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check(&self) -> Result<(), SinkError> {
        if self.lock().fail_writes {
            return Err(SinkError::Io(std::io::Error::other("sink unavailable")));
        }
        Ok(())
    }
}

#[async_trait]
impl PersistenceSink for MemorySink {
    async fn record_account(&self, account: &AccountRecord) -> Result<(), SinkError> {
        self.check()?;
        self.lock().accounts.push(account.clone());
        Ok(())
    }

    async fn record_attempt_outcome(&self, attempt: &AttemptSnapshot) -> Result<(), SinkError> {
        self.check()?;
        self.lock().attempts.push(attempt.clone());
        Ok(())
    }

    async fn record_run_snapshot(&self, run: &RunSnapshot) -> Result<(), SinkError> {
        self.check()?;
        self.lock().runs.push(run.clone());
        Ok(())
    }
}
