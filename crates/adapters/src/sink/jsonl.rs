// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON-lines sink writing one file per record kind

use super::{AccountRecord, PersistenceSink, SinkError};
use async_trait::async_trait;
use flock_core::{AttemptSnapshot, RunSnapshot};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

pub const ACCOUNTS_FILE: &str = "accounts.jsonl";
pub const ATTEMPTS_FILE: &str = "attempts.jsonl";
pub const RUNS_FILE: &str = "runs.jsonl";

/// Appends records to `accounts.jsonl`, `attempts.jsonl` and `runs.jsonl`
/// under a directory
#[derive(Clone)]
pub struct JsonlSink {
    dir: PathBuf,
    // Serializes appends so concurrent attempts never interleave lines
    write_lock: Arc<Mutex<()>>,
}

impl JsonlSink {
    /// Create the sink, creating `dir` if needed
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self {
            dir,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn append<T: Serialize>(&self, file: &str, record: &T) -> Result<(), SinkError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().await;
        let mut handle = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.join(file))
            .await?;
        handle.write_all(&line).await?;
        handle.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl PersistenceSink for JsonlSink {
    async fn record_account(&self, account: &AccountRecord) -> Result<(), SinkError> {
        self.append(ACCOUNTS_FILE, account).await
    }

    async fn record_attempt_outcome(&self, attempt: &AttemptSnapshot) -> Result<(), SinkError> {
        self.append(ATTEMPTS_FILE, attempt).await
    }

    async fn record_run_snapshot(&self, run: &RunSnapshot) -> Result<(), SinkError> {
        self.append(RUNS_FILE, run).await
    }
}

#[cfg(test)]
#[path = "jsonl_tests.rs"]
mod tests;
