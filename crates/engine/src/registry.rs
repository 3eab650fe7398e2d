// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory store of runs and their attempts

use flock_core::{Attempt, AttemptSnapshot, Run, RunId, RunStatus};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// A run plus its live attempts and retained history
pub(crate) struct RunEntry {
    pub run: Run,
    /// Attempts not yet evicted, keyed by ordinal
    live: BTreeMap<u64, Attempt>,
    /// Evicted attempts, oldest first
    history: VecDeque<Attempt>,
    status: watch::Sender<RunStatus>,
}

impl RunEntry {
    fn new(run: Run) -> Self {
        let (status, _) = watch::channel(run.status);
        Self {
            run,
            live: BTreeMap::new(),
            history: VecDeque::new(),
            status,
        }
    }

    pub fn insert_attempt(&mut self, attempt: Attempt) {
        self.live.insert(attempt.ordinal, attempt);
    }

    pub fn attempt_mut(&mut self, ordinal: u64) -> Option<&mut Attempt> {
        self.live.get_mut(&ordinal)
    }

    /// Live attempts still running
    pub fn running(&self) -> impl Iterator<Item = &Attempt> {
        self.live.values().filter(|a| !a.status.is_terminal())
    }

    /// History followed by live attempts, in ordinal order
    pub fn attempts(&self) -> Vec<AttemptSnapshot> {
        let mut all: Vec<AttemptSnapshot> = self
            .history
            .iter()
            .chain(self.live.values())
            .map(Attempt::snapshot)
            .collect();
        all.sort_by_key(|a| a.ordinal);
        all
    }

    /// Publish the current status to waiters
    pub fn notify_status(&self) {
        self.status.send_replace(self.run.status);
    }

    pub fn watch_status(&self) -> watch::Receiver<RunStatus> {
        self.status.subscribe()
    }

    /// Move attempts settled for longer than `grace` into history, keeping
    /// at most `limit` of them. Returns the number evicted.
    pub fn evict(&mut self, now: Instant, grace: Duration, limit: usize) -> usize {
        let expired: Vec<u64> = self
            .live
            .values()
            .filter(|a| {
                a.settled_at
                    .is_some_and(|at| now.saturating_duration_since(at) >= grace)
            })
            .map(|a| a.ordinal)
            .collect();
        for ordinal in &expired {
            if let Some(attempt) = self.live.remove(ordinal) {
                self.history.push_back(attempt);
            }
        }
        while self.history.len() > limit {
            self.history.pop_front();
        }
        expired.len()
    }

    #[cfg(test)]
    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}

/// All runs known to an orchestrator, in creation order
#[derive(Default)]
pub(crate) struct Registry {
    runs: HashMap<RunId, RunEntry>,
    order: Vec<RunId>,
}

impl Registry {
    pub fn insert(&mut self, run: Run) {
        let id = run.id.clone();
        self.order.push(id.clone());
        self.runs.insert(id, RunEntry::new(run));
    }

    pub fn get(&self, id: &RunId) -> Option<&RunEntry> {
        self.runs.get(id)
    }

    pub fn get_mut(&mut self, id: &RunId) -> Option<&mut RunEntry> {
        self.runs.get_mut(id)
    }

    pub fn remove(&mut self, id: &RunId) -> Option<RunEntry> {
        self.order.retain(|r| r != id);
        self.runs.remove(id)
    }

    /// The run currently Running or Finalizing, if any
    pub fn active(&self) -> Option<&RunId> {
        self.order
            .iter()
            .find(|id| self.runs.get(*id).is_some_and(|e| e.run.status.is_active()))
    }

    pub fn entries(&self) -> impl Iterator<Item = &RunEntry> {
        self.order.iter().filter_map(|id| self.runs.get(id))
    }

    pub fn entries_mut(&mut self) -> impl Iterator<Item = &mut RunEntry> {
        self.runs.values_mut()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
