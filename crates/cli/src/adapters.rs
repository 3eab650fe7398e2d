// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestrator factory for CLI commands

use async_trait::async_trait;
use flock_adapters::{
    AccountRecord, JsonlSink, NoOpSink, PersistenceSink, SimWorld, SinkError,
    TracedIdentityService, TracedInboxWatcher, TracedSessionProvider,
};
use flock_core::{AttemptSnapshot, EventBus, FlockConfig, RunSnapshot, SystemClock, UuidIdGen};
use flock_engine::{AttemptRunner, Orchestrator, OrchestratorDeps, RunnerDeps};
use std::sync::Arc;

/// Persistence chosen on the command line
#[derive(Clone)]
pub enum CliSink {
    Jsonl(JsonlSink),
    Discard(NoOpSink),
}

#[async_trait]
impl PersistenceSink for CliSink {
    async fn record_account(&self, account: &AccountRecord) -> Result<(), SinkError> {
        match self {
            CliSink::Jsonl(sink) => sink.record_account(account).await,
            CliSink::Discard(sink) => sink.record_account(account).await,
        }
    }

    async fn record_attempt_outcome(&self, attempt: &AttemptSnapshot) -> Result<(), SinkError> {
        match self {
            CliSink::Jsonl(sink) => sink.record_attempt_outcome(attempt).await,
            CliSink::Discard(sink) => sink.record_attempt_outcome(attempt).await,
        }
    }

    async fn record_run_snapshot(&self, run: &RunSnapshot) -> Result<(), SinkError> {
        match self {
            CliSink::Jsonl(sink) => sink.record_run_snapshot(run).await,
            CliSink::Discard(sink) => sink.record_run_snapshot(run).await,
        }
    }
}

pub type CliExecutor = AttemptRunner<
    TracedSessionProvider<SimWorld>,
    TracedIdentityService<SimWorld>,
    TracedInboxWatcher<SimWorld>,
    CliSink,
>;

pub type CliOrchestrator = Orchestrator<CliExecutor, CliSink, SystemClock, UuidIdGen>;

/// Create an orchestrator whose attempts run against the simulated world
pub fn make_orchestrator(world: &SimWorld, sink: CliSink, config: FlockConfig) -> CliOrchestrator {
    let scheduler = config.scheduler.clone();
    let runner = AttemptRunner::new(
        RunnerDeps {
            sessions: TracedSessionProvider::new(world.clone()),
            identities: TracedIdentityService::new(world.clone()),
            inbox: TracedInboxWatcher::new(world.clone()),
            sink: sink.clone(),
        },
        Arc::new(config),
    );
    Orchestrator::new(
        OrchestratorDeps {
            executor: runner,
            sink,
            events: EventBus::new(),
        },
        SystemClock,
        UuidIdGen,
        scheduler,
    )
}
