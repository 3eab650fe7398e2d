// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run orchestration
//!
//! The orchestrator owns every run and enforces that at most one is active
//! (Running or Finalizing) at a time. Starting a run spawns a driver task
//! which admits attempts into a per-run worker budget and settles their
//! results one at a time under the registry lock, so counters and target
//! math never see interleaved updates.

use crate::error::OrchestratorError;
use crate::registry::Registry;
use crate::runner::AttemptExecutor;
use flock_adapters::PersistenceSink;
use flock_core::config::SchedulerConfig;
use flock_core::{
    Attempt, AttemptId, AttemptResult, AttemptSnapshot, AttemptSpec, Clock, Event, EventBus,
    EventReceiver, IdGen, Run, RunConfig, RunId, RunSnapshot, RunStatus, Subscription,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Orchestrator dependencies
pub struct OrchestratorDeps<E, K> {
    pub executor: E,
    pub sink: K,
    pub events: EventBus,
}

struct Driver {
    /// Cooperative stop: no new admissions, in-flight attempts drain
    stop: CancellationToken,
    /// Forced shutdown: in-flight attempts are aborted and marked cancelled
    abort: CancellationToken,
    task: JoinHandle<()>,
}

struct Shared<E, K, C, I> {
    executor: E,
    sink: K,
    clock: C,
    id_gen: I,
    events: EventBus,
    config: SchedulerConfig,
    registry: Mutex<Registry>,
    drivers: Mutex<HashMap<RunId, Driver>>,
}

/// Schedules runs of attempts. Clones share the same state.
pub struct Orchestrator<E, K, C, I> {
    shared: Arc<Shared<E, K, C, I>>,
}

impl<E, K, C, I> Clone for Orchestrator<E, K, C, I> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<E, K, C, I> Orchestrator<E, K, C, I>
where
    E: AttemptExecutor,
    K: PersistenceSink,
    C: Clock,
    I: IdGen,
{
    pub fn new(deps: OrchestratorDeps<E, K>, clock: C, id_gen: I, config: SchedulerConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                executor: deps.executor,
                sink: deps.sink,
                clock,
                id_gen,
                events: deps.events,
                config,
                registry: Mutex::new(Registry::default()),
                drivers: Mutex::new(HashMap::new()),
            }),
        }
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.shared
            .registry
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    fn drivers(&self) -> MutexGuard<'_, HashMap<RunId, Driver>> {
        self.shared
            .drivers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, event: Event) {
        tracing::trace!(event = event.name(), run_id = %event.run_id(), "publishing");
        self.shared.events.publish(event);
    }

    /// Validate and register a new Pending run
    pub fn create_run(&self, config: RunConfig) -> Result<RunSnapshot, OrchestratorError> {
        config.validate()?;
        let clock = &self.shared.clock;
        let snapshot = {
            let mut registry = self.registry();
            if let Some(active) = registry.active() {
                return Err(OrchestratorError::ActiveRun(active.clone()));
            }
            let run = Run::new(RunId::new(self.shared.id_gen.next()), config, clock.utc_now());
            let snapshot = run.snapshot(clock.now());
            registry.insert(run);
            snapshot
        };
        tracing::info!(
            run_id = %snapshot.id,
            mode = %snapshot.mode,
            total_users = snapshot.total_users,
            concurrency = snapshot.concurrency,
            "run created"
        );
        self.publish(Event::RunCreated {
            run: snapshot.clone(),
        });
        Ok(snapshot)
    }

    /// Pending -> Running, then spawn the run's driver.
    ///
    /// The active-run check and the transition happen under one lock, so of
    /// two racing starts at most one succeeds.
    pub async fn start(&self, run_id: &RunId) -> Result<RunSnapshot, OrchestratorError> {
        let clock = &self.shared.clock;
        let (snapshot, concurrency) = {
            let mut registry = self.registry();
            if let Some(active) = registry.active() {
                return Err(OrchestratorError::ActiveRun(active.clone()));
            }
            let entry = registry
                .get_mut(run_id)
                .ok_or_else(|| OrchestratorError::RunNotFound(run_id.clone()))?;
            entry.run.start(clock.now(), clock.utc_now())?;
            entry.notify_status();
            (entry.run.snapshot(clock.now()), entry.run.config.concurrency)
        };
        tracing::info!(run_id = %run_id, "run started");
        self.publish(Event::RunStarted {
            run: snapshot.clone(),
        });

        let stop = CancellationToken::new();
        let abort = CancellationToken::new();
        let span = tracing::info_span!("run", run_id = %run_id);
        // Held across the spawn so finalize cannot look for the entry first
        let mut drivers = self.drivers();
        let task = tokio::spawn(
            self.clone()
                .drive(run_id.clone(), concurrency, stop.clone(), abort.clone())
                .instrument(span),
        );
        drivers.insert(run_id.clone(), Driver { stop, abort, task });
        Ok(snapshot)
    }

    /// Stop admitting attempts. In-flight attempts settle normally.
    /// Idempotent; a stopped run never returns to Running.
    pub async fn stop(&self, run_id: &RunId) -> Result<RunSnapshot, OrchestratorError> {
        let clock = &self.shared.clock;
        let (snapshot, changed) = {
            let mut registry = self.registry();
            let entry = registry
                .get_mut(run_id)
                .ok_or_else(|| OrchestratorError::RunNotFound(run_id.clone()))?;
            let changed = entry.run.request_stop(clock.now(), clock.utc_now());
            entry.notify_status();
            (entry.run.snapshot(clock.now()), changed)
        };
        if let Some(driver) = self.drivers().get(run_id) {
            driver.stop.cancel();
        }

        if changed {
            tracing::info!(run_id = %run_id, status = %snapshot.status, "stop requested");
            if snapshot.status.is_terminal() {
                // Never started, so no driver will report completion
                self.publish(Event::RunCompleted {
                    run: snapshot.clone(),
                });
                self.record_run(&snapshot).await;
            } else {
                self.publish(Event::RunUpdated {
                    run: snapshot.clone(),
                });
            }
        }
        Ok(snapshot)
    }

    /// Stop every run and forcibly cancel in-flight attempts, then wait for
    /// all drivers to exit.
    pub async fn cancel_all(&self) {
        let clock = &self.shared.clock;
        let never_started: Vec<RunSnapshot> = {
            let mut registry = self.registry();
            let mut stopped = Vec::new();
            for entry in registry.entries_mut() {
                let was_pending = entry.run.status == RunStatus::Pending;
                if entry.run.request_stop(clock.now(), clock.utc_now()) {
                    entry.notify_status();
                    if was_pending {
                        stopped.push(entry.run.snapshot(clock.now()));
                    }
                }
            }
            stopped
        };
        let drivers: Vec<Driver> = self.drivers().drain().map(|(_, d)| d).collect();
        tracing::info!(drivers = drivers.len(), "cancelling all runs");

        for driver in &drivers {
            driver.abort.cancel();
            driver.stop.cancel();
        }
        for snapshot in never_started {
            self.publish(Event::RunCompleted {
                run: snapshot.clone(),
            });
            self.record_run(&snapshot).await;
        }
        for driver in drivers {
            if let Err(e) = driver.task.await {
                tracing::error!(error = %e, "run driver did not exit cleanly");
            }
        }
    }

    /// Remove a run that is not active
    pub fn delete_run(&self, run_id: &RunId) -> Result<RunSnapshot, OrchestratorError> {
        let entry = {
            let mut registry = self.registry();
            let entry = registry
                .get(run_id)
                .ok_or_else(|| OrchestratorError::RunNotFound(run_id.clone()))?;
            if entry.run.status.is_active() {
                return Err(OrchestratorError::RunInUse(run_id.clone()));
            }
            registry.remove(run_id)
        };
        self.drivers().remove(run_id);
        let entry = entry.ok_or_else(|| OrchestratorError::RunNotFound(run_id.clone()))?;
        tracing::info!(run_id = %run_id, "run deleted");
        Ok(entry.run.snapshot(self.shared.clock.now()))
    }

    pub fn get_run(&self, run_id: &RunId) -> Result<RunSnapshot, OrchestratorError> {
        self.registry()
            .get(run_id)
            .map(|entry| entry.run.snapshot(self.shared.clock.now()))
            .ok_or_else(|| OrchestratorError::RunNotFound(run_id.clone()))
    }

    /// All runs in creation order
    pub fn list_runs(&self) -> Vec<RunSnapshot> {
        let now = self.shared.clock.now();
        self.registry()
            .entries()
            .map(|entry| entry.run.snapshot(now))
            .collect()
    }

    /// Live and retained attempts of a run, in ordinal order
    pub fn attempts(&self, run_id: &RunId) -> Result<Vec<AttemptSnapshot>, OrchestratorError> {
        self.registry()
            .get(run_id)
            .map(|entry| entry.attempts())
            .ok_or_else(|| OrchestratorError::RunNotFound(run_id.clone()))
    }

    pub fn subscribe(&self, subscription: Subscription) -> EventReceiver {
        self.shared.events.subscribe(subscription)
    }

    pub fn events(&self) -> &EventBus {
        &self.shared.events
    }

    /// Resolve once the run reaches a terminal status
    pub async fn wait(&self, run_id: &RunId) -> Result<RunSnapshot, OrchestratorError> {
        let mut status = self
            .registry()
            .get(run_id)
            .map(|entry| entry.watch_status())
            .ok_or_else(|| OrchestratorError::RunNotFound(run_id.clone()))?;
        if status.wait_for(|s| s.is_terminal()).await.is_err() {
            // Deleted while waiting
            return Err(OrchestratorError::RunNotFound(run_id.clone()));
        }
        self.get_run(run_id)
    }

    /// Move attempts settled longer ago than the eviction grace into history
    pub fn evict_settled(&self) -> usize {
        let now = self.shared.clock.now();
        let config = &self.shared.config;
        self.registry()
            .entries_mut()
            .map(|entry| entry.evict(now, config.eviction_grace, config.history_limit))
            .sum()
    }

    async fn drive(
        self,
        run_id: RunId,
        concurrency: u32,
        stop: CancellationToken,
        abort: CancellationToken,
    ) {
        let outcome = self
            .admit_and_settle(&run_id, concurrency, &stop, &abort)
            .await;
        if let Err(e) = &outcome {
            tracing::error!(error = %e, "run driver failed");
        }
        self.finalize(&run_id, outcome.err()).await;
    }

    /// The admission loop. Returns once nothing is in flight and nothing
    /// more may be admitted.
    async fn admit_and_settle(
        &self,
        run_id: &RunId,
        concurrency: u32,
        stop: &CancellationToken,
        abort: &CancellationToken,
    ) -> Result<(), OrchestratorError> {
        let config = &self.shared.config;
        let budget = Arc::new(Semaphore::new(concurrency as usize));
        let mut in_flight: JoinSet<AttemptResult> = JoinSet::new();
        // Task id -> attempt ordinal
        let mut tasks = HashMap::new();
        let mut ticker = tokio::time::interval(config.metrics_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.reset();
        let mut stop_seen = false;

        loop {
            if abort.is_cancelled() {
                self.abort_in_flight(run_id, &mut in_flight, &mut tasks)
                    .await;
                return Ok(());
            }

            if budget.available_permits() > 0 && self.admission_open(run_id)? {
                if !config.attempt_stagger.is_zero() {
                    tokio::select! {
                        _ = abort.cancelled() => continue,
                        _ = stop.cancelled(), if !stop_seen => {
                            stop_seen = true;
                            continue;
                        }
                        _ = tokio::time::sleep(config.attempt_stagger) => {}
                    }
                }
                let permit = Arc::clone(&budget)
                    .acquire_owned()
                    .await
                    .map_err(|_| OrchestratorError::BudgetClosed(run_id.clone()))?;
                // Re-checked after the stagger: a stop may have landed meanwhile
                let Some(spec) = self.admit(run_id)? else {
                    continue;
                };
                let ordinal = spec.ordinal;
                let executor = self.shared.executor.clone();
                let handle = in_flight.spawn(async move {
                    let _permit = permit;
                    let start = Instant::now();
                    match executor.execute(spec).await {
                        Ok(result) => result,
                        Err(e) => {
                            tracing::warn!(ordinal, error = %e, "attempt infrastructure failure");
                            AttemptResult::infrastructure_failure(e.to_string(), start.elapsed())
                        }
                    }
                });
                tasks.insert(handle.id(), ordinal);
                continue;
            }

            if in_flight.is_empty() {
                return Ok(());
            }

            tokio::select! {
                biased;
                _ = abort.cancelled() => {}
                joined = in_flight.join_next_with_id() => match joined {
                    Some(Ok((id, result))) => {
                        if let Some(ordinal) = tasks.remove(&id) {
                            self.settle(run_id, ordinal, result).await;
                        }
                    }
                    Some(Err(e)) => {
                        let Some(ordinal) = tasks.remove(&e.id()) else {
                            continue;
                        };
                        if e.is_cancelled() {
                            continue;
                        }
                        tracing::error!(ordinal, error = %e, "attempt task crashed");
                        let result = AttemptResult::infrastructure_failure(
                            format!("attempt crashed: {}", e),
                            Duration::ZERO,
                        );
                        self.settle(run_id, ordinal, result).await;
                    }
                    None => {}
                },
                _ = stop.cancelled(), if !stop_seen => {
                    stop_seen = true;
                    tracing::info!(in_flight = in_flight.len(), "draining after stop");
                }
                _ = ticker.tick() => self.tick(run_id),
            }
        }
    }

    fn admission_open(&self, run_id: &RunId) -> Result<bool, OrchestratorError> {
        self.registry()
            .get(run_id)
            .map(|entry| entry.run.admission_open())
            .ok_or_else(|| OrchestratorError::RunNotFound(run_id.clone()))
    }

    /// Account for one more attempt if admission is still open
    fn admit(&self, run_id: &RunId) -> Result<Option<AttemptSpec>, OrchestratorError> {
        let clock = &self.shared.clock;
        let (spec, attempt, run) = {
            let mut registry = self.registry();
            let entry = registry
                .get_mut(run_id)
                .ok_or_else(|| OrchestratorError::RunNotFound(run_id.clone()))?;
            if !entry.run.admission_open() {
                return Ok(None);
            }
            let ordinal = entry.run.record_admission();
            let spec = AttemptSpec {
                run_id: run_id.clone(),
                attempt_id: AttemptId::for_run(run_id, ordinal),
                ordinal,
                params: entry.run.config.params.clone(),
                credits_per_success: entry.run.config.credits_per_success,
            };
            let attempt = Attempt::new(&spec, clock.utc_now());
            let snapshot = attempt.snapshot();
            entry.insert_attempt(attempt);
            (spec, snapshot, entry.run.snapshot(clock.now()))
        };
        tracing::debug!(ordinal = spec.ordinal, in_flight = run.in_flight, "attempt admitted");
        self.publish(Event::AttemptStarted { attempt });
        self.publish(Event::RunUpdated { run });
        Ok(Some(spec))
    }

    /// Fold a finished attempt into its run
    async fn settle(&self, run_id: &RunId, ordinal: u64, result: AttemptResult) {
        let clock = &self.shared.clock;
        let (now, utc) = (clock.now(), clock.utc_now());
        let success = result.success;
        let credits = result.credits_earned;
        let (attempt, run, settlement) = {
            let mut registry = self.registry();
            let Some(entry) = registry.get_mut(run_id) else {
                return;
            };
            let Some(attempt) = entry.attempt_mut(ordinal) else {
                return;
            };
            if !attempt.complete(result, utc, now) {
                // Already cancelled
                return;
            }
            let attempt = attempt.snapshot();
            let settlement = if success {
                entry.run.record_success(attempt.id.clone(), credits, now)
            } else {
                entry.run.record_failure(attempt.id.clone(), now)
            };
            (attempt, entry.run.snapshot(now), settlement)
        };

        tracing::info!(
            ordinal,
            success,
            succeeded = run.counters.succeeded,
            failed = run.counters.failed,
            target = run.target,
            target_grew = settlement.target_grew,
            "attempt settled"
        );
        self.publish(Event::AttemptCompleted {
            attempt: attempt.clone(),
        });
        self.publish(Event::RunUpdated { run: run.clone() });
        if settlement.goal_reached {
            tracing::info!(succeeded = run.counters.succeeded, "success goal reached");
            self.publish(Event::RunTargetReached { run });
        }
        if let Err(e) = self.shared.sink.record_attempt_outcome(&attempt).await {
            tracing::warn!(ordinal, error = %e, "failed to record attempt outcome");
        }
    }

    /// Abort every in-flight attempt and mark it cancelled
    async fn abort_in_flight(
        &self,
        run_id: &RunId,
        in_flight: &mut JoinSet<AttemptResult>,
        tasks: &mut HashMap<tokio::task::Id, u64>,
    ) {
        in_flight.abort_all();
        let clock = &self.shared.clock;
        let (now, utc) = (clock.now(), clock.utc_now());
        let (cancelled, run) = {
            let mut registry = self.registry();
            let Some(entry) = registry.get_mut(run_id) else {
                return;
            };
            let running: Vec<u64> = entry.running().map(|a| a.ordinal).collect();
            let mut cancelled = Vec::new();
            for ordinal in running {
                let snapshot = entry
                    .attempt_mut(ordinal)
                    .and_then(|a| a.cancel(utc, now).then(|| a.snapshot()));
                if let Some(snapshot) = snapshot {
                    entry.run.record_cancelled();
                    cancelled.push(snapshot);
                }
            }
            (cancelled, entry.run.snapshot(now))
        };
        tasks.clear();
        // Dropping the aborted futures releases their sessions and permits
        while in_flight.join_next().await.is_some() {}

        tracing::warn!(cancelled = cancelled.len(), "in-flight attempts cancelled");
        for attempt in cancelled {
            self.publish(Event::AttemptCompleted { attempt });
        }
        self.publish(Event::RunUpdated { run });
    }

    fn tick(&self, run_id: &RunId) {
        let evicted = self.evict_settled();
        if evicted > 0 {
            tracing::debug!(evicted, "evicted settled attempts");
        }
        if let Ok(run) = self.get_run(run_id) {
            self.publish(Event::RunUpdated { run });
        }
    }

    async fn finalize(&self, run_id: &RunId, error: Option<OrchestratorError>) {
        let clock = &self.shared.clock;
        let snapshot = {
            let mut registry = self.registry();
            let Some(entry) = registry.get_mut(run_id) else {
                return;
            };
            let run = &mut entry.run;
            let status = match &error {
                Some(e) => {
                    run.error = Some(e.to_string());
                    RunStatus::Failed
                }
                None if run.cancelled && !run.goal_reached() => RunStatus::Cancelled,
                None => RunStatus::Completed,
            };
            run.finish(status, clock.now(), clock.utc_now());
            run.snapshot(clock.now())
        };

        tracing::info!(
            status = %snapshot.status,
            attempted = snapshot.counters.attempted,
            succeeded = snapshot.counters.succeeded,
            failed = snapshot.counters.failed,
            credits = snapshot.counters.credits,
            elapsed_ms = snapshot.elapsed_ms,
            "run finished"
        );
        self.publish(Event::RunCompleted {
            run: snapshot.clone(),
        });
        self.record_run(&snapshot).await;
        self.drivers().remove(run_id);

        // Waiters resume only after the completion event is out
        if let Some(entry) = self.registry().get(run_id) {
            entry.notify_status();
        }
    }

    async fn record_run(&self, snapshot: &RunSnapshot) {
        if let Err(e) = self.shared.sink.record_run_snapshot(snapshot).await {
            tracing::warn!(run_id = %snapshot.id, error = %e, "failed to record run snapshot");
        }
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
