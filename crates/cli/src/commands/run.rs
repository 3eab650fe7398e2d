// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `flock run` - Drive a run against the simulated world

use crate::adapters::{make_orchestrator, CliSink};
use crate::commands::config::load_config;
use crate::error::FlockError;
use crate::output::{self, OutputFormat, RunReport};
use anyhow::{bail, Result};
use clap::{Args, ValueEnum};
use flock_adapters::{JsonlSink, NoOpSink, SimWorld};
use flock_core::{EventReceiver, FlockConfig, RunConfig, RunStatus, ScheduleMode, Subscription};
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Make exactly --users attempts
    Fixed,
    /// Replace failed attempts until --users succeed
    Adaptive,
}

impl From<ModeArg> for ScheduleMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Fixed => ScheduleMode::Fixed,
            ModeArg::Adaptive => ScheduleMode::Adaptive,
        }
    }
}

#[derive(Args)]
pub struct RunArgs {
    /// Config file (default: the user config file, then built-in defaults)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Success goal; in fixed mode the number of attempts
    #[arg(long)]
    pub users: Option<u32>,

    /// Worker budget: attempts running at once (1-10)
    #[arg(long)]
    pub concurrency: Option<u32>,

    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Label stored with the run
    #[arg(long)]
    pub label: Option<String>,

    /// Share of simulated sessions that hit a scripted fault (0.0-1.0)
    #[arg(long, default_value_t = 0.0, value_parser = parse_rate)]
    pub failure_rate: f64,

    /// Seed for the simulated world
    #[arg(long, default_value_t = 1)]
    pub seed: u64,

    /// Simulated delay before every browser action (e.g. "5ms")
    #[arg(long, default_value = "0ms", value_parser = humantime::parse_duration)]
    pub latency: Duration,

    /// Route sessions through a degraded network (scaled timeouts)
    #[arg(long)]
    pub degraded: bool,

    /// Force the artifact selection stage to fail
    #[arg(long)]
    pub inject_select_failure: bool,

    /// Directory for accounts.jsonl, attempts.jsonl and runs.jsonl
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Print attempts as they settle (stderr)
    #[arg(long)]
    pub watch: bool,
}

fn parse_rate(s: &str) -> Result<f64, String> {
    let rate: f64 = s.parse().map_err(|_| format!("not a number: {s}"))?;
    if !(0.0..=1.0).contains(&rate) {
        return Err(format!("must be between 0.0 and 1.0, got {rate}"));
    }
    Ok(rate)
}

impl RunArgs {
    /// Run config from the `[run]` defaults overridden by flags
    pub fn run_config(&self, config: &FlockConfig) -> RunConfig {
        let mut run = config.run.to_run_config();
        if let Some(users) = self.users {
            run.total_users = users;
        }
        if let Some(concurrency) = self.concurrency {
            run.concurrency = concurrency;
        }
        if let Some(mode) = self.mode {
            run.mode = mode.into();
        }
        if self.label.is_some() {
            run.label = self.label.clone();
        }
        run.params.degraded |= self.degraded;
        run.params.inject_select_failure |= self.inject_select_failure;
        run
    }
}

pub async fn handle(args: RunArgs) -> Result<()> {
    let (config, source) = load_config(args.config.as_deref())?;
    tracing::info!(%source, "configuration resolved");
    let run_config = args.run_config(&config);

    let sink = match &args.output_dir {
        Some(dir) => CliSink::Jsonl(JsonlSink::open(dir).await?),
        None => CliSink::Discard(NoOpSink),
    };
    let world = SimWorld::random(
        config.target.clone(),
        args.seed,
        args.failure_rate,
        args.latency,
    );
    let orchestrator = make_orchestrator(&world, sink, config);

    let watcher = args.watch.then(|| {
        let events = orchestrator.subscribe(Subscription::new(
            "cli-watch",
            &["attempt:completed", "run:target_reached"],
        ));
        spawn_watcher(events, args.format)
    });

    let run = orchestrator
        .create_run(run_config)
        .map_err(FlockError::run_rejected)?;
    orchestrator
        .start(&run.id)
        .await
        .map_err(FlockError::run_rejected)?;

    let finished = tokio::select! {
        result = orchestrator.wait(&run.id) => result?,
        Ok(()) = tokio::signal::ctrl_c() => {
            eprintln!("interrupted, cancelling in-flight attempts");
            orchestrator.cancel_all().await;
            orchestrator.get_run(&run.id)?
        }
    };
    let attempts = orchestrator.attempts(&run.id)?;

    // Closing the event bus ends the watcher once it has drained
    drop(orchestrator);
    if let Some(watcher) = watcher {
        join_watcher(watcher).await;
    }

    let report = RunReport::new(finished, &attempts, world.stats(), args.output_dir);
    output::print(&report, args.format);

    if report.run.status == RunStatus::Failed {
        bail!(
            "run {} failed: {}",
            report.run.id,
            report.run.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

fn spawn_watcher(mut events: EventReceiver, format: OutputFormat) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            output::print_event(&event, format);
        }
    })
}

/// Wait for the watcher to drain; returns false if it panicked or was aborted
async fn join_watcher(watcher: JoinHandle<()>) -> bool {
    match watcher.await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "event watcher ended abnormally");
            false
        }
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
