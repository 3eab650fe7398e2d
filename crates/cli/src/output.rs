// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output formatting for CLI commands

use clap::ValueEnum;
use flock_adapters::SimStats;
use flock_core::{AttemptSnapshot, Event, RunSnapshot};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Print output in the specified format
pub fn print<T: Serialize + fmt::Display>(value: &T, format: OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", value),
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(value) {
                println!("{}", json);
            }
        }
    }
}

/// One line per event on stderr, keeping stdout for the final report
pub fn print_event(event: &Event, format: OutputFormat) {
    match (format, event) {
        (OutputFormat::Json, _) => {
            if let Ok(json) = serde_json::to_string(event) {
                eprintln!("{}", json);
            }
        }
        (OutputFormat::Text, Event::AttemptCompleted { attempt }) => eprintln!("{}", attempt),
        (OutputFormat::Text, Event::RunTargetReached { run }) => eprintln!(
            "goal reached: {}/{} succeeded, draining {} in flight",
            run.counters.succeeded, run.total_users, run.in_flight
        ),
        (OutputFormat::Text, _) => {}
    }
}

/// Final report of a run
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub run: RunSnapshot,
    /// Failed attempts per failed-stage label
    pub failures: BTreeMap<String, u32>,
    pub sessions: SessionReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct SessionReport {
    pub acquired: u64,
    pub released: u64,
    pub peak_live: u64,
    pub accounts: u64,
}

impl RunReport {
    pub fn new(
        run: RunSnapshot,
        attempts: &[AttemptSnapshot],
        stats: SimStats,
        output_dir: Option<PathBuf>,
    ) -> Self {
        let mut failures = BTreeMap::new();
        for result in attempts.iter().filter_map(|a| a.result.as_ref()) {
            if !result.success {
                *failures
                    .entry(result.failed_stage_label().to_string())
                    .or_insert(0) += 1;
            }
        }
        Self {
            run,
            failures,
            sessions: SessionReport {
                acquired: stats.acquired,
                released: stats.released,
                peak_live: stats.peak_live,
                accounts: stats.accounts,
            },
            output_dir,
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.run)?;
        writeln!(
            f,
            "Sessions:   {} acquired, {} released (peak {})",
            self.sessions.acquired, self.sessions.released, self.sessions.peak_live
        )?;
        if !self.failures.is_empty() {
            writeln!(f, "Failures:")?;
            for (stage, count) in &self.failures {
                writeln!(f, "  {:<20} {}", stage, count)?;
            }
        }
        if let Some(dir) = &self.output_dir {
            writeln!(f, "Records:    {}", dir.display())?;
        }
        if let Some(error) = &self.run.error {
            writeln!(f, "Error:      {}", error)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
