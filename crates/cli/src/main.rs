// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! flock - orchestrate simulated signup funnel sessions

mod adapters;
mod commands;
mod error;
mod output;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use commands::{config, run};
use error::FlockError;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;

#[derive(Parser)]
#[command(
    name = "flock",
    version,
    about = "Flock - orchestrate simulated signup funnel sessions"
)]
struct Cli {
    /// Log filter, e.g. "info" or "flock_engine=debug" (default: RUST_LOG, then "warn")
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive a run against the simulated world
    Run(run::RunArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let guard = match setup_logging(cli.log_level.as_deref(), cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("error: failed to set up logging: {:#}", e);
            std::process::exit(2);
        }
    };

    let result = match cli.command {
        Commands::Run(args) => run::handle(args).await,
        Commands::Config(args) => config::handle(args),
    };
    if let Err(e) = &result {
        report(e);
    }
    // Flush buffered log lines before exiting
    drop(guard);
    if result.is_err() {
        std::process::exit(1);
    }
}

fn report(error: &anyhow::Error) {
    match error.downcast_ref::<FlockError>() {
        Some(e) => eprint!("{}", e),
        None => eprintln!("error: {:#}", error),
    }
}

fn setup_logging(level: Option<&str>, file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = match level {
        Some(level) => EnvFilter::try_new(level)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    let Some(path) = file else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
        return Ok(None);
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir)?;
    let name = path
        .file_name()
        .ok_or_else(|| anyhow!("log file has no file name: {}", path.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .init();

    Ok(Some(guard))
}
