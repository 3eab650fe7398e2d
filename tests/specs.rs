//! Behavioral specifications for the flock CLI.
//!
//! These tests are black-box: they invoke the CLI binary and verify
//! stdout, stderr, exit codes and the files a run leaves behind.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/prelude.rs"]
mod prelude;

// cli/
#[path = "specs/cli/errors.rs"]
mod cli_errors;
#[path = "specs/cli/help.rs"]
mod cli_help;
#[path = "specs/cli/logging.rs"]
mod cli_logging;

// config/
#[path = "specs/config/check.rs"]
mod config_check;

// run/
#[path = "specs/run/adaptive.rs"]
mod run_adaptive;
#[path = "specs/run/fixed.rs"]
mod run_fixed;
#[path = "specs/run/records.rs"]
mod run_records;
#[path = "specs/run/watch.rs"]
mod run_watch;
