// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! flock-engine: attempt execution and run orchestration

mod error;
mod orchestrator;
mod registry;
mod runner;
pub mod stages;

pub use error::{AttemptError, OrchestratorError, StageError, StageErrorKind};
pub use orchestrator::{Orchestrator, OrchestratorDeps};
pub use runner::{
    AttemptExecutor, AttemptRunner, RunnerDeps, SessionLease, PUBLISH_TIMEOUT_RETRIES,
};
pub use stages::PUBLISH_LOOKUPS;
