// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine

use flock_adapters::{IdentityError, InboxError, SessionError};
use flock_core::run::TransitionError;
use flock_core::{RunConfigError, RunId};
use thiserror::Error;

/// How the attempt runner reacts to a stage failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageErrorKind {
    /// Business rejection, fails the attempt without recovery
    Terminal,
    /// May be recovered through the fallback stage
    Recoverable,
    /// Publish lookup timed out on its final retry
    PublishTimeout,
}

/// Errors raised inside a workflow stage
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageError {
    #[error("identity is not eligible for the referral program")]
    Ineligible,
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Inbox(#[from] InboxError),
    #[error("confirmation link is not on {domain}: {link}")]
    InvalidConfirmationLink { link: String, domain: String },
    #[error("confirmation was rejected")]
    ConfirmationRejected,
    #[error("no eligible artifacts to select")]
    NoEligibleArtifacts,
    #[error("injected artifact selection failure")]
    InjectedFailure,
    #[error("publish button not found after {lookups} lookups")]
    PublishTimeout { lookups: u32 },
}

impl StageError {
    pub fn kind(&self) -> StageErrorKind {
        match self {
            StageError::Ineligible => StageErrorKind::Terminal,
            StageError::PublishTimeout { .. } => StageErrorKind::PublishTimeout,
            _ => StageErrorKind::Recoverable,
        }
    }
}

/// Infrastructure failures that escape the attempt runner
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("session unavailable: {0}")]
    Session(#[from] SessionError),
    #[error("identity unavailable: {0}")]
    Identity(#[from] IdentityError),
    #[error("session lease was already released")]
    LeaseReleased,
}

/// Errors surfaced by orchestrator operations
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("run not found: {0}")]
    RunNotFound(RunId),
    #[error("run {0} is already active")]
    ActiveRun(RunId),
    #[error("run {0} is active and cannot be deleted")]
    RunInUse(RunId),
    #[error("invalid run config: {0}")]
    InvalidConfig(#[from] RunConfigError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("worker budget closed for run {0}")]
    BudgetClosed(RunId),
}

#[cfg(test)]
mod tests {
    use super::*;
    use flock_adapters::Element;
    use std::time::Duration;
    use yare::parameterized;

    #[parameterized(
        ineligible = { StageError::Ineligible, StageErrorKind::Terminal },
        publish_timeout = { StageError::PublishTimeout { lookups: 3 }, StageErrorKind::PublishTimeout },
        not_found = {
            StageError::Session(SessionError::ElementNotFound(Element::ForkButton)),
            StageErrorKind::Recoverable
        },
        session_timeout = {
            StageError::Session(SessionError::Timeout {
                what: "PublishButton".to_string(),
                after: Duration::from_secs(1),
            }),
            StageErrorKind::Recoverable
        },
        bad_link = {
            StageError::InvalidConfirmationLink {
                link: "https://evil.test/confirm".to_string(),
                domain: "app.test".to_string(),
            },
            StageErrorKind::Recoverable
        },
        injected = { StageError::InjectedFailure, StageErrorKind::Recoverable },
    )]
    fn stage_errors_classify(error: StageError, kind: StageErrorKind) {
        assert_eq!(error.kind(), kind);
    }

    #[test]
    fn session_errors_read_without_wrapping() {
        let err = StageError::from(SessionError::ElementNotFound(Element::EmailInput));
        assert_eq!(err.to_string(), "element not found: EmailInput");
    }
}
