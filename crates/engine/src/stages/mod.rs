// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow stage functions
//!
//! Each stage drives one step of the funnel on an already acquired session.
//! Stages retry transient element lookups within their own timeout budget
//! and never retry across stage boundaries; fallback edges belong to the
//! attempt runner.

mod confirm;
mod enroll;
mod onboard;
mod publish;
mod select;

pub use publish::PUBLISH_LOOKUPS;

use crate::error::StageError;
use flock_adapters::{BrowserSession, Element, Identity, InboxWatcher, SessionError};
use flock_core::config::FlockConfig;
use flock_core::{AttemptParams, Stage, StageResult, TimeoutPolicy};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::Instrument;

/// Delay between transient lookup retries
const RETRY_BACKOFF: Duration = Duration::from_millis(100);

/// Everything a stage needs, borrowed from the attempt runner
pub struct StageContext<'a, S, W> {
    pub session: &'a S,
    pub inbox: &'a W,
    pub identity: &'a Identity,
    pub params: &'a AttemptParams,
    pub config: &'a FlockConfig,
    pub policy: TimeoutPolicy,
}

impl<'a, S: BrowserSession, W: InboxWatcher> StageContext<'a, S, W> {
    pub fn new(
        session: &'a S,
        inbox: &'a W,
        identity: &'a Identity,
        params: &'a AttemptParams,
        config: &'a FlockConfig,
    ) -> Self {
        Self {
            session,
            inbox,
            identity,
            params,
            config,
            policy: TimeoutPolicy::new(params.is_degraded()),
        }
    }

    fn visibility(&self) -> Duration {
        self.policy.visibility(self.config.timeouts.visibility)
    }

    fn navigation(&self) -> Duration {
        self.policy.navigation(self.config.timeouts.navigation)
    }

    async fn pause(&self) {
        let pause = self.policy.pause(self.config.timeouts.pause);
        if !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
    }

    /// Click once the element is visible, retrying transient misses
    async fn click(&self, element: Element) -> Result<(), SessionError> {
        let budget = self.visibility();
        retry_transient(budget, || self.session.click(element, budget)).await
    }

    async fn fill(&self, element: Element, value: &str) -> Result<(), SessionError> {
        let budget = self.visibility();
        retry_transient(budget, || self.session.fill(element, value, budget)).await
    }

    async fn wait_visible(&self, element: Element) -> Result<(), SessionError> {
        let budget = self.visibility();
        retry_transient(budget, || self.session.wait_visible(element, budget)).await
    }

    /// Open an artifact page and fork it into the account
    async fn fork_artifact(&self, url: &str) -> Result<(), StageError> {
        self.session.goto(url, self.navigation()).await?;
        self.pause().await;
        self.click(Element::ForkButton).await?;
        self.session
            .wait_for_url_change(url, self.navigation())
            .await?;
        Ok(())
    }
}

/// Retry `op` while it fails with a transient error and budget remains
pub async fn retry_transient<T, F, Fut>(budget: Duration, mut op: F) -> Result<T, SessionError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SessionError>>,
{
    let deadline = tokio::time::Instant::now() + budget;
    loop {
        match op().await {
            Err(e) if e.is_transient() => {
                let now = tokio::time::Instant::now();
                if now >= deadline {
                    return Err(e);
                }
                tokio::time::sleep(RETRY_BACKOFF.min(deadline - now)).await;
            }
            other => return other,
        }
    }
}

/// Run one stage under its own span and time it
pub async fn run_stage<S, W>(
    stage: Stage,
    used_fallback: bool,
    cx: &StageContext<'_, S, W>,
) -> (StageResult, Result<(), StageError>)
where
    S: BrowserSession,
    W: InboxWatcher,
{
    let span = tracing::info_span!("stage", stage = stage.name(), fallback = used_fallback);
    async {
        let start = Instant::now();
        let outcome = match stage {
            Stage::Enroll => enroll::run(cx).await,
            Stage::ConfirmEmail => confirm::run(cx).await,
            Stage::Onboard => onboard::run(cx).await,
            Stage::SelectArtifact => select::run(cx).await,
            Stage::Publish => publish::run(cx).await,
            Stage::Recovery => recover(cx).await,
        };
        let elapsed = start.elapsed();
        let result = match &outcome {
            Ok(()) => {
                tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "stage complete");
                StageResult::succeeded(stage, elapsed, used_fallback)
            }
            Err(e) => {
                tracing::warn!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    kind = ?e.kind(),
                    "stage failed"
                );
                StageResult::failed(stage, elapsed, e.to_string(), used_fallback)
            }
        };
        (result, outcome)
    }
    .instrument(span)
    .await
}

/// Fork the designated fallback artifact, skipping random selection.
/// Safe to run from any page and any number of times.
async fn recover<S: BrowserSession, W: InboxWatcher>(
    cx: &StageContext<'_, S, W>,
) -> Result<(), StageError> {
    cx.fork_artifact(&cx.config.target.fallback_artifact_url)
        .await
}
