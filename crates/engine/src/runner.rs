// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Attempt runner: one session end-to-end through the workflow
//!
//! The runner owns the session for the whole attempt and walks the stage
//! graph, taking the fallback edges:
//!
//! ```text
//! Enroll -> ConfirmEmail -> Onboard -> SelectArtifact -> Publish
//!               |              |             |              ^  |
//!               +--------------+-------------+--> Recovery -+  | publish timeout
//!                                                    ^---------+  (once)
//! ```

use crate::error::{AttemptError, StageErrorKind};
use crate::stages::{run_stage, StageContext};
use async_trait::async_trait;
use chrono::Utc;
use flock_adapters::{
    AccountRecord, BrowserSession, Identity, IdentityService, InboxWatcher, PersistenceSink,
    SessionProvider,
};
use flock_core::config::FlockConfig;
use flock_core::{AttemptResult, AttemptSpec, Stage, StageResult};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

/// Recovery-then-publish cycles allowed after a publish timeout
pub const PUBLISH_TIMEOUT_RETRIES: u32 = 1;

/// Executes a single attempt. Infrastructure failures are returned as
/// errors; every stage-level failure is folded into the result.
#[async_trait]
pub trait AttemptExecutor: Clone + Send + Sync + 'static {
    async fn execute(&self, spec: AttemptSpec) -> Result<AttemptResult, AttemptError>;
}

/// Collaborators used by the attempt runner
pub struct RunnerDeps<P, I, W, K> {
    pub sessions: P,
    pub identities: I,
    pub inbox: W,
    pub sink: K,
}

/// Production attempt executor driving the workflow stages
pub struct AttemptRunner<P, I, W, K> {
    sessions: P,
    identities: I,
    inbox: W,
    sink: K,
    config: Arc<FlockConfig>,
}

impl<P: Clone, I: Clone, W: Clone, K: Clone> Clone for AttemptRunner<P, I, W, K> {
    fn clone(&self) -> Self {
        Self {
            sessions: self.sessions.clone(),
            identities: self.identities.clone(),
            inbox: self.inbox.clone(),
            sink: self.sink.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<P, I, W, K> AttemptRunner<P, I, W, K>
where
    P: SessionProvider,
    I: IdentityService,
    W: InboxWatcher,
    K: PersistenceSink,
{
    pub fn new(deps: RunnerDeps<P, I, W, K>, config: Arc<FlockConfig>) -> Self {
        Self {
            sessions: deps.sessions,
            identities: deps.identities,
            inbox: deps.inbox,
            sink: deps.sink,
            config,
        }
    }

    /// Walk the stage graph on an acquired session
    async fn drive(
        &self,
        spec: &AttemptSpec,
        session: &P::Session,
        identity: &Identity,
    ) -> Walk {
        let cx = StageContext::new(session, &self.inbox, identity, &spec.params, &self.config);
        let mut walk = Walk::default();
        let mut publish_retries = PUBLISH_TIMEOUT_RETRIES;
        // Stage and error that sent the attempt to recovery
        let mut diverted: Option<(Stage, String)> = None;
        let mut next = Some(Stage::Enroll);

        while let Some(stage) = next {
            let (result, outcome) = run_stage(stage, walk.used_fallback, &cx).await;
            walk.stages.push(result);

            let err = match outcome {
                Ok(()) => {
                    if stage == Stage::Enroll {
                        self.record_account(spec, identity).await;
                    }
                    next = stage.next();
                    continue;
                }
                Err(err) => err,
            };

            next = match (stage, err.kind()) {
                (_, StageErrorKind::Terminal) => None,
                (Stage::Recovery, _) => None,
                (Stage::Publish, StageErrorKind::PublishTimeout) if publish_retries > 0 => {
                    publish_retries -= 1;
                    Some(Stage::Recovery)
                }
                (stage, StageErrorKind::Recoverable) if stage.falls_back_to_recovery() => {
                    Some(Stage::Recovery)
                }
                _ => None,
            };

            match next {
                Some(Stage::Recovery) => {
                    tracing::info!(from = stage.name(), error = %err, "falling back to recovery");
                    walk.used_fallback = true;
                    diverted = Some((stage, err.to_string()));
                }
                _ => {
                    walk.failure = Some(match (stage, &diverted) {
                        (Stage::Recovery, Some((origin, cause))) => Failure {
                            stage,
                            error: format!(
                                "{} failed: {}; recovery failed: {}",
                                origin.label(),
                                cause,
                                err
                            ),
                        },
                        _ => Failure {
                            stage,
                            error: err.to_string(),
                        },
                    });
                }
            }
        }
        walk
    }

    async fn record_account(&self, spec: &AttemptSpec, identity: &Identity) {
        let account = AccountRecord {
            run_id: spec.run_id.clone(),
            address: identity.address.clone(),
            handle: identity.handle.clone(),
            created_at: Utc::now(),
        };
        if let Err(e) = self.sink.record_account(&account).await {
            tracing::warn!(error = %e, "failed to record account");
        }
    }
}

#[derive(Default)]
struct Walk {
    stages: Vec<StageResult>,
    used_fallback: bool,
    failure: Option<Failure>,
}

struct Failure {
    stage: Stage,
    error: String,
}

#[async_trait]
impl<P, I, W, K> AttemptExecutor for AttemptRunner<P, I, W, K>
where
    P: SessionProvider,
    I: IdentityService,
    W: InboxWatcher,
    K: PersistenceSink,
{
    async fn execute(&self, spec: AttemptSpec) -> Result<AttemptResult, AttemptError> {
        let span = tracing::info_span!(
            "attempt",
            run_id = %spec.run_id,
            attempt_id = %spec.attempt_id,
            ordinal = spec.ordinal,
        );
        async move {
            let start = Instant::now();
            let identity = self
                .identities
                .mint(spec.params.identity_domain.as_deref())
                .await?;
            let session = self.sessions.acquire(spec.params.proxy.as_deref()).await?;
            let lease = SessionLease::new(self.sessions.clone(), session);

            let walk = match lease.session() {
                Some(session) => self.drive(&spec, session, &identity).await,
                None => return Err(AttemptError::LeaseReleased),
            };
            lease.release().await;

            let success = walk.failure.is_none();
            let result = AttemptResult {
                success,
                credits_earned: if success { spec.credits_per_success } else { 0 },
                failed_stage: walk.failure.as_ref().map(|f| f.stage),
                error: walk.failure.map(|f| f.error),
                execution_time_ms: start.elapsed().as_millis() as u64,
                stages: walk.stages,
                identity: Some(identity.record()),
                used_fallback: walk.used_fallback,
            };
            if result.success {
                tracing::info!(
                    elapsed_ms = result.execution_time_ms,
                    fallback = result.used_fallback,
                    "attempt succeeded"
                );
            } else {
                tracing::warn!(
                    elapsed_ms = result.execution_time_ms,
                    stage = result.failed_stage_label(),
                    error = result.error.as_deref().unwrap_or_default(),
                    "attempt failed"
                );
            }
            Ok(result)
        }
        .instrument(span)
        .await
    }
}

/// Exclusive hold on a browser session.
///
/// Released explicitly on the normal path. If the owning future is dropped
/// first (aborted attempt, panic), release is scheduled on the runtime.
pub struct SessionLease<P: SessionProvider> {
    provider: P,
    session: Option<P::Session>,
}

impl<P: SessionProvider> SessionLease<P> {
    pub fn new(provider: P, session: P::Session) -> Self {
        Self {
            provider,
            session: Some(session),
        }
    }

    pub fn session(&self) -> Option<&P::Session> {
        self.session.as_ref()
    }

    pub async fn release(mut self) {
        if let Some(session) = self.session.take() {
            let id = session.id().to_string();
            if let Err(e) = self.provider.release(session).await {
                tracing::warn!(session_id = %id, error = %e, "session release failed");
            }
        }
    }
}

impl<P: SessionProvider> Drop for SessionLease<P> {
    fn drop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        let id = session.id().to_string();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let provider = self.provider.clone();
                handle.spawn(async move {
                    if let Err(e) = provider.release(session).await {
                        tracing::warn!(session_id = %id, error = %e, "deferred release failed");
                    }
                });
            }
            Err(_) => tracing::error!(session_id = %id, "session leaked: no runtime to release on"),
        }
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
