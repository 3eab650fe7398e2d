// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::identity::{Identity, IdentityError, IdentityService};
use crate::inbox::{InboxError, InboxWatcher, Message};
use crate::session::{ArtifactRef, BrowserSession, Element, SessionError, SessionProvider};
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::Instrument;

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// Wrapper that adds tracing to any SessionProvider
#[derive(Clone)]
pub struct TracedSessionProvider<P> {
    inner: P,
}

impl<P> TracedSessionProvider<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<P: SessionProvider> SessionProvider for TracedSessionProvider<P> {
    type Session = TracedSession<P::Session>;

    async fn acquire(&self, proxy: Option<&str>) -> Result<Self::Session, SessionError> {
        let span = tracing::info_span!("session.acquire", proxied = proxy.is_some());
        async {
            let start = Instant::now();
            let result = self.inner.acquire(proxy).await;
            match &result {
                Ok(session) => tracing::info!(
                    session_id = session.id(),
                    elapsed_ms = elapsed_ms(start),
                    "session acquired"
                ),
                Err(e) => tracing::error!(
                    elapsed_ms = elapsed_ms(start),
                    error = %e,
                    "acquire failed"
                ),
            }
            result.map(|inner| TracedSession { inner })
        }
        .instrument(span)
        .await
    }

    async fn release(&self, session: Self::Session) -> Result<(), SessionError> {
        let span = tracing::info_span!("session.release", session_id = session.id());
        async move {
            let result = self.inner.release(session.inner).await;
            // release failing is usually harmless (context already gone)
            match &result {
                Ok(()) => tracing::info!("session released"),
                Err(e) => tracing::warn!(error = %e, "release failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

/// A session whose interactions are logged at debug level
pub struct TracedSession<S> {
    inner: S,
}

impl<S> TracedSession<S> {
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

fn log_step<T>(
    op: &str,
    subject: &dyn std::fmt::Display,
    start: Instant,
    result: &Result<T, SessionError>,
) {
    let elapsed_ms = elapsed_ms(start);
    match result {
        Ok(_) => tracing::debug!(op, %subject, elapsed_ms, "ok"),
        Err(e) if e.is_transient() => {
            tracing::debug!(op, %subject, elapsed_ms, error = %e, "transient")
        }
        Err(e) => tracing::warn!(op, %subject, elapsed_ms, error = %e, "failed"),
    }
}

#[async_trait]
impl<S: BrowserSession> BrowserSession for TracedSession<S> {
    fn id(&self) -> &str {
        self.inner.id()
    }

    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), SessionError> {
        let start = Instant::now();
        let result = self.inner.goto(url, timeout).await;
        log_step("goto", &url, start, &result);
        result
    }

    async fn current_url(&self) -> Result<String, SessionError> {
        self.inner.current_url().await
    }

    async fn wait_visible(&self, element: Element, timeout: Duration) -> Result<(), SessionError> {
        let start = Instant::now();
        let result = self.inner.wait_visible(element, timeout).await;
        log_step("wait_visible", &element, start, &result);
        result
    }

    async fn is_visible(&self, element: Element) -> Result<bool, SessionError> {
        let result = self.inner.is_visible(element).await;
        tracing::trace!(%element, visible = ?result.as_ref().ok(), "checked");
        result
    }

    async fn fill(
        &self,
        element: Element,
        value: &str,
        timeout: Duration,
    ) -> Result<(), SessionError> {
        let start = Instant::now();
        let result = self.inner.fill(element, value, timeout).await;
        log_step("fill", &element, start, &result);
        result
    }

    async fn click(&self, element: Element, timeout: Duration) -> Result<(), SessionError> {
        let start = Instant::now();
        let result = self.inner.click(element, timeout).await;
        log_step("click", &element, start, &result);
        result
    }

    async fn wait_for_url_change(
        &self,
        fragment: &str,
        timeout: Duration,
    ) -> Result<String, SessionError> {
        let start = Instant::now();
        let result = self.inner.wait_for_url_change(fragment, timeout).await;
        log_step("wait_for_url_change", &fragment, start, &result);
        result
    }

    async fn reload(&self, timeout: Duration) -> Result<(), SessionError> {
        let start = Instant::now();
        let result = self.inner.reload(timeout).await;
        log_step("reload", &self.inner.id(), start, &result);
        result
    }

    async fn list_artifacts(&self, timeout: Duration) -> Result<Vec<ArtifactRef>, SessionError> {
        let result = self.inner.list_artifacts(timeout).await;
        tracing::debug!(count = result.as_ref().map(Vec::len).ok(), "listed artifacts");
        result
    }
}

/// Wrapper that adds tracing to any IdentityService
#[derive(Clone)]
pub struct TracedIdentityService<I> {
    inner: I,
}

impl<I> TracedIdentityService<I> {
    pub fn new(inner: I) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<I: IdentityService> IdentityService for TracedIdentityService<I> {
    async fn mint(&self, domain: Option<&str>) -> Result<Identity, IdentityError> {
        let result = self.inner.mint(domain).await;
        match &result {
            Ok(identity) => tracing::info!(address = %identity.address, "identity minted"),
            Err(e) => tracing::error!(error = %e, "mint failed"),
        }
        result
    }
}

/// Wrapper that adds tracing to any InboxWatcher
#[derive(Clone)]
pub struct TracedInboxWatcher<W> {
    inner: W,
}

impl<W> TracedInboxWatcher<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<W: InboxWatcher> InboxWatcher for TracedInboxWatcher<W> {
    async fn await_confirmation(
        &self,
        identity: &Identity,
        max_attempts: u32,
        interval: Duration,
    ) -> Result<Message, InboxError> {
        let span = tracing::info_span!("inbox.await", address = %identity.address, max_attempts);
        async {
            tracing::debug!(interval_ms = interval.as_millis() as u64, "polling");
            let start = Instant::now();
            let result = self
                .inner
                .await_confirmation(identity, max_attempts, interval)
                .await;
            match &result {
                Ok(message) => tracing::info!(
                    message_id = %message.id,
                    elapsed_ms = elapsed_ms(start),
                    "confirmation received"
                ),
                Err(e) => tracing::warn!(
                    elapsed_ms = elapsed_ms(start),
                    error = %e,
                    "no confirmation"
                ),
            }
            result
        }
        .instrument(span)
        .await
    }

    fn extract_confirmation_link(&self, message: &Message) -> Result<String, InboxError> {
        let result = self.inner.extract_confirmation_link(message);
        if let Err(e) = &result {
            tracing::warn!(message_id = %message.id, error = %e, "link extraction failed");
        }
        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
