// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Isolated browser sessions
//!
//! Stages address the page through semantic [`Element`]s. Mapping an
//! element to a concrete DOM lookup is the browser adapter's concern.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// A UI element the workflow interacts with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Element {
    EmailInput,
    HandleInput,
    PasswordInput,
    EnrollSubmit,
    /// Shown when the identity is rejected for the referral program
    IneligibleNotice,
    /// Shown when a confirmation link is rejected
    ConfirmErrorBanner,
    OnboardingOption { question: u8, choice: u8 },
    OnboardingContinue,
    /// Duplicate the open artifact into the account
    ForkButton,
    PublishButton,
    PublishConfirm,
    PublishFinalConfirm,
    PublishedBadge,
}

impl Element {
    /// Whether two elements are the same kind, ignoring option indices
    pub fn same_kind(&self, other: &Element) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::OnboardingOption { question, choice } => {
                write!(f, "onboarding option {}/{}", question, choice)
            }
            other => write!(f, "{:?}", other),
        }
    }
}

/// An artifact offered for selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    pub id: String,
    pub title: String,
    pub url: String,
}

/// Errors from session operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("element not found: {0}")]
    ElementNotFound(Element),
    #[error("timed out after {after:?} waiting for {what}")]
    Timeout { what: String, after: Duration },
    #[error("navigation failed: {0}")]
    Navigation(String),
    #[error("could not acquire session: {0}")]
    Acquire(String),
    #[error("session closed: {0}")]
    Closed(String),
}

impl SessionError {
    /// Transient conditions a stage may retry within its own budget
    pub fn is_transient(&self) -> bool {
        matches!(self, SessionError::ElementNotFound(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, SessionError::Timeout { .. })
    }
}

/// One isolated browser context, exclusively held by an attempt
#[async_trait]
pub trait BrowserSession: Send + Sync + 'static {
    /// Stable identifier for logging
    fn id(&self) -> &str;

    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), SessionError>;

    async fn current_url(&self) -> Result<String, SessionError>;

    /// Wait until the element is visible. `Timeout` if it never shows.
    async fn wait_visible(&self, element: Element, timeout: Duration) -> Result<(), SessionError>;

    /// Immediate visibility check, no waiting
    async fn is_visible(&self, element: Element) -> Result<bool, SessionError>;

    async fn fill(
        &self,
        element: Element,
        value: &str,
        timeout: Duration,
    ) -> Result<(), SessionError>;

    async fn click(&self, element: Element, timeout: Duration) -> Result<(), SessionError>;

    /// Wait until the URL no longer contains `fragment`. Returns the new URL.
    async fn wait_for_url_change(
        &self,
        fragment: &str,
        timeout: Duration,
    ) -> Result<String, SessionError>;

    async fn reload(&self, timeout: Duration) -> Result<(), SessionError>;

    /// Artifacts currently offered on the page
    async fn list_artifacts(&self, timeout: Duration) -> Result<Vec<ArtifactRef>, SessionError>;
}

/// Hands out isolated sessions and tears them down
#[async_trait]
pub trait SessionProvider: Clone + Send + Sync + 'static {
    type Session: BrowserSession;

    async fn acquire(&self, proxy: Option<&str>) -> Result<Self::Session, SessionError>;

    /// Tear down the context and remove its transient storage
    async fn release(&self, session: Self::Session) -> Result<(), SessionError>;
}
