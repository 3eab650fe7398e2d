// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Confirmation inbox polling

use crate::identity::Identity;
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;

// Quotes and angle brackets end a link inside HTML attributes
#[allow(clippy::expect_used)]
static LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s"'<>]+"#).expect("constant regex pattern is valid")
});

/// Sentence punctuation that never ends a confirmation link
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']'];

/// First http(s) link in `body` that looks like a confirmation link
pub fn find_confirmation_link(body: &str) -> Option<&str> {
    LINK_PATTERN
        .find_iter(body)
        .map(|m| m.as_str().trim_end_matches(TRAILING_PUNCTUATION))
        .find(|link| link.contains("confirm") || link.contains("verify"))
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InboxError {
    #[error("no confirmation message for {address} after {attempts} polls")]
    Timeout { address: String, attempts: u32 },
    #[error("no confirmation link in message {0}")]
    LinkNotFound(String),
    #[error("inbox unavailable: {0}")]
    Unavailable(String),
}

/// A received message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait InboxWatcher: Clone + Send + Sync + 'static {
    /// Poll up to `max_attempts` times, `interval` apart
    async fn await_confirmation(
        &self,
        identity: &Identity,
        max_attempts: u32,
        interval: Duration,
    ) -> Result<Message, InboxError>;

    /// First http(s) link in the body that looks like a confirmation link
    fn extract_confirmation_link(&self, message: &Message) -> Result<String, InboxError> {
        find_confirmation_link(&message.body)
            .map(str::to_string)
            .ok_or_else(|| InboxError::LinkNotFound(message.id.clone()))
    }
}
