// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Email confirmation

use super::StageContext;
use crate::error::StageError;
use flock_adapters::{BrowserSession, Element, InboxWatcher};
use flock_core::config::{host_on_domain, url_host};

pub(super) async fn run<S: BrowserSession, W: InboxWatcher>(
    cx: &StageContext<'_, S, W>,
) -> Result<(), StageError> {
    let inbox = &cx.config.inbox;
    let message = cx
        .inbox
        .await_confirmation(cx.identity, inbox.max_attempts, inbox.poll_interval)
        .await?;
    let link = cx.inbox.extract_confirmation_link(&message)?;
    validate_link(&link, &cx.config.target.domain)?;

    cx.session.goto(&link, cx.navigation()).await?;
    cx.pause().await;
    if cx.session.is_visible(Element::ConfirmErrorBanner).await? {
        return Err(StageError::ConfirmationRejected);
    }
    cx.session
        .wait_for_url_change("/auth/confirm", cx.navigation())
        .await?;
    Ok(())
}

/// The link must be http(s) and point at the target domain
pub(crate) fn validate_link(link: &str, domain: &str) -> Result<(), StageError> {
    match url_host(link) {
        Some(host) if host_on_domain(host, domain) => Ok(()),
        _ => Err(StageError::InvalidConfirmationLink {
            link: link.to_string(),
            domain: domain.to_string(),
        }),
    }
}
