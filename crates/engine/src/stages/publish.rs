// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Publish with double confirmation

use super::StageContext;
use crate::error::StageError;
use flock_adapters::{BrowserSession, Element, InboxWatcher};

/// Lookups of the publish button: the initial one plus two retries
pub const PUBLISH_LOOKUPS: u32 = 3;

pub(super) async fn run<S: BrowserSession, W: InboxWatcher>(
    cx: &StageContext<'_, S, W>,
) -> Result<(), StageError> {
    let mut lookup = 1;
    loop {
        match cx.wait_visible(Element::PublishButton).await {
            Ok(()) => break,
            Err(e) if lookup >= PUBLISH_LOOKUPS => {
                return Err(if e.is_timeout() {
                    StageError::PublishTimeout { lookups: lookup }
                } else {
                    StageError::Session(e)
                });
            }
            Err(e) => {
                tracing::debug!(lookup, error = %e, "publish button missing, reloading");
                cx.session.reload(cx.navigation()).await?;
                lookup += 1;
            }
        }
    }

    cx.click(Element::PublishButton).await?;
    cx.pause().await;
    cx.click(Element::PublishConfirm).await?;
    cx.pause().await;
    cx.click(Element::PublishFinalConfirm).await?;
    cx.session
        .wait_visible(Element::PublishedBadge, cx.navigation())
        .await?;
    Ok(())
}
