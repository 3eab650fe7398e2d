// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Account creation

use super::StageContext;
use crate::error::StageError;
use flock_adapters::{BrowserSession, Element, InboxWatcher};

/// Submit the identity through the referral entry point and wait for the
/// browser to leave the enrollment page.
pub(super) async fn run<S: BrowserSession, W: InboxWatcher>(
    cx: &StageContext<'_, S, W>,
) -> Result<(), StageError> {
    let target = &cx.config.target;
    cx.session
        .goto(&target.referral_url, cx.navigation())
        .await?;

    cx.fill(Element::EmailInput, &cx.identity.address).await?;
    cx.fill(Element::HandleInput, &cx.identity.handle).await?;
    cx.fill(Element::PasswordInput, &cx.identity.secret).await?;
    cx.pause().await;
    cx.click(Element::EnrollSubmit).await?;

    // Rejections show a notice instead of navigating
    let probe = cx.policy.visibility(cx.config.timeouts.ineligible_probe);
    let ineligible = if probe.is_zero() {
        cx.session.is_visible(Element::IneligibleNotice).await?
    } else {
        cx.session
            .wait_visible(Element::IneligibleNotice, probe)
            .await
            .is_ok()
    };
    if ineligible {
        return Err(StageError::Ineligible);
    }

    cx.session
        .wait_for_url_change(&target.enroll_path, cx.navigation())
        .await?;
    Ok(())
}
