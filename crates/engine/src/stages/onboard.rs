// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Onboarding questionnaire

use super::StageContext;
use crate::error::StageError;
use flock_adapters::{BrowserSession, Element, InboxWatcher};
use rand::Rng;

/// Answer every question with a random valid option
pub(super) async fn run<S: BrowserSession, W: InboxWatcher>(
    cx: &StageContext<'_, S, W>,
) -> Result<(), StageError> {
    let choices = &cx.config.target.onboarding_choices;
    for (question, &options) in choices.iter().enumerate() {
        let question = question as u8;
        let choice = rand::thread_rng().gen_range(0..options.max(1));
        tracing::debug!(question, choice, "answering");

        cx.click(Element::OnboardingOption { question, choice })
            .await?;
        cx.pause().await;
        cx.click(Element::OnboardingContinue).await?;
    }
    cx.session
        .wait_for_url_change("/onboarding", cx.navigation())
        .await?;
    Ok(())
}
