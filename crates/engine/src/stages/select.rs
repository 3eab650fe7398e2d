// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Artifact selection

use super::StageContext;
use crate::error::StageError;
use flock_adapters::{ArtifactRef, BrowserSession, InboxWatcher};
use rand::seq::SliceRandom;

pub(super) async fn run<S: BrowserSession, W: InboxWatcher>(
    cx: &StageContext<'_, S, W>,
) -> Result<(), StageError> {
    if cx.params.inject_select_failure {
        return Err(StageError::InjectedFailure);
    }

    let listed = cx.session.list_artifacts(cx.visibility()).await?;
    let eligible = eligible(&listed, &cx.config.target.artifact_denylist);
    let picked = eligible
        .choose(&mut rand::thread_rng())
        .map(|artifact| (*artifact).clone())
        .ok_or(StageError::NoEligibleArtifacts)?;
    tracing::info!(artifact = %picked.id, candidates = eligible.len(), "selected artifact");

    cx.fork_artifact(&picked.url).await
}

/// Artifacts not named on the denylist by id or title
pub(crate) fn eligible<'a>(
    artifacts: &'a [ArtifactRef],
    denylist: &[String],
) -> Vec<&'a ArtifactRef> {
    artifacts
        .iter()
        .filter(|a| {
            !denylist
                .iter()
                .any(|d| d.eq_ignore_ascii_case(&a.id) || d.eq_ignore_ascii_case(&a.title))
        })
        .collect()
}
