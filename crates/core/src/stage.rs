// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow stages and their per-invocation results

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// One step of the signup workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Enroll,
    ConfirmEmail,
    Onboard,
    SelectArtifact,
    Publish,
    /// Fallback path: fork the designated fallback artifact
    Recovery,
}

impl Stage {
    /// The primary path, in execution order
    pub const PRIMARY: [Stage; 5] = [
        Stage::Enroll,
        Stage::ConfirmEmail,
        Stage::Onboard,
        Stage::SelectArtifact,
        Stage::Publish,
    ];

    /// Next stage on the primary path
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Enroll => Some(Stage::ConfirmEmail),
            Stage::ConfirmEmail => Some(Stage::Onboard),
            Stage::Onboard => Some(Stage::SelectArtifact),
            Stage::SelectArtifact => Some(Stage::Publish),
            Stage::Recovery => Some(Stage::Publish),
            Stage::Publish => None,
        }
    }

    /// Whether a failure in this stage diverts to Recovery instead of
    /// failing the attempt
    pub fn falls_back_to_recovery(self) -> bool {
        matches!(
            self,
            Stage::ConfirmEmail | Stage::Onboard | Stage::SelectArtifact
        )
    }

    /// Machine-readable name
    pub fn name(self) -> &'static str {
        match self {
            Stage::Enroll => "enroll",
            Stage::ConfirmEmail => "confirm_email",
            Stage::Onboard => "onboard",
            Stage::SelectArtifact => "select_artifact",
            Stage::Publish => "publish",
            Stage::Recovery => "recovery",
        }
    }

    /// Human-readable label used in reports
    pub fn label(self) -> &'static str {
        match self {
            Stage::Enroll => "Account creation",
            Stage::ConfirmEmail => "Email confirmation",
            Stage::Onboard => "Onboarding",
            Stage::SelectArtifact => "Artifact selection",
            Stage::Publish => "Publish",
            Stage::Recovery => "Fallback recovery",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of a single stage invocation. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageResult {
    pub stage: Stage,
    pub success: bool,
    pub elapsed_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Set when the stage ran on the recovery path
    #[serde(default)]
    pub used_fallback: bool,
}

impl StageResult {
    pub fn succeeded(stage: Stage, elapsed: Duration, used_fallback: bool) -> Self {
        Self {
            stage,
            success: true,
            elapsed_ms: elapsed.as_millis() as u64,
            error: None,
            used_fallback,
        }
    }

    pub fn failed(
        stage: Stage,
        elapsed: Duration,
        error: impl Into<String>,
        used_fallback: bool,
    ) -> Self {
        Self {
            stage,
            success: false,
            elapsed_ms: elapsed.as_millis() as u64,
            error: Some(error.into()),
            used_fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_path_links_in_order() {
        let mut walked = vec![Stage::Enroll];
        while let Some(next) = walked.last().and_then(|s| s.next()) {
            walked.push(next);
        }
        assert_eq!(walked, Stage::PRIMARY.to_vec());
    }

    #[test]
    fn recovery_rejoins_at_publish() {
        assert_eq!(Stage::Recovery.next(), Some(Stage::Publish));
    }

    #[test]
    fn only_middle_stages_fall_back() {
        let fallback: Vec<Stage> = Stage::PRIMARY
            .into_iter()
            .filter(|s| s.falls_back_to_recovery())
            .collect();
        assert_eq!(
            fallback,
            vec![Stage::ConfirmEmail, Stage::Onboard, Stage::SelectArtifact]
        );
        assert!(!Stage::Recovery.falls_back_to_recovery());
    }

    #[test]
    fn stage_result_serializes_snake_case_stage() {
        let result = StageResult::failed(
            Stage::SelectArtifact,
            Duration::from_millis(42),
            "no eligible artifact",
            false,
        );
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["stage"], "select_artifact");
        assert_eq!(json["elapsed_ms"], 42);
        assert_eq!(json["error"], "no eligible artifact");
    }
}
