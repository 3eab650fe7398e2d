// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TOML configuration
//!
//! ```toml
//! [target]
//! domain = "app.example.test"
//! referral_url = "https://app.example.test/invite/abc123"
//! fallback_artifact_url = "https://app.example.test/projects/starter"
//!
//! [timeouts]
//! visibility = "10s"
//! pause = "400ms"
//!
//! [run]
//! total_users = 5
//! concurrency = 2
//! mode = "adaptive"
//! ```

use crate::attempt::AttemptParams;
use crate::run::{RunConfig, RunConfigError, ScheduleMode, DEFAULT_CREDITS_PER_SUCCESS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid run defaults: {0}")]
    Run(#[from] RunConfigError),
    #[error("invalid target: {0}")]
    Target(String),
    #[error("invalid {field}: {reason}")]
    Field { field: &'static str, reason: String },
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FlockConfig {
    pub target: TargetConfig,
    pub timeouts: TimeoutConfig,
    pub inbox: InboxConfig,
    pub scheduler: SchedulerConfig,
    pub run: RunDefaults,
}

/// The signup surface being exercised
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TargetConfig {
    /// Host the confirmation links and fallback artifact must live on
    pub domain: String,
    /// Entry point of the funnel
    pub referral_url: String,
    /// URL fragment identifying the enrollment page
    pub enroll_path: String,
    /// Artifact forked by the recovery stage
    pub fallback_artifact_url: String,
    /// Artifacts never picked by random selection (matched on id or title)
    pub artifact_denylist: Vec<String>,
    /// Number of options for each onboarding question
    pub onboarding_choices: Vec<u8>,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            domain: "app.example.test".to_string(),
            referral_url: "https://app.example.test/invite/demo".to_string(),
            enroll_path: "/signup".to_string(),
            fallback_artifact_url: "https://app.example.test/projects/starter".to_string(),
            artifact_denylist: Vec::new(),
            onboarding_choices: vec![4, 4, 3],
        }
    }
}

/// Base durations before degraded-network scaling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimeoutConfig {
    #[serde(with = "humantime_serde")]
    pub visibility: Duration,
    #[serde(with = "humantime_serde")]
    pub navigation: Duration,
    #[serde(with = "humantime_serde")]
    pub pause: Duration,
    /// How long to look for the ineligibility notice after enrolling
    #[serde(with = "humantime_serde")]
    pub ineligible_probe: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            visibility: Duration::from_secs(10),
            navigation: Duration::from_secs(30),
            pause: Duration::from_millis(500),
            ineligible_probe: Duration::from_secs(2),
        }
    }
}

impl TimeoutConfig {
    /// Minimal timings, for simulations that should not wait
    pub fn instant() -> Self {
        Self {
            visibility: Duration::from_millis(50),
            navigation: Duration::from_millis(50),
            pause: Duration::ZERO,
            ineligible_probe: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InboxConfig {
    pub max_attempts: u32,
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
}

impl Default for InboxConfig {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            poll_interval: Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Delay before each admission, staggering session startup
    #[serde(with = "humantime_serde")]
    pub attempt_stagger: Duration,
    /// Period of the live-metrics tick
    #[serde(with = "humantime_serde")]
    pub metrics_interval: Duration,
    /// How long settled attempts stay in the live registry
    #[serde(with = "humantime_serde")]
    pub eviction_grace: Duration,
    /// Settled attempts retained per run after eviction
    pub history_limit: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            attempt_stagger: Duration::from_millis(500),
            metrics_interval: Duration::from_secs(1),
            eviction_grace: Duration::from_secs(30),
            history_limit: 1000,
        }
    }
}

/// Defaults for runs created from the CLI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunDefaults {
    pub total_users: u32,
    pub concurrency: u32,
    pub mode: ScheduleMode,
    pub credits_per_success: u64,
    pub degraded: bool,
    pub proxy: Option<String>,
    pub identity_domain: Option<String>,
    pub inject_select_failure: bool,
}

impl Default for RunDefaults {
    fn default() -> Self {
        Self {
            total_users: 1,
            concurrency: 1,
            mode: ScheduleMode::Fixed,
            credits_per_success: DEFAULT_CREDITS_PER_SUCCESS,
            degraded: false,
            proxy: None,
            identity_domain: None,
            inject_select_failure: false,
        }
    }
}

impl RunDefaults {
    pub fn to_run_config(&self) -> RunConfig {
        RunConfig {
            label: None,
            total_users: self.total_users,
            concurrency: self.concurrency,
            mode: self.mode,
            params: AttemptParams {
                proxy: self.proxy.clone(),
                degraded: self.degraded,
                identity_domain: self.identity_domain.clone(),
                inject_select_failure: self.inject_select_failure,
            },
            credits_per_success: self.credits_per_success,
        }
    }
}

impl FlockConfig {
    /// Parse and validate a TOML document
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: FlockConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&content)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.run.to_run_config().validate()?;

        let target = &self.target;
        if target.domain.trim().is_empty() {
            return Err(ConfigError::Target("domain must not be empty".to_string()));
        }
        if url_host(&target.fallback_artifact_url).map(|h| host_on_domain(h, &target.domain))
            != Some(true)
        {
            return Err(ConfigError::Target(format!(
                "fallback artifact {} is not on {}",
                target.fallback_artifact_url, target.domain
            )));
        }
        if url_host(&target.referral_url).is_none() {
            return Err(ConfigError::Target(format!(
                "referral url {} is not an http(s) url",
                target.referral_url
            )));
        }
        if target.onboarding_choices.contains(&0) {
            return Err(ConfigError::Field {
                field: "target.onboarding_choices",
                reason: "every question needs at least one option".to_string(),
            });
        }
        if self.inbox.max_attempts == 0 {
            return Err(ConfigError::Field {
                field: "inbox.max_attempts",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.scheduler.metrics_interval.is_zero() {
            return Err(ConfigError::Field {
                field: "scheduler.metrics_interval",
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Host part of an http(s) URL, lowercased by the caller's comparison
pub fn url_host(url: &str) -> Option<&str> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    let authority = rest.split(['/', '?', '#']).next()?;
    let host = authority.rsplit('@').next()?;
    let host = host.split(':').next()?;
    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

/// Whether `host` is `domain` or one of its subdomains
pub fn host_on_domain(host: &str, domain: &str) -> bool {
    let host = host.to_ascii_lowercase();
    let domain = domain.to_ascii_lowercase();
    host == domain || host.ends_with(&format!(".{}", domain))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
