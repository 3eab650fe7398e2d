// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-friendly error display with context and suggestions.
//!
//! Errors carry:
//! - What went wrong (message)
//! - Why it might have happened (context)
//! - How to fix it (suggestions)

use flock_core::ConfigError;
use flock_engine::OrchestratorError;
use std::fmt;
use std::path::Path;

/// Error with context and recovery suggestions for user-friendly display.
#[derive(Debug)]
pub struct FlockError {
    /// What went wrong
    pub message: String,
    /// Why it might have happened
    pub context: Vec<String>,
    /// How to fix it
    pub suggestions: Vec<String>,
    /// Original error if any
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl FlockError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: Vec::new(),
            suggestions: Vec::new(),
            source: None,
        }
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for FlockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "error: {}", self.message)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            for ctx in &self.context {
                writeln!(f, "  -> {}", ctx)?;
            }
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            writeln!(f, "suggestions:")?;
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for FlockError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Builders for the failures users actually hit.
impl FlockError {
    /// An explicitly requested config file does not exist.
    pub fn config_not_found(path: &Path) -> Self {
        FlockError::new(format!("Config file '{}' not found", path.display()))
            .with_suggestion("Check the path passed to --config")
            .with_suggestion("Omit --config to use the built-in defaults")
    }

    /// A config file exists but does not parse or validate.
    pub fn config_invalid(path: &Path, error: ConfigError) -> Self {
        FlockError::new(format!("Invalid configuration in '{}'", path.display()))
            .with_context(error.to_string())
            .with_suggestion(format!("Validate it with: flock config check {}", path.display()))
            .with_source(error)
    }

    /// The orchestrator refused to create or start the run.
    pub fn run_rejected(error: OrchestratorError) -> Self {
        let err = FlockError::new("Run could not be started").with_context(error.to_string());
        let err = match &error {
            OrchestratorError::InvalidConfig(_) => err
                .with_suggestion("Use --users of at least 1")
                .with_suggestion("Use --concurrency between 1 and 10"),
            _ => err,
        };
        err.with_source(error)
    }
}
