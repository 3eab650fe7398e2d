// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `flock config` - Configuration commands

use crate::error::FlockError;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use clap::{Args, Subcommand};
use flock_core::FlockConfig;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Validate a config file and print the resolved configuration
    Check {
        /// Config file (default: the user config file, if present)
        path: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

/// Where the effective configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "{}", path.display()),
            ConfigSource::Defaults => f.write_str("built-in defaults"),
        }
    }
}

/// `<config dir>/flock/flock.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("flock").join("flock.toml"))
}

/// Resolve the configuration: an explicit path must exist, otherwise the
/// user config file is used when present, then the built-in defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<(FlockConfig, ConfigSource)> {
    let path = match explicit {
        Some(path) if !path.exists() => return Err(FlockError::config_not_found(path).into()),
        Some(path) => path.to_path_buf(),
        None => match default_config_path().filter(|p| p.exists()) {
            Some(path) => path,
            None => return Ok((FlockConfig::default(), ConfigSource::Defaults)),
        },
    };
    let config = FlockConfig::load(&path).map_err(|e| FlockError::config_invalid(&path, e))?;
    Ok((config, ConfigSource::File(path)))
}

#[derive(Serialize)]
struct CheckReport {
    source: String,
    config: FlockConfig,
    #[serde(skip)]
    rendered: String,
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Configuration OK ({})", self.source)?;
        writeln!(f)?;
        write!(f, "{}", self.rendered.trim_end())
    }
}

pub fn handle(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommand::Check { path, format } => {
            let (config, source) = load_config(path.as_deref())?;
            let rendered = toml::to_string_pretty(&config)?;
            let report = CheckReport {
                source: source.to_string(),
                config,
                rendered,
            };
            output::print(&report, format);
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
