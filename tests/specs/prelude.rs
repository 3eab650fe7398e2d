//! Shared helpers for behavioral specifications.

use assert_cmd::assert::Assert;
use predicates::prelude::*;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

/// Timings that let simulated runs finish in milliseconds
pub const FAST_CONFIG: &str = r#"
[timeouts]
visibility = "50ms"
navigation = "50ms"
pause = "0ms"
ineligible_probe = "0ms"

[inbox]
max_attempts = 2
poll_interval = "1ms"

[scheduler]
attempt_stagger = "0ms"
metrics_interval = "50ms"
"#;

/// A scratch directory the CLI runs in, isolated from the user's config
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    /// A project with `flock.toml` holding [`FAST_CONFIG`]
    pub fn fast() -> Self {
        let project = Self::empty();
        project.file("flock.toml", FAST_CONFIG);
        project
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, rel: &str, content: &str) {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(rel)).unwrap()
    }

    pub fn flock(&self) -> Cli {
        let mut cmd = assert_cmd::Command::cargo_bin("flock").unwrap();
        cmd.current_dir(self.path())
            .env("HOME", self.path())
            .env("XDG_CONFIG_HOME", self.path().join(".config"))
            .env_remove("RUST_LOG")
            .timeout(Duration::from_secs(60));
        Cli { cmd }
    }

    /// `flock run --config flock.toml <args>`
    pub fn run(&self, args: &[&str]) -> Cli {
        self.flock().args(&["run", "--config", "flock.toml"]).args(args)
    }
}

pub struct Cli {
    cmd: assert_cmd::Command,
}

impl Cli {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn passes(mut self) -> Outcome {
        Outcome(self.cmd.assert().success())
    }

    pub fn fails(mut self) -> Outcome {
        Outcome(self.cmd.assert().failure())
    }
}

pub struct Outcome(Assert);

impl Outcome {
    pub fn stdout_has(self, expected: &str) -> Self {
        Self(self.0.stdout(predicate::str::contains(expected)))
    }

    pub fn stdout_lacks(self, unexpected: &str) -> Self {
        Self(self.0.stdout(predicate::str::contains(unexpected).not()))
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        Self(self.0.stderr(predicate::str::contains(expected)))
    }

    pub fn stdout_json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.0.get_output().stdout).unwrap()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.0.get_output().stderr).into_owned()
    }
}
