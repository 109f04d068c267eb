// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for behavioral specs

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

/// Backend configuration with a prefix mapping
pub const PREFIX_CONFIG: &str = r#"
[backend]
hostname = "127.0.0.1:9"
organization = "acme"

[backend.workspaces]
prefix = "networking-"
"#;

/// Backend configuration bound to a single remote workspace
pub const NAMED_CONFIG: &str = r#"
[backend]
hostname = "127.0.0.1:9"
organization = "acme"

[backend.workspaces]
name = "networking-prod"
"#;

/// Backend configuration without any workspace mapping
pub const UNMAPPED_CONFIG: &str = r#"
[backend]
hostname = "127.0.0.1:9"
organization = "acme"
"#;

/// Temporary project directory the CLI runs in
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    /// Project with `relay.toml` already written
    pub fn with_config(config: &str) -> Self {
        let project = Self::empty();
        project.file("relay.toml", config);
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

    /// `relay` command isolated from the caller's environment
    pub fn relay(&self) -> Cli {
        let mut cmd = Command::cargo_bin("relay").unwrap();
        cmd.current_dir(self.path())
            .env_remove("RELAY_CONFIG")
            .env_remove("RELAY_HOSTNAME")
            .env_remove("RELAY_ORGANIZATION")
            .env_remove("RELAY_TOKEN")
            .env_remove("RELAY_WORKSPACE")
            .env_remove("RELAY_LOG_FILE")
            .env("RUST_LOG", "off");
        Cli { cmd }
    }
}

/// Fluent wrapper over one CLI invocation
pub struct Cli {
    cmd: Command,
}

impl Cli {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.cmd.env(key, value);
        self
    }

    pub fn passes(mut self) -> Outcome {
        Outcome(self.cmd.assert().success())
    }

    /// Runtime failure (exit code 1)
    pub fn fails(mut self) -> Outcome {
        Outcome(self.cmd.assert().code(1))
    }

    /// Usage error rejected by argument parsing (exit code 2)
    pub fn rejected(mut self) -> Outcome {
        Outcome(self.cmd.assert().code(2))
    }
}

pub struct Outcome(assert_cmd::assert::Assert);

impl Outcome {
    pub fn stdout_has(self, needle: &str) -> Self {
        Self(self.0.stdout(predicate::str::contains(needle)))
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        Self(self.0.stderr(predicate::str::contains(needle)))
    }

    pub fn stderr_lacks(self, needle: &str) -> Self {
        Self(self.0.stderr(predicate::str::contains(needle).not()))
    }
}
