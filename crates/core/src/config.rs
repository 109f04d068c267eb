// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backend configuration (`relay.toml`)
//!
//! The file is parsed into `Raw*` structs that mirror the TOML layout, then
//! validated into a [`BackendConfig`]. Environment variables override the
//! connection settings.

use crate::log::{LogFilter, LogKind};
use crate::workspace::WorkspaceMapping;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const ENV_TOKEN: &str = "RELAY_TOKEN";
pub const ENV_HOSTNAME: &str = "RELAY_HOSTNAME";
pub const ENV_ORGANIZATION: &str = "RELAY_ORGANIZATION";

/// Errors loading or validating backend configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("missing required setting: {0}")]
    Missing(&'static str),
    #[error("only one of {0} may be set in [backend.workspaces]")]
    ConflictingWorkspaceMapping(&'static str),
    #[error("invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Poll intervals and attempt caps
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PollConfig {
    #[serde(with = "humantime_serde")]
    pub upload_poll_interval: Duration,
    pub upload_poll_attempts: u32,
    #[serde(with = "humantime_serde")]
    pub backoff_min: Duration,
    #[serde(with = "humantime_serde")]
    pub backoff_max: Duration,
    /// How often queue status is reported while a run waits
    #[serde(with = "humantime_serde")]
    pub status_interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            upload_poll_interval: Duration::from_millis(500),
            upload_poll_attempts: 60,
            backoff_min: Duration::from_secs(1),
            backoff_max: Duration::from_secs(3),
            status_interval: Duration::from_secs(30),
        }
    }
}

impl PollConfig {
    /// Delay before poll `iteration`: `min * 2^(iteration/5)`, capped at max
    pub fn backoff(&self, iteration: u32) -> Duration {
        let exponent = (f64::from(iteration) / 5.0).min(64.0);
        let secs = self.backoff_min.as_secs_f64() * exponent.exp2();
        Duration::try_from_secs_f64(secs)
            .unwrap_or(self.backoff_max)
            .min(self.backoff_max)
    }
}

/// HTTP client settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    pub max_retries: u32,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            max_retries: 30,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Log streaming settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// Record kinds dropped while a final plan render is pending
    pub suppress: Vec<LogKind>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            suppress: LogFilter::default_suppressed(),
        }
    }
}

impl LogConfig {
    pub fn filter(&self) -> LogFilter {
        LogFilter::new(self.suppress.iter().cloned())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    backend: RawBackend,
    polling: PollConfig,
    http: HttpConfig,
    logs: LogConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawBackend {
    hostname: Option<String>,
    organization: Option<String>,
    token: Option<String>,
    workspaces: RawWorkspaces,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawWorkspaces {
    name: Option<String>,
    prefix: Option<String>,
    tags: Option<Vec<String>>,
}

impl RawWorkspaces {
    fn into_mapping(self) -> Result<WorkspaceMapping, ConfigError> {
        match (self.name, self.prefix, self.tags) {
            (Some(_), Some(_), _) => Err(ConfigError::ConflictingWorkspaceMapping(
                "\"name\" and \"prefix\"",
            )),
            (Some(_), None, Some(_)) | (None, Some(_), Some(_)) => Err(
                ConfigError::ConflictingWorkspaceMapping("\"tags\" and \"name\"/\"prefix\""),
            ),
            (Some(name), None, None) => Ok(WorkspaceMapping::Name(name)),
            (None, Some(prefix), None) => Ok(WorkspaceMapping::Prefix(prefix)),
            (None, None, Some(tags)) if tags.is_empty() => Err(ConfigError::Invalid {
                field: "backend.workspaces.tags",
                reason: "at least one tag is required".to_string(),
            }),
            (None, None, Some(tags)) => Ok(WorkspaceMapping::Tags(tags)),
            (None, None, None) => Ok(WorkspaceMapping::None),
        }
    }
}

/// Validated backend configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub hostname: String,
    pub organization: String,
    pub token: Option<String>,
    pub mapping: WorkspaceMapping,
    pub polling: PollConfig,
    pub http: HttpConfig,
    pub logs: LogConfig,
}

impl BackendConfig {
    /// Load from a file, with process environment overrides
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, |key| std::env::var(key).ok())
    }

    /// Like [`BackendConfig::load`], but a missing file counts as empty
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using environment");
            Self::parse("", |key| std::env::var(key).ok())
        }
    }

    /// Parse TOML content, consulting `env` for overrides
    pub fn parse(
        content: &str,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(content)?;
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        let hostname = non_empty(env(ENV_HOSTNAME))
            .or(non_empty(raw.backend.hostname))
            .ok_or(ConfigError::Missing("backend.hostname"))?;
        let organization = non_empty(env(ENV_ORGANIZATION))
            .or(non_empty(raw.backend.organization))
            .ok_or(ConfigError::Missing("backend.organization"))?;
        let token = non_empty(env(ENV_TOKEN)).or(non_empty(raw.backend.token));

        if raw.polling.backoff_min > raw.polling.backoff_max {
            return Err(ConfigError::Invalid {
                field: "polling.backoff_min",
                reason: "must not exceed polling.backoff_max".to_string(),
            });
        }
        if raw.polling.upload_poll_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "polling.upload_poll_attempts",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            hostname,
            organization,
            token,
            mapping: raw.backend.workspaces.into_mapping()?,
            polling: raw.polling,
            http: raw.http,
            logs: raw.logs,
        })
    }

    /// Base URL of the remote API
    pub fn base_url(&self) -> String {
        if self.hostname.starts_with("http://") || self.hostname.starts_with("https://") {
            self.hostname.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", self.hostname.trim_end_matches('/'))
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
