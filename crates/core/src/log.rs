// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured run log records
//!
//! Remote run logs are line-delimited. Each line is either a JSON log record
//! carrying a `type` discriminator, or plain text from runs without
//! structured output.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Discriminator of a structured log record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LogKind {
    Version,
    Log,
    Diagnostic,
    PlannedChange,
    ChangeSummary,
    Outputs,
    ResourceDrift,
    RefreshStart,
    RefreshComplete,
    ApplyStart,
    ApplyProgress,
    ApplyComplete,
    ApplyErrored,
    ProvisionStart,
    ProvisionComplete,
    Other(String),
}

impl LogKind {
    pub fn as_str(&self) -> &str {
        match self {
            LogKind::Version => "version",
            LogKind::Log => "log",
            LogKind::Diagnostic => "diagnostic",
            LogKind::PlannedChange => "planned_change",
            LogKind::ChangeSummary => "change_summary",
            LogKind::Outputs => "outputs",
            LogKind::ResourceDrift => "resource_drift",
            LogKind::RefreshStart => "refresh_start",
            LogKind::RefreshComplete => "refresh_complete",
            LogKind::ApplyStart => "apply_start",
            LogKind::ApplyProgress => "apply_progress",
            LogKind::ApplyComplete => "apply_complete",
            LogKind::ApplyErrored => "apply_errored",
            LogKind::ProvisionStart => "provision_start",
            LogKind::ProvisionComplete => "provision_complete",
            LogKind::Other(s) => s,
        }
    }
}

impl From<&str> for LogKind {
    fn from(s: &str) -> Self {
        match s {
            "version" => LogKind::Version,
            "log" => LogKind::Log,
            "diagnostic" => LogKind::Diagnostic,
            "planned_change" => LogKind::PlannedChange,
            "change_summary" => LogKind::ChangeSummary,
            "outputs" => LogKind::Outputs,
            "resource_drift" => LogKind::ResourceDrift,
            "refresh_start" => LogKind::RefreshStart,
            "refresh_complete" => LogKind::RefreshComplete,
            "apply_start" => LogKind::ApplyStart,
            "apply_progress" => LogKind::ApplyProgress,
            "apply_complete" => LogKind::ApplyComplete,
            "apply_errored" => LogKind::ApplyErrored,
            "provision_start" => LogKind::ProvisionStart,
            "provision_complete" => LogKind::ProvisionComplete,
            other => LogKind::Other(other.to_string()),
        }
    }
}

impl From<String> for LogKind {
    fn from(s: String) -> Self {
        LogKind::from(s.as_str())
    }
}

impl From<LogKind> for String {
    fn from(kind: LogKind) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for LogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One structured log record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(rename = "@level", default)]
    pub level: String,
    #[serde(rename = "@message", default)]
    pub message: String,
    #[serde(rename = "@module", default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(rename = "@timestamp", default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(rename = "type")]
    pub kind: LogKind,
    /// Type-specific payload (`change`, `hook`, `diagnostic`, `outputs`, ...)
    #[serde(flatten)]
    pub payload: serde_json::Map<String, serde_json::Value>,
}

/// A log line as read from the log endpoint
#[derive(Debug, Clone, PartialEq)]
pub enum LogLine {
    Structured(LogRecord),
    /// Unparsable lines pass through verbatim
    Raw(String),
}

impl LogLine {
    pub fn parse(line: &str) -> Self {
        match serde_json::from_str::<LogRecord>(line) {
            Ok(record) => LogLine::Structured(record),
            Err(_) => LogLine::Raw(line.to_string()),
        }
    }
}

/// Decides which structured records are rendered while streaming
///
/// Suppressed kinds are only dropped when a final redacted-plan render will
/// produce the same information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFilter {
    suppressed: HashSet<LogKind>,
}

impl LogFilter {
    pub fn new(suppressed: impl IntoIterator<Item = LogKind>) -> Self {
        Self {
            suppressed: suppressed.into_iter().collect(),
        }
    }

    /// Kinds that duplicate the final plan render
    pub fn default_suppressed() -> Vec<LogKind> {
        vec![
            LogKind::PlannedChange,
            LogKind::ChangeSummary,
            LogKind::Outputs,
        ]
    }

    pub fn allows(&self, kind: &LogKind, final_render_pending: bool) -> bool {
        !(final_render_pending && self.suppressed.contains(kind))
    }
}

impl Default for LogFilter {
    fn default() -> Self {
        Self::new(Self::default_suppressed())
    }
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
