// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-friendly error display with context and suggestions.

use relay_adapters::RemoteError;
use relay_core::{ConfigError, MappingError};
use relay_engine::BackendError;
use std::fmt;
use std::path::Path;

/// Error with context and recovery suggestions for user-friendly display.
#[derive(Debug)]
pub struct RelayError {
    /// What went wrong
    pub message: String,
    /// Why it might have happened
    pub context: Vec<String>,
    /// How to fix it
    pub suggestions: Vec<String>,
    /// Original error if any
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl RelayError {
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

    /// The backend configuration could not be loaded
    pub fn config(path: &Path, err: ConfigError) -> Self {
        let suggestion = match &err {
            ConfigError::Missing(_) => format!(
                "Set it in {} or through RELAY_HOSTNAME / RELAY_ORGANIZATION",
                path.display()
            ),
            ConfigError::ConflictingWorkspaceMapping(_) => {
                "Keep exactly one of name, prefix or tags in [backend.workspaces]".to_string()
            }
            _ => format!("Check the syntax of {}", path.display()),
        };
        RelayError::new(format!("invalid configuration: {}", err))
            .with_context(format!("Configuration file: {}", path.display()))
            .with_suggestion(suggestion)
            .with_source(err)
    }
}

impl From<BackendError> for RelayError {
    fn from(err: BackendError) -> Self {
        let relay = RelayError::new(err.to_string());
        let relay = match &err {
            BackendError::UnsupportedWorkspaceOperation(MappingError::NoMapping) => relay
                .with_suggestion(
                    "Add a [backend.workspaces] table with name, prefix or tags to relay.toml",
                ),
            BackendError::UnsupportedWorkspaceOperation(MappingError::DefaultNotSupported {
                ..
            }) => relay
                .with_context("Remote workspaces are selected by name here")
                .with_suggestion("Select a workspace with --workspace <name>"),
            BackendError::UnsupportedWorkspaceOperation(MappingError::NamedOnly {
                bound, ..
            }) => relay.with_suggestion(format!(
                "Omit --workspace or pass --workspace {}",
                bound
            )),
            BackendError::Remote(RemoteError::Unauthorized(_)) => relay
                .with_context("The service rejected the configured token")
                .with_suggestion("Set RELAY_TOKEN or backend.token in relay.toml"),
            _ => relay,
        };
        relay.with_source(err)
    }
}

impl fmt::Display for RelayError {
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

impl std::error::Error for RelayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}
