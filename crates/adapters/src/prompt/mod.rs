// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Interactive questions to the user

mod terminal;

pub use terminal::TerminalPrompt;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakePrompt;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from prompting
#[derive(Debug, Clone, Error)]
pub enum PromptError {
    #[error("input is not interactive")]
    NotInteractive,
    #[error("failed to read answer: {0}")]
    Io(String),
}

/// A question with its explanatory text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub query: String,
    pub description: String,
}

impl Query {
    pub fn new(query: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            description: description.into(),
        }
    }
}

/// Asks the user a question and returns the raw answer
#[async_trait]
pub trait Prompt: Clone + Send + Sync + 'static {
    async fn ask(&self, query: &Query) -> Result<String, PromptError>;
}
