// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Prompt on the controlling terminal via `dialoguer`

use super::{Prompt, PromptError, Query};
use async_trait::async_trait;
use dialoguer::console::{style, Term};
use dialoguer::Input;

#[derive(Clone, Default)]
pub struct TerminalPrompt;

impl TerminalPrompt {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Prompt for TerminalPrompt {
    async fn ask(&self, query: &Query) -> Result<String, PromptError> {
        let query = query.clone();
        tokio::task::spawn_blocking(move || {
            let term = Term::stdout();
            if !term.is_term() {
                return Err(PromptError::NotInteractive);
            }
            term.write_line("")
                .and_then(|_| term.write_line(&style(&query.query).bold().to_string()))
                .and_then(|_| term.write_line(&query.description))
                .map_err(|e| PromptError::Io(e.to_string()))?;
            Input::<String>::new()
                .with_prompt("  Enter a value")
                .allow_empty(true)
                .interact_text_on(&term)
                .map_err(|e| PromptError::Io(e.to_string()))
        })
        .await
        .map_err(|e| PromptError::Io(e.to_string()))?
    }
}
