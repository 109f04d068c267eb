// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake prompt for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{Prompt, PromptError, Query};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct FakePromptState {
    answers: VecDeque<String>,
    asked: Vec<Query>,
    hang: bool,
}

/// Answers questions from a script. Unscripted questions are answered "no".
#[derive(Clone, Default)]
pub struct FakePrompt {
    state: Arc<Mutex<FakePromptState>>,
}

impl FakePrompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answering(answers: &[&str]) -> Self {
        let prompt = Self::default();
        prompt.state().answers = answers.iter().map(|a| a.to_string()).collect();
        prompt
    }

    /// Questions never get an answer
    pub fn hanging() -> Self {
        let prompt = Self::default();
        prompt.state().hang = true;
        prompt
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakePromptState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn asked(&self) -> Vec<Query> {
        self.state().asked.clone()
    }
}

#[async_trait]
impl Prompt for FakePrompt {
    async fn ask(&self, query: &Query) -> Result<String, PromptError> {
        let (answer, hang) = {
            let mut state = self.state();
            state.asked.push(query.clone());
            (state.answers.pop_front(), state.hang)
        };
        if hang {
            std::future::pending::<()>().await;
        }
        Ok(answer.unwrap_or_else(|| "no".to_string()))
    }
}
