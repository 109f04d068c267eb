// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake renderer for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::Renderer;
use relay_core::{LogKind, LogRecord, PlanMode, RedactedPlan};
use std::sync::{Arc, Mutex};

/// Recorded render call
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCall {
    Log { kind: LogKind, message: String },
    HumanPlan { mode: PlanMode, resources: usize },
    Print(String),
}

/// Renderer that records everything it is asked to show
#[derive(Clone, Default)]
pub struct FakeRenderer {
    calls: Arc<Mutex<Vec<RenderCall>>>,
}

impl FakeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<RenderCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Printed lines and log messages, in order
    pub fn output(&self) -> String {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RenderCall::Log { message, .. } => Some(message),
                RenderCall::Print(line) => Some(line),
                RenderCall::HumanPlan { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Kinds of structured records rendered
    pub fn log_kinds(&self) -> Vec<LogKind> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RenderCall::Log { kind, .. } => Some(kind),
                _ => None,
            })
            .collect()
    }

    pub fn plan_renders(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, RenderCall::HumanPlan { .. }))
            .count()
    }

    fn record(&self, call: RenderCall) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }
}

impl Renderer for FakeRenderer {
    fn render_log(&self, record: &LogRecord) {
        self.record(RenderCall::Log {
            kind: record.kind.clone(),
            message: record.message.clone(),
        });
    }

    fn render_human_plan(&self, plan: &RedactedPlan, mode: PlanMode) {
        self.record(RenderCall::HumanPlan {
            mode,
            resources: plan.resource_changes.len(),
        });
    }

    fn print(&self, line: &str) {
        self.record(RenderCall::Print(line.to_string()));
    }
}
