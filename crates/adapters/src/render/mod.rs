// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal rendering of run output

mod terminal;

pub use terminal::TerminalRenderer;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeRenderer, RenderCall};

use relay_core::{LogRecord, PlanMode, RedactedPlan};

/// Sink for everything the user sees while an operation runs
pub trait Renderer: Clone + Send + Sync + 'static {
    /// Render one structured log record
    fn render_log(&self, record: &LogRecord);

    /// Render the final human-readable plan
    fn render_human_plan(&self, plan: &RedactedPlan, mode: PlanMode);

    /// Print an informational line verbatim
    fn print(&self, line: &str);
}
