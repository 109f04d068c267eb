// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Renderer writing to the process's stdout

use super::Renderer;
use dialoguer::console::{style, Term};
use relay_core::{ChangeAction, LogKind, LogRecord, PlanMode, RedactedPlan, ResourceChange};

#[derive(Clone)]
pub struct TerminalRenderer {
    term: Term,
    color: bool,
}

impl TerminalRenderer {
    pub fn new(color: bool) -> Self {
        Self {
            term: Term::stdout(),
            color,
        }
    }

    fn line(&self, text: &str) {
        if self.term.write_line(text).is_err() {
            tracing::debug!("stdout closed");
        }
    }

    fn diagnostic(&self, record: &LogRecord) -> String {
        let diag = &record.payload["diagnostic"];
        let severity = diag["severity"].as_str().unwrap_or("error");
        let summary = diag["summary"].as_str().unwrap_or(&record.message);
        let label = if severity == "warning" {
            "Warning:"
        } else {
            "Error:"
        };
        let label = match (self.color, severity) {
            (false, _) => label.to_string(),
            (true, "warning") => style(label).yellow().bold().to_string(),
            (true, _) => style(label).red().bold().to_string(),
        };
        let mut text = format!("{} {}", label, summary);
        if let Some(detail) = diag["detail"].as_str().filter(|d| !d.is_empty()) {
            text.push_str("\n\n");
            text.push_str(detail);
        }
        text
    }
}

fn symbol(change: &ResourceChange) -> &'static str {
    let has = |a: ChangeAction| change.actions.contains(&a);
    if has(ChangeAction::Create) && has(ChangeAction::Delete) {
        "-/+"
    } else if has(ChangeAction::Create) {
        "+"
    } else if has(ChangeAction::Delete) {
        "-"
    } else if has(ChangeAction::Update) {
        "~"
    } else if has(ChangeAction::Read) {
        "<="
    } else {
        " "
    }
}

impl Renderer for TerminalRenderer {
    fn render_log(&self, record: &LogRecord) {
        match record.kind {
            LogKind::Diagnostic => self.line(&self.diagnostic(record)),
            LogKind::Version => {}
            _ => self.line(&record.message),
        }
    }

    fn render_human_plan(&self, plan: &RedactedPlan, mode: PlanMode) {
        let changes: Vec<_> = plan
            .resource_changes
            .iter()
            .filter(|c| !c.actions.iter().all(|a| *a == ChangeAction::NoOp))
            .collect();

        if changes.is_empty() && plan.output_changes.is_empty() {
            let text = match mode {
                PlanMode::RefreshOnly => {
                    "No changes. Your infrastructure still matches the configuration."
                }
                _ => "No changes. Your infrastructure matches the configuration.",
            };
            self.line("");
            self.line(text);
            return;
        }

        self.line("");
        for change in &changes {
            let sym = symbol(change);
            let sym = if self.color {
                match sym {
                    "+" => style(sym).green().to_string(),
                    "-" => style(sym).red().to_string(),
                    "~" => style(sym).yellow().to_string(),
                    _ => style(sym).cyan().to_string(),
                }
            } else {
                sym.to_string()
            };
            self.line(&format!("  {} {}", sym, change.address));
        }
        if !plan.output_changes.is_empty() {
            self.line("");
            self.line("Changes to Outputs:");
            for name in &plan.output_changes {
                self.line(&format!("  ~ {}", name));
            }
        }
        if mode != PlanMode::RefreshOnly {
            self.line("");
            let summary = plan.summary().to_string();
            if self.color {
                self.line(&style(summary).bold().to_string());
            } else {
                self.line(&summary);
            }
        }
    }

    fn print(&self, line: &str) {
        self.line(line);
    }
}
