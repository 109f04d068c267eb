// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Diagnostic output for CLI commands

use relay_core::{Diagnostic, Diagnostics, Severity};

fn render(diagnostic: &Diagnostic) -> String {
    let label = match diagnostic.severity {
        Severity::Error => "Error",
        Severity::Warning => "Warning",
    };
    let mut out = format!("{}: {}", label, diagnostic.summary);
    if let Some(detail) = &diagnostic.detail {
        out.push_str("\n\n");
        for line in detail.lines() {
            if !line.is_empty() {
                out.push_str("  ");
            }
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

/// Print every diagnostic to stderr, warnings first
pub fn print_diagnostics(diagnostics: &Diagnostics) {
    for diagnostic in diagnostics.warnings().chain(diagnostics.errors()) {
        eprintln!("\n{}", render(diagnostic).trim_end());
    }
}
