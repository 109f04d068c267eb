// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run variable assignments and their resolution against declarations

use std::collections::BTreeMap;
use std::path::PathBuf;

/// Where a variable assignment came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableSource {
    Cli,
    File(PathBuf),
    Environment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableAssignment {
    pub name: String,
    /// Raw value as the user wrote it
    pub value: String,
    pub source: VariableSource,
}

impl VariableAssignment {
    pub fn cli(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            source: VariableSource::Cli,
        }
    }

    /// Parse a `name=value` flag argument
    pub fn parse_flag(arg: &str) -> Option<Self> {
        let (name, value) = arg.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self::cli(name, value))
    }
}

/// Declared type of a variable, as far as value encoding is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeHint {
    String,
    /// Any non-string type: the raw value is an expression
    Expression,
}

/// Declared variables of a configuration, by name
pub type Declarations = BTreeMap<String, TypeHint>;

/// Outcome of resolving assignments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedVariables {
    /// (name, HCL expression) pairs, last assignment wins
    pub values: Vec<(String, String)>,
    /// Undeclared names assigned on the command line (errors)
    pub undeclared_cli: Vec<String>,
    /// Undeclared names assigned from files (warnings)
    pub undeclared_file: Vec<String>,
}

/// Resolve assignments to HCL expressions.
///
/// Without declarations every value is sent as a string literal.
pub fn resolve(
    assignments: &[VariableAssignment],
    declarations: Option<&Declarations>,
) -> ResolvedVariables {
    let mut resolved = ResolvedVariables::default();
    let mut latest: BTreeMap<&str, usize> = BTreeMap::new();

    for assignment in assignments {
        let hint = match declarations {
            None => TypeHint::String,
            Some(decls) => match decls.get(&assignment.name) {
                Some(hint) => *hint,
                None => {
                    match &assignment.source {
                        VariableSource::Cli => {
                            resolved.undeclared_cli.push(assignment.name.clone())
                        }
                        VariableSource::File(_) => {
                            resolved.undeclared_file.push(assignment.name.clone())
                        }
                        VariableSource::Environment => {}
                    }
                    continue;
                }
            },
        };

        let expr = match hint {
            TypeHint::String => hcl_string(&assignment.value),
            TypeHint::Expression => assignment.value.clone(),
        };

        match latest.get(assignment.name.as_str()) {
            Some(&idx) => resolved.values[idx].1 = expr,
            None => {
                latest.insert(&assignment.name, resolved.values.len());
                resolved.values.push((assignment.name.clone(), expr));
            }
        }
    }

    resolved
}

/// Quote a value as an HCL string literal, escaping template sequences
pub fn hcl_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '$' | '%' if chars.peek() == Some(&'{') => {
                out.push(c);
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
#[path = "variables_tests.rs"]
mod tests;
