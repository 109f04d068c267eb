// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Redacted plan documents
//!
//! The service exposes the computed plan as JSON with sensitive values
//! removed. Only the parts needed to summarize changes are typed; the full
//! document is kept for the renderer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeAction {
    NoOp,
    Create,
    Read,
    Update,
    Delete,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceChange {
    pub address: String,
    pub actions: Vec<ChangeAction>,
}

impl ResourceChange {
    fn is_replace(&self) -> bool {
        self.actions.contains(&ChangeAction::Create) && self.actions.contains(&ChangeAction::Delete)
    }
}

/// Counts shown in the plan summary line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeSummary {
    pub add: usize,
    pub change: usize,
    pub destroy: usize,
}

impl std::fmt::Display for ChangeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Plan: {} to add, {} to change, {} to destroy.",
            self.add, self.change, self.destroy
        )
    }
}

#[derive(Deserialize)]
struct RawChange {
    address: String,
    change: RawActions,
}

#[derive(Deserialize)]
struct RawActions {
    #[serde(default)]
    actions: Vec<ChangeAction>,
}

/// A redacted plan document
#[derive(Debug, Clone, PartialEq)]
pub struct RedactedPlan {
    pub resource_changes: Vec<ResourceChange>,
    pub output_changes: Vec<String>,
    /// The document as received
    pub raw: Value,
}

impl RedactedPlan {
    pub fn from_json(raw: Value) -> Result<Self, serde_json::Error> {
        let resource_changes = match raw.get("resource_changes") {
            Some(v) if !v.is_null() => {
                Vec::<RawChange>::deserialize(v)?
                    .into_iter()
                    .map(|c| ResourceChange {
                        address: c.address,
                        actions: c.change.actions,
                    })
                    .collect()
            }
            _ => Vec::new(),
        };
        let output_changes = raw
            .get("output_changes")
            .and_then(Value::as_object)
            .map(|outputs| {
                outputs
                    .iter()
                    .filter(|(_, change)| {
                        change["actions"]
                            .as_array()
                            .is_some_and(|a| a.iter().any(|x| x != "no-op"))
                    })
                    .map(|(name, _)| name.clone())
                    .collect()
            })
            .unwrap_or_default();
        Ok(Self {
            resource_changes,
            output_changes,
            raw,
        })
    }

    pub fn summary(&self) -> ChangeSummary {
        let mut summary = ChangeSummary::default();
        for change in &self.resource_changes {
            if change.is_replace() {
                summary.add += 1;
                summary.destroy += 1;
            } else if change.actions.contains(&ChangeAction::Create) {
                summary.add += 1;
            } else if change.actions.contains(&ChangeAction::Update) {
                summary.change += 1;
            } else if change.actions.contains(&ChangeAction::Delete) {
                summary.destroy += 1;
            }
        }
        summary
    }

    pub fn has_changes(&self) -> bool {
        self.summary() != ChangeSummary::default() || !self.output_changes.is_empty()
    }
}
