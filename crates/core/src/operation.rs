// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operation requests dispatched to the remote backend

use crate::variables::{Declarations, VariableAssignment};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Parallelism the remote service always uses. Any other value is rejected.
pub const DEFAULT_PARALLELISM: u32 = 10;

/// The action the caller asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Plan,
    Apply,
    Destroy,
    Refresh,
}

impl OperationKind {
    /// Apply-type operations continue past the plan into an apply phase
    pub fn applies(&self) -> bool {
        !matches!(self, OperationKind::Plan)
    }

    /// Plan mode implied by the action, if any
    pub fn implied_plan_mode(&self) -> Option<PlanMode> {
        match self {
            OperationKind::Destroy => Some(PlanMode::Destroy),
            OperationKind::Refresh => Some(PlanMode::RefreshOnly),
            OperationKind::Plan | OperationKind::Apply => None,
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OperationKind::Plan => "plan",
            OperationKind::Apply => "apply",
            OperationKind::Destroy => "destroy",
            OperationKind::Refresh => "refresh",
        };
        write!(f, "{}", name)
    }
}

/// How the remote plan is computed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanMode {
    #[default]
    Normal,
    Destroy,
    RefreshOnly,
}

/// Final outcome recorded on the operation handle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationResult {
    #[default]
    Success,
    Failure,
}

/// An immutable request to run an action remotely
#[derive(Debug, Clone)]
pub struct Operation {
    pub kind: OperationKind,
    /// Local (user-facing) workspace name
    pub workspace: String,
    /// Configuration directory; `None` is only valid for destroy plans
    pub config_dir: Option<PathBuf>,
    pub plan_mode: PlanMode,
    /// Whether to refresh state before planning
    pub refresh: bool,
    pub targets: Vec<String>,
    pub force_replace: Vec<String>,
    pub variables: Vec<VariableAssignment>,
    /// Variables declared by the configuration, when the loader provided them
    pub declared_variables: Option<Declarations>,
    /// Pre-built plan artifact (local-only concept)
    pub plan_file: Option<PathBuf>,
    /// Plan output path (local-only concept)
    pub plan_out: Option<PathBuf>,
    pub parallelism: u32,
    pub auto_approve: bool,
    /// Zero disables the lock-timeout guard unless the locker supplies one
    pub lock_timeout: Duration,
}

impl Operation {
    pub fn new(kind: OperationKind, workspace: impl Into<String>) -> Self {
        Self {
            kind,
            workspace: workspace.into(),
            config_dir: None,
            plan_mode: kind.implied_plan_mode().unwrap_or_default(),
            refresh: true,
            targets: Vec::new(),
            force_replace: Vec::new(),
            variables: Vec::new(),
            declared_variables: None,
            plan_file: None,
            plan_out: None,
            parallelism: DEFAULT_PARALLELISM,
            auto_approve: false,
            lock_timeout: Duration::ZERO,
        }
    }

    pub fn with_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = Some(dir.into());
        self
    }

    pub fn with_plan_mode(mut self, mode: PlanMode) -> Self {
        self.plan_mode = mode;
        self
    }

    pub fn with_targets(mut self, targets: Vec<String>) -> Self {
        self.targets = targets;
        self
    }

    pub fn with_force_replace(mut self, addrs: Vec<String>) -> Self {
        self.force_replace = addrs;
        self
    }

    pub fn with_variable(mut self, assignment: VariableAssignment) -> Self {
        self.variables.push(assignment);
        self
    }

    pub fn with_declarations(mut self, declarations: Declarations) -> Self {
        self.declared_variables = Some(declarations);
        self
    }

    pub fn with_parallelism(mut self, parallelism: u32) -> Self {
        self.parallelism = parallelism;
        self
    }

    pub fn with_auto_approve(mut self, auto_approve: bool) -> Self {
        self.auto_approve = auto_approve;
        self
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn with_refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    pub fn with_plan_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.plan_file = Some(path.into());
        self
    }

    pub fn with_plan_out(mut self, path: impl Into<PathBuf>) -> Self {
        self.plan_out = Some(path.into());
        self
    }

    /// Whether a plan may legitimately run without configuration
    pub fn allows_missing_config(&self) -> bool {
        self.plan_mode == PlanMode::Destroy
    }
}

#[cfg(test)]
#[path = "operation_tests.rs"]
mod tests;
