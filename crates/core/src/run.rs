// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote runs and configuration versions
//!
//! A run is created by the client and only ever mutated by the remote
//! service; the client re-reads it and classifies its status.

use crate::operation::PlanMode;
use serde::{Deserialize, Serialize};

/// Status of a remote run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Fetching,
    FetchingCompleted,
    PrePlanRunning,
    PrePlanCompleted,
    PlanQueued,
    Planning,
    Planned,
    PostPlanRunning,
    PostPlanCompleted,
    CostEstimating,
    CostEstimated,
    PolicyChecking,
    PolicyOverride,
    PolicySoftFailed,
    PolicyChecked,
    Confirmed,
    ApplyQueued,
    Applying,
    Applied,
    Discarded,
    Errored,
    Canceled,
    ForceCanceled,
    PlannedAndFinished,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Still waiting in the queue (not yet picked up by a worker)
    pub fn is_queued(&self) -> bool {
        matches!(self, RunStatus::Pending | RunStatus::Confirmed)
    }

    /// Actively computing the plan
    pub fn is_planning(&self) -> bool {
        matches!(
            self,
            RunStatus::Fetching
                | RunStatus::FetchingCompleted
                | RunStatus::PrePlanRunning
                | RunStatus::PrePlanCompleted
                | RunStatus::PlanQueued
                | RunStatus::Planning
        )
    }

    /// Actively applying
    pub fn is_applying(&self) -> bool {
        matches!(self, RunStatus::ApplyQueued | RunStatus::Applying)
    }

    /// No further transitions will happen
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Applied
                | RunStatus::Discarded
                | RunStatus::Errored
                | RunStatus::Canceled
                | RunStatus::ForceCanceled
                | RunStatus::PlannedAndFinished
        )
    }

    /// Terminal states that fail the operation
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            RunStatus::Errored
                | RunStatus::Canceled
                | RunStatus::ForceCanceled
                | RunStatus::Discarded
        )
    }

    /// Statuses excluded when computing a workspace queue position
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            RunStatus::Applied | RunStatus::Canceled | RunStatus::Discarded | RunStatus::Errored
        )
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(str::to_owned))
            .unwrap_or_else(|| "unknown".to_string());
        write!(f, "{}", s)
    }
}

/// Actions the remote service currently allows on a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunActions {
    pub is_cancelable: bool,
    pub is_confirmable: bool,
    pub is_discardable: bool,
    pub is_force_cancelable: bool,
}

/// Status of a plan or apply phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    #[default]
    Pending,
    Queued,
    Running,
    Finished,
    Errored,
    Canceled,
    Unreachable,
    #[serde(other)]
    Unknown,
}

/// Reference to the plan or apply phase of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseRef {
    pub id: String,
    pub status: PhaseStatus,
    /// Line-delimited log endpoint
    pub log_read_url: Option<String>,
}

/// A remote run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub id: String,
    pub workspace_id: String,
    pub status: RunStatus,
    pub actions: RunActions,
    pub configuration_version_id: String,
    pub cost_estimate_id: Option<String>,
    pub policy_check_ids: Vec<String>,
    pub target_addrs: Vec<String>,
    pub replace_addrs: Vec<String>,
    pub has_changes: bool,
    pub is_destroy: bool,
    pub refresh: bool,
    pub refresh_only: bool,
    pub plan_only: bool,
    pub message: String,
    pub plan: Option<PhaseRef>,
    pub apply: Option<PhaseRef>,
}

impl Run {
    pub fn new(id: impl Into<String>, workspace_id: impl Into<String>, status: RunStatus) -> Self {
        Self {
            id: id.into(),
            workspace_id: workspace_id.into(),
            status,
            actions: RunActions::default(),
            configuration_version_id: String::new(),
            cost_estimate_id: None,
            policy_check_ids: Vec::new(),
            target_addrs: Vec::new(),
            replace_addrs: Vec::new(),
            has_changes: false,
            is_destroy: false,
            refresh: true,
            refresh_only: false,
            plan_only: false,
            message: String::new(),
            plan: None,
            apply: None,
        }
    }

    /// Plan mode this run was created with
    pub fn plan_mode(&self) -> PlanMode {
        if self.is_destroy {
            PlanMode::Destroy
        } else if self.refresh_only {
            PlanMode::RefreshOnly
        } else {
            PlanMode::Normal
        }
    }

    /// Whether the run's plan phase produced output worth rendering
    pub fn plan_finished(&self) -> bool {
        self.plan
            .as_ref()
            .is_some_and(|p| p.status == PhaseStatus::Finished)
    }
}

/// Parameters for creating a run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunOptions {
    pub workspace_id: String,
    pub configuration_version_id: String,
    pub message: String,
    pub plan_mode: PlanMode,
    pub plan_only: bool,
    /// `None` leaves the service default (refresh enabled)
    pub refresh: Option<bool>,
    pub target_addrs: Vec<String>,
    pub replace_addrs: Vec<String>,
    /// (name, HCL expression) pairs
    pub variables: Vec<(String, String)>,
}

/// One page of a workspace's run list, most recent first
#[derive(Debug, Clone, Default)]
pub struct RunPage {
    pub items: Vec<Run>,
    pub current_page: u32,
    pub total_pages: u32,
}

impl RunPage {
    pub fn next_page(&self) -> Option<u32> {
        (self.current_page < self.total_pages).then_some(self.current_page + 1)
    }
}

/// Status of an uploaded configuration snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigurationVersionStatus {
    Pending,
    Fetching,
    Uploaded,
    Archived,
    Errored,
    #[serde(other)]
    Unknown,
}

/// A configuration version record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationVersion {
    pub id: String,
    pub status: ConfigurationVersionStatus,
    pub upload_url: String,
    pub speculative: bool,
    pub error_message: Option<String>,
}

/// Parameters for creating a configuration version
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfigurationVersionOptions {
    pub auto_queue_runs: bool,
    pub speculative: bool,
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
