// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Auxiliary run stages: run tasks, cost estimation, policy checks
//!
//! Stage results are computed server side. The client polls each one to a
//! terminal status and never retries them.

use serde::{Deserialize, Serialize};

// =============================================================================
// Run task stages
// =============================================================================

/// Point in the run lifecycle a task stage is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    PrePlan,
    PostPlan,
    PreApply,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::PrePlan => "Pre-plan",
            Stage::PostPlan => "Post-plan",
            Stage::PreApply => "Pre-apply",
            Stage::Unknown => "Unknown",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Pending,
    Running,
    Passed,
    Failed,
    AwaitingOverride,
    Canceled,
    Errored,
    Unreachable,
    #[serde(other)]
    Unknown,
}

impl StageStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StageStatus::Passed
                | StageStatus::Failed
                | StageStatus::AwaitingOverride
                | StageStatus::Canceled
                | StageStatus::Errored
                | StageStatus::Unreachable
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Passed,
    Failed,
    Errored,
    Canceled,
    Unreachable,
    #[serde(other)]
    Unknown,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            TaskStatus::Pending | TaskStatus::Running | TaskStatus::Unknown
        )
    }

    pub fn is_failed(&self) -> bool {
        matches!(
            self,
            TaskStatus::Failed | TaskStatus::Errored | TaskStatus::Unreachable
        )
    }
}

/// Whether a failing task blocks the run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Enforcement {
    #[default]
    Advisory,
    Mandatory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResult {
    pub id: String,
    pub task_name: String,
    pub status: TaskStatus,
    pub message: String,
    pub enforcement: Enforcement,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStage {
    pub id: String,
    pub stage: Stage,
    pub status: StageStatus,
    pub task_results: Vec<TaskResult>,
}

// =============================================================================
// Cost estimation
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostEstimateStatus {
    Pending,
    Queued,
    Finished,
    Errored,
    Canceled,
    SkippedDueToTargeting,
    #[serde(other)]
    Unknown,
}

impl CostEstimateStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CostEstimateStatus::Finished
                | CostEstimateStatus::Errored
                | CostEstimateStatus::Canceled
                | CostEstimateStatus::SkippedDueToTargeting
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub id: String,
    pub status: CostEstimateStatus,
    pub matched_resources_count: u32,
    pub resources_count: u32,
    /// Monetary values as decimal strings, as the service reports them
    pub proposed_monthly_cost: String,
    pub delta_monthly_cost: String,
    pub error_message: Option<String>,
}

// =============================================================================
// Policy checks
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyStatus {
    Pending,
    Queued,
    Passed,
    SoftFailed,
    HardFailed,
    Overridden,
    Errored,
    Canceled,
    Unreachable,
    #[serde(other)]
    Unknown,
}

impl PolicyStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            PolicyStatus::Pending | PolicyStatus::Queued | PolicyStatus::Unknown
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyResult {
    pub passed: u32,
    pub total_failed: u32,
    pub advisory_failed: u32,
    pub soft_failed: u32,
    pub hard_failed: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyCheck {
    pub id: String,
    pub status: PolicyStatus,
    pub result: PolicyResult,
    /// Human-readable evaluation output
    pub output: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skipped_cost_estimate_is_terminal() {
        let status: CostEstimateStatus =
            serde_json::from_str("\"skipped_due_to_targeting\"").unwrap();
        assert_eq!(status, CostEstimateStatus::SkippedDueToTargeting);
        assert!(status.is_terminal());
        assert!(!CostEstimateStatus::Queued.is_terminal());
    }

    #[test]
    fn policy_soft_failed_is_terminal() {
        let status: PolicyStatus = serde_json::from_str("\"soft_failed\"").unwrap();
        assert!(status.is_terminal());
        assert!(!PolicyStatus::Queued.is_terminal());
    }

    #[test]
    fn task_failure_classification() {
        assert!(TaskStatus::Errored.is_failed());
        assert!(!TaskStatus::Passed.is_failed());
        assert!(!TaskStatus::Running.is_terminal());
        assert!(StageStatus::AwaitingOverride.is_terminal());
    }
}
