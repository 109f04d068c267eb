// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Auxiliary stage gates: run tasks, cost estimation and policy checks

use crate::error::BackendError;
use crate::operation::Completion;
use crate::task::OperationTask;
use relay_adapters::{Interrupter, Prompt, RemoteClient, Renderer, StateLocker};
use relay_core::{
    CostEstimate, CostEstimateStatus, Diagnostic, Enforcement, PolicyCheck, PolicyStatus, Stage,
    StageStatus, TaskStage, TaskStatus,
};

pub const SKIPPED_DUE_TO_TARGETING: &str =
    "Not available for this plan, because it was created with the -target option.";

fn task_status_label(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "pending",
        TaskStatus::Running => "running",
        TaskStatus::Passed => "passed",
        TaskStatus::Failed => "failed",
        TaskStatus::Errored => "errored",
        TaskStatus::Canceled => "canceled",
        TaskStatus::Unreachable => "unreachable",
        TaskStatus::Unknown => "unknown",
    }
}

fn signed_cost(delta: &str) -> String {
    match delta.strip_prefix('-') {
        Some(amount) => format!("-${}", amount),
        None => format!("+${}", delta),
    }
}

impl<R, L, P, I, Rd> OperationTask<R, L, P, I, Rd>
where
    R: RemoteClient,
    L: StateLocker,
    P: Prompt,
    I: Interrupter,
    Rd: Renderer,
{
    /// Await one run-task stage, if the run has it. Returns false when a
    /// mandatory task failed.
    pub(crate) async fn await_task_stage(
        &self,
        stages: &[TaskStage],
        which: Stage,
        completion: &Completion,
    ) -> Result<bool, BackendError> {
        let Some(stage) = stages.iter().find(|s| s.stage == which) else {
            return Ok(true);
        };
        let stage = self
            .poll(
                || self.remote.read_task_stage(&stage.id),
                |s: &TaskStage| s.status.is_terminal(),
            )
            .await?;
        tracing::info!(stage = %which, status = ?stage.status, "task stage finished");

        let passed = stage
            .task_results
            .iter()
            .filter(|t| t.status == TaskStatus::Passed)
            .count();
        self.renderer.print(&format!(
            "{} Tasks: {} passed, {} total",
            which,
            passed,
            stage.task_results.len()
        ));

        let mut ok = true;
        for task in &stage.task_results {
            let enforcement = match task.enforcement {
                Enforcement::Mandatory => "mandatory",
                Enforcement::Advisory => "advisory",
            };
            let mut line = format!(
                "  {} ({}): {}",
                task.task_name,
                enforcement,
                task_status_label(task.status)
            );
            if !task.message.is_empty() {
                line.push_str(" - ");
                line.push_str(&task.message);
            }
            self.renderer.print(&line);

            if !task.status.is_failed() {
                continue;
            }
            let summary = format!("{} task \"{}\" failed", which, task.task_name);
            match task.enforcement {
                Enforcement::Mandatory => {
                    ok = false;
                    completion.push(Diagnostic::error(summary).with_detail(task.message.clone()));
                }
                Enforcement::Advisory => {
                    completion.push(Diagnostic::warning(summary).with_detail(task.message.clone()));
                }
            }
        }

        if matches!(
            stage.status,
            StageStatus::Failed
                | StageStatus::AwaitingOverride
                | StageStatus::Canceled
                | StageStatus::Errored
                | StageStatus::Unreachable
        ) {
            ok = false;
        }
        Ok(ok)
    }

    /// Poll and summarize the cost estimate
    pub(crate) async fn cost_estimate(&self, id: &str) -> Result<bool, BackendError> {
        let estimate = self
            .poll(
                || self.remote.read_cost_estimate(id),
                |c: &CostEstimate| c.status.is_terminal(),
            )
            .await?;

        self.renderer.print("Cost Estimation:");
        match estimate.status {
            CostEstimateStatus::Finished => {
                self.renderer.print(&format!(
                    "Resources: {} of {} estimated",
                    estimate.matched_resources_count, estimate.resources_count
                ));
                self.renderer.print(&format!(
                    "           ${}/mo {}",
                    estimate.proposed_monthly_cost,
                    signed_cost(&estimate.delta_monthly_cost)
                ));
                Ok(true)
            }
            CostEstimateStatus::Errored => {
                let reason = estimate
                    .error_message
                    .unwrap_or_else(|| "no reason given".to_string());
                self.renderer
                    .print(&format!("Cost estimation errored: {}", reason));
                Ok(true)
            }
            CostEstimateStatus::Canceled => Err(BackendError::CostEstimateCanceled),
            CostEstimateStatus::SkippedDueToTargeting => {
                self.renderer.print(SKIPPED_DUE_TO_TARGETING);
                Ok(true)
            }
            other => {
                tracing::warn!(status = ?other, "cost estimate ended in an unexpected status");
                Ok(true)
            }
        }
    }

    /// Poll one policy check. Anything but a pass fails the operation.
    pub(crate) async fn policy_check(
        &self,
        id: &str,
        completion: &Completion,
    ) -> Result<bool, BackendError> {
        let check = self
            .poll(
                || self.remote.read_policy_check(id),
                |p: &PolicyCheck| p.status.is_terminal(),
            )
            .await?;

        self.renderer.print("Policy Check:");
        if !check.output.is_empty() {
            self.renderer.print(&check.output);
        }
        let result = check.result;
        match check.status {
            PolicyStatus::Passed | PolicyStatus::Overridden => Ok(true),
            PolicyStatus::SoftFailed => {
                completion.push(
                    Diagnostic::warning("Soft-mandatory policy check failed").with_detail(format!(
                        "{} policies passed, {} soft-mandatory policies failed.",
                        result.passed, result.soft_failed
                    )),
                );
                Ok(false)
            }
            PolicyStatus::HardFailed => {
                completion.push(
                    Diagnostic::error("Hard-mandatory policy check failed").with_detail(format!(
                        "{} policies passed, {} hard-mandatory policies failed.",
                        result.passed, result.hard_failed
                    )),
                );
                Ok(false)
            }
            other => {
                completion.push(Diagnostic::error(format!(
                    "Policy check ended without a result ({:?})",
                    other
                )));
                Ok(false)
            }
        }
    }
}
