// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::guard::LOCK_TIMEOUT_NOTICE;
use crate::retry::INITIAL_RETRY_MESSAGE;
use crate::stages::SKIPPED_DUE_TO_TARGETING;
use relay_adapters::{
    FakeInterrupter, FakePrompt, FakeRemote, FakeRenderer, FakeStateLocker, LockError,
    RemoteError, RetryAttempt, PLAN_LOG_URL,
};
use relay_core::{
    ConfigurationVersionStatus, CostEstimate, CostEstimateStatus, Enforcement, HttpConfig,
    LogConfig, LogKind, OperationKind, OperationResult, Permissions, PolicyCheck, PolicyResult,
    PolicyStatus, PollConfig, RedactedPlan, Run, RunStatus, SequentialIdGen, Severity, Stage,
    StageStatus, TaskResult, TaskStage, TaskStatus, Workspace,
};
use std::time::Duration;
use tempfile::TempDir;

type TestBackend =
    Backend<FakeRemote, FakeStateLocker, FakePrompt, FakeInterrupter, FakeRenderer, SequentialIdGen>;

struct Harness {
    remote: FakeRemote,
    locker: FakeStateLocker,
    prompt: FakePrompt,
    interrupter: FakeInterrupter,
    renderer: FakeRenderer,
    config_dir: TempDir,
    caller: CancellationToken,
}

impl Harness {
    fn new() -> Self {
        let remote = FakeRemote::new();
        remote.add_workspace(workspace());
        Self {
            remote,
            locker: FakeStateLocker::new(),
            prompt: FakePrompt::new(),
            interrupter: FakeInterrupter::new(),
            renderer: FakeRenderer::new(),
            config_dir: tempfile::tempdir().unwrap(),
            caller: CancellationToken::new(),
        }
    }

    fn backend(&self) -> TestBackend {
        let deps = BackendDeps {
            remote: self.remote.clone(),
            locker: self.locker.clone(),
            prompt: self.prompt.clone(),
            interrupter: self.interrupter.clone(),
            renderer: self.renderer.clone(),
        };
        Backend::new(deps, &config(), SequentialIdGen::new())
    }

    fn op(&self, kind: OperationKind) -> Operation {
        Operation::new(kind, "prod").with_config_dir(self.config_dir.path())
    }

    async fn run(&self, op: Operation) -> RunningOperation {
        let handle = self.backend().operation(op, &self.caller).await.unwrap();
        handle.wait().await;
        handle
    }

    fn assert_released(&self) {
        assert!(!self.locker.is_locked());
        assert_eq!(self.locker.unlock_count(), 1);
    }
}

fn workspace() -> Workspace {
    Workspace {
        id: "ws-1".into(),
        name: "networking-prod".into(),
        permissions: Permissions::all(),
        ..Workspace::default()
    }
}

fn config() -> BackendConfig {
    BackendConfig {
        hostname: "relay.example.com".into(),
        organization: "acme".into(),
        token: None,
        mapping: WorkspaceMapping::Prefix("networking-".into()),
        polling: PollConfig::default(),
        http: HttpConfig::default(),
        logs: LogConfig::default(),
    }
}

fn error_summaries(handle: &RunningOperation) -> Vec<String> {
    handle
        .diagnostics()
        .errors()
        .map(|d| d.summary.clone())
        .collect()
}

// =============================================================================
// Plan
// =============================================================================

#[tokio::test(start_paused = true)]
async fn plan_succeeds_and_releases_lock() {
    let h = Harness::new();

    let handle = h.run(h.op(OperationKind::Plan)).await;

    assert!(handle.is_done());
    assert_eq!(handle.result(), OperationResult::Success);
    assert!(!handle.plan_empty());
    assert_eq!(handle.run_id().as_deref(), Some("run-1"));
    assert!(handle.diagnostics().is_empty());
    h.assert_released();
    assert_eq!(h.remote.call_count("apply_run"), 0);
}

#[tokio::test(start_paused = true)]
async fn plan_without_changes_reports_empty_plan() {
    let h = Harness::new();
    h.remote.set_has_changes(false);

    let handle = h.run(h.op(OperationKind::Plan)).await;

    assert_eq!(handle.result(), OperationResult::Success);
    assert!(handle.plan_empty());
}

#[tokio::test(start_paused = true)]
async fn errored_run_fails_operation() {
    let h = Harness::new();
    h.remote
        .script_run(vec![RunStatus::Pending, RunStatus::Planning, RunStatus::Errored]);

    let handle = h.run(h.op(OperationKind::Plan)).await;

    assert_eq!(handle.result(), OperationResult::Failure);
    h.assert_released();
}

#[tokio::test(start_paused = true)]
async fn unsupported_workspace_is_rejected_before_any_call() {
    let h = Harness::new();
    let op = Operation::new(OperationKind::Plan, "default").with_config_dir(h.config_dir.path());

    let err = h.backend().operation(op, &h.caller).await.err().unwrap();

    assert!(matches!(err, BackendError::UnsupportedWorkspaceOperation(_)));
    assert!(h.remote.calls().is_empty());
    assert!(h.locker.calls().is_empty());
}

// =============================================================================
// Single flight
// =============================================================================

#[tokio::test(start_paused = true)]
async fn second_operation_waits_for_the_first() {
    let h = Harness::new();
    h.remote.hang("read_workspace");
    let backend = h.backend();

    let first = backend
        .operation(h.op(OperationKind::Plan), &h.caller)
        .await
        .unwrap();
    let blocked = tokio::time::timeout(
        Duration::from_secs(5),
        backend.operation(h.op(OperationKind::Plan), &h.caller),
    )
    .await;
    assert!(blocked.is_err());

    first.cancel();
    first.wait().await;
    let second = backend
        .operation(h.op(OperationKind::Plan), &h.caller)
        .await
        .unwrap();
    second.cancel();
    second.wait().await;

    assert_eq!(h.locker.unlock_count(), 2);
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test(start_paused = true)]
async fn every_violation_is_reported_at_once() {
    let h = Harness::new();
    let mut ws = workspace();
    ws.id = "ws-2".into();
    ws.name = "networking-staging".into();
    ws.permissions.can_queue_run = false;
    h.remote.add_workspace(ws);
    let op = Operation::new(OperationKind::Plan, "staging").with_parallelism(3);

    let handle = h.run(op).await;

    assert_eq!(handle.result(), OperationResult::Failure);
    let summaries = error_summaries(&handle);
    assert_eq!(summaries.len(), 1);
    assert!(summaries[0].contains("insufficient rights to queue runs"));
    assert!(summaries[0].contains("parallelism"));
    assert!(summaries[0].contains("no configuration files"));
    assert_eq!(h.remote.call_count("create_configuration_version"), 0);
    h.assert_released();
}

#[tokio::test(start_paused = true)]
async fn missing_workspace_is_reported_ambiguously() {
    let h = Harness::new();
    let op = Operation::new(OperationKind::Plan, "ghost").with_config_dir(h.config_dir.path());

    let handle = h.run(op).await;

    assert_eq!(handle.result(), OperationResult::Failure);
    let diagnostics = handle.diagnostics();
    let diag = diagnostics.errors().next().unwrap();
    assert_eq!(diag.summary, "workspace \"networking-ghost\" not found");
    assert_eq!(diag.detail.as_deref(), Some(crate::report::NOT_FOUND_DETAIL));
    h.assert_released();
}

// =============================================================================
// Upload
// =============================================================================

#[tokio::test(start_paused = true)]
async fn upload_timeout_fails_and_releases_lock() {
    let h = Harness::new();
    h.remote
        .script_configuration_version(vec![ConfigurationVersionStatus::Pending]);

    let handle = h.run(h.op(OperationKind::Plan)).await;

    assert_eq!(handle.result(), OperationResult::Failure);
    assert!(error_summaries(&handle)[0].contains("did not complete after 60 status checks"));
    assert_eq!(h.remote.call_count("read_configuration_version"), 60);
    assert_eq!(h.remote.call_count("create_run"), 0);
    h.assert_released();
}

#[tokio::test(start_paused = true)]
async fn errored_upload_reports_service_message() {
    let h = Harness::new();
    h.remote
        .script_configuration_version(vec![ConfigurationVersionStatus::Errored]);

    let handle = h.run(h.op(OperationKind::Plan)).await;

    assert_eq!(handle.result(), OperationResult::Failure);
    assert!(error_summaries(&handle)[0].starts_with("configuration version errored"));
}

// =============================================================================
// Stop and cancel
// =============================================================================

#[tokio::test(start_paused = true)]
async fn stop_cancels_remote_run_after_confirmation() {
    let mut h = Harness::new();
    h.prompt = FakePrompt::answering(&["yes"]);
    h.remote.script_run(vec![RunStatus::Pending]);

    let handle = h
        .backend()
        .operation(h.op(OperationKind::Plan), &h.caller)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(4500)).await;
    handle.stop();
    handle.wait().await;

    assert_eq!(handle.result(), OperationResult::Failure);
    assert_eq!(h.prompt.asked().len(), 1);
    assert_eq!(
        h.prompt.asked()[0].query,
        "Do you want to cancel the remote operation?"
    );
    assert_eq!(h.remote.call_count("cancel_run"), 1);
    assert!(h
        .renderer
        .output()
        .contains("The remote operation was successfully cancelled."));
    h.assert_released();
}

#[tokio::test(start_paused = true)]
async fn declined_cancel_leaves_remote_run() {
    let h = Harness::new();
    h.remote.script_run(vec![RunStatus::Pending]);

    let handle = h
        .backend()
        .operation(h.op(OperationKind::Plan), &h.caller)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(4500)).await;
    h.caller.cancel();
    handle.wait().await;

    assert_eq!(handle.result(), OperationResult::Failure);
    assert_eq!(h.remote.call_count("cancel_run"), 0);
    assert!(h
        .renderer
        .output()
        .contains("The remote operation was not cancelled."));
    h.assert_released();
}

#[tokio::test(start_paused = true)]
async fn hard_cancel_abandons_without_prompting() {
    let h = Harness::new();
    h.remote.script_run(vec![RunStatus::Pending]);

    let handle = h
        .backend()
        .operation(h.op(OperationKind::Plan), &h.caller)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(4500)).await;
    handle.cancel();
    handle.wait().await;

    assert_eq!(handle.result(), OperationResult::Failure);
    assert!(handle.diagnostics().is_empty());
    assert!(h.prompt.asked().is_empty());
    assert_eq!(h.remote.call_count("cancel_run"), 0);
    h.assert_released();
}

#[tokio::test(start_paused = true)]
async fn cancel_takes_precedence_over_stop() {
    let h = Harness::new();

    let handle = h
        .backend()
        .operation(h.op(OperationKind::Apply), &h.caller)
        .await
        .unwrap();
    handle.stop();
    handle.cancel();
    handle.wait().await;

    assert_eq!(handle.result(), OperationResult::Failure);
    assert!(h.remote.calls().is_empty());
    assert!(h.prompt.asked().is_empty());
    h.assert_released();
}

#[tokio::test(start_paused = true)]
async fn stop_before_submission_queues_nothing() {
    let h = Harness::new();

    let handle = h
        .backend()
        .operation(h.op(OperationKind::Apply), &h.caller)
        .await
        .unwrap();
    handle.stop();
    handle.wait().await;

    assert_eq!(handle.result(), OperationResult::Failure);
    assert_eq!(h.remote.call_count("create_configuration_version"), 0);
    assert_eq!(h.remote.call_count("upload_configuration"), 0);
    assert_eq!(h.remote.call_count("create_run"), 0);
    assert!(h.prompt.asked().is_empty());
    assert_eq!(handle.run_id(), None);
    h.assert_released();
}

#[tokio::test(start_paused = true)]
async fn stop_during_upload_creates_no_run() {
    let h = Harness::new();
    h.remote.hang("upload_configuration");

    let handle = h
        .backend()
        .operation(h.op(OperationKind::Apply), &h.caller)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    handle.stop();
    handle.wait().await;

    assert_eq!(handle.result(), OperationResult::Failure);
    assert_eq!(h.remote.call_count("upload_configuration"), 1);
    assert_eq!(h.remote.call_count("create_run"), 0);
    assert!(h.prompt.asked().is_empty());
    assert!(handle.diagnostics().is_empty());
    h.assert_released();
}

#[tokio::test(start_paused = true)]
async fn stop_during_upload_polling_creates_no_run() {
    let h = Harness::new();
    h.remote
        .script_configuration_version(vec![ConfigurationVersionStatus::Pending]);

    let handle = h
        .backend()
        .operation(h.op(OperationKind::Plan), &h.caller)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;
    handle.stop();
    handle.wait().await;

    assert_eq!(handle.result(), OperationResult::Failure);
    assert!(h.remote.call_count("read_configuration_version") >= 1);
    assert_eq!(h.remote.call_count("create_run"), 0);
    assert!(h.prompt.asked().is_empty());
    h.assert_released();
}

#[tokio::test(start_paused = true)]
async fn lock_timeout_cancels_pending_run_without_prompting() {
    let mut h = Harness::new();
    let caller = h.caller.clone();
    h.interrupter = FakeInterrupter::with_callback(move || caller.cancel());
    h.remote.script_run(vec![RunStatus::Pending]);
    let op = h
        .op(OperationKind::Plan)
        .with_lock_timeout(Duration::from_secs(10));

    let handle = h.run(op).await;

    assert_eq!(handle.result(), OperationResult::Failure);
    assert_eq!(h.interrupter.count(), 1);
    assert!(h.prompt.asked().is_empty());
    assert_eq!(h.remote.call_count("cancel_run"), 1);
    let output = h.renderer.output();
    assert!(output.contains(LOCK_TIMEOUT_NOTICE));
    assert!(output.contains("The remote operation was successfully cancelled."));
    h.assert_released();
}

#[tokio::test(start_paused = true)]
async fn lock_timeout_ignores_started_run() {
    let mut h = Harness::new();
    let caller = h.caller.clone();
    h.interrupter = FakeInterrupter::with_callback(move || caller.cancel());
    let op = h
        .op(OperationKind::Plan)
        .with_lock_timeout(Duration::from_secs(10));

    let handle = h.run(op).await;
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert_eq!(handle.result(), OperationResult::Success);
    assert_eq!(h.interrupter.count(), 0);
}

// =============================================================================
// Lock
// =============================================================================

#[tokio::test(start_paused = true)]
async fn held_lock_fails_without_remote_calls() {
    let h = Harness::new();
    h.locker.fail_lock(LockError::Held {
        holder: "someone else".into(),
    });

    let handle = h.run(h.op(OperationKind::Plan)).await;

    assert_eq!(handle.result(), OperationResult::Failure);
    assert_eq!(
        error_summaries(&handle),
        vec!["Error acquiring the state lock".to_string()]
    );
    assert!(h.remote.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn unlock_failure_is_a_warning_only() {
    let h = Harness::new();
    h.locker.fail_unlock(LockError::Io("disk full".into()));

    let handle = h.run(h.op(OperationKind::Plan)).await;

    assert_eq!(handle.result(), OperationResult::Success);
    let diagnostics = handle.diagnostics();
    let warning = diagnostics.warnings().next().unwrap();
    assert_eq!(warning.severity, Severity::Warning);
    assert_eq!(warning.summary, "Error releasing the state lock");
    assert!(warning.detail.as_deref().unwrap_or_default().contains("lock-1"));
}

// =============================================================================
// Queue
// =============================================================================

#[tokio::test(start_paused = true)]
async fn reports_queue_position() {
    let h = Harness::new();
    let mut ws = workspace();
    ws.id = "ws-3".into();
    ws.name = "networking-shared".into();
    ws.current_run_id = Some("run-0".into());
    h.remote.add_workspace(ws);
    h.remote.set_older_runs(vec![
        Run::new("run-0", "ws-3", RunStatus::Applying),
        Run::new("run-old", "ws-3", RunStatus::Applied),
    ]);
    h.remote
        .script_run(vec![RunStatus::Pending, RunStatus::PlannedAndFinished]);
    let op = Operation::new(OperationKind::Plan, "shared").with_config_dir(h.config_dir.path());

    let handle = h.run(op).await;

    assert_eq!(handle.result(), OperationResult::Success);
    assert!(h
        .renderer
        .output()
        .contains("Waiting for 1 run(s) to finish before being queued..."));
}

#[tokio::test(start_paused = true)]
async fn reports_waiting_for_start_when_next_in_line() {
    let h = Harness::new();
    h.remote
        .script_run(vec![RunStatus::Pending, RunStatus::PlannedAndFinished]);

    h.run(h.op(OperationKind::Plan)).await;

    assert!(h.renderer.output().contains("Waiting for the plan to start..."));
}

// =============================================================================
// Logs
// =============================================================================

#[tokio::test(start_paused = true)]
async fn suppresses_records_duplicated_by_final_render() {
    let h = Harness::new();
    let mut ws = workspace();
    ws.id = "ws-4".into();
    ws.name = "networking-structured".into();
    ws.structured_run_output_enabled = true;
    h.remote.add_workspace(ws);
    h.remote.set_redacted_plan(
        RedactedPlan::from_json(serde_json::json!({ "resource_changes": [] })).unwrap(),
    );
    h.remote.set_logs(
        PLAN_LOG_URL,
        vec![
            r#"{"@level":"info","@message":"Refreshing state","type":"log"}"#,
            r#"{"@level":"info","@message":"Plan: 1 to add","type":"change_summary"}"#,
            "plain text line",
        ],
    );
    let op =
        Operation::new(OperationKind::Plan, "structured").with_config_dir(h.config_dir.path());

    let handle = h.run(op).await;

    assert_eq!(handle.result(), OperationResult::Success);
    assert_eq!(h.renderer.log_kinds(), vec![LogKind::Log]);
    assert_eq!(h.renderer.plan_renders(), 1);
    assert!(h.renderer.output().contains("plain text line"));
}

#[tokio::test(start_paused = true)]
async fn streams_every_record_without_final_render() {
    let h = Harness::new();
    h.remote.set_logs(
        PLAN_LOG_URL,
        vec![r#"{"@level":"info","@message":"Plan: 1 to add","type":"change_summary"}"#],
    );

    h.run(h.op(OperationKind::Plan)).await;

    assert_eq!(h.renderer.log_kinds(), vec![LogKind::ChangeSummary]);
    assert_eq!(h.renderer.plan_renders(), 0);
    assert_eq!(h.remote.call_count("read_redacted_plan"), 0);
}

#[tokio::test(start_paused = true)]
async fn reports_reconnect_attempts() {
    let h = Harness::new();
    h.remote.simulate_retries(vec![
        RetryAttempt {
            attempt: 0,
            status: None,
        },
        RetryAttempt {
            attempt: 1,
            status: Some(503),
        },
    ]);

    let handle = h.run(h.op(OperationKind::Plan)).await;

    assert_eq!(handle.result(), OperationResult::Success);
    assert!(h.renderer.output().contains(INITIAL_RETRY_MESSAGE));
}

// =============================================================================
// Stage gates
// =============================================================================

#[tokio::test(start_paused = true)]
async fn cost_estimate_skipped_due_to_targeting_is_not_an_error() {
    let h = Harness::new();
    h.remote.script_cost_estimate(vec![CostEstimate {
        id: "ce-1".into(),
        status: CostEstimateStatus::SkippedDueToTargeting,
        matched_resources_count: 0,
        resources_count: 0,
        proposed_monthly_cost: String::new(),
        delta_monthly_cost: String::new(),
        error_message: None,
    }]);
    let op = h
        .op(OperationKind::Plan)
        .with_targets(vec!["aws_instance.web".to_string()]);

    let handle = h.run(op).await;

    assert_eq!(handle.result(), OperationResult::Success);
    assert!(h.renderer.output().contains(SKIPPED_DUE_TO_TARGETING));
}

#[tokio::test(start_paused = true)]
async fn finished_cost_estimate_is_summarized() {
    let h = Harness::new();
    let pending = CostEstimate {
        id: "ce-1".into(),
        status: CostEstimateStatus::Pending,
        matched_resources_count: 0,
        resources_count: 0,
        proposed_monthly_cost: String::new(),
        delta_monthly_cost: String::new(),
        error_message: None,
    };
    h.remote.script_cost_estimate(vec![
        pending.clone(),
        CostEstimate {
            status: CostEstimateStatus::Finished,
            matched_resources_count: 3,
            resources_count: 4,
            proposed_monthly_cost: "42.00".into(),
            delta_monthly_cost: "12.50".into(),
            ..pending
        },
    ]);

    let handle = h.run(h.op(OperationKind::Plan)).await;

    assert_eq!(handle.result(), OperationResult::Success);
    let output = h.renderer.output();
    assert!(output.contains("Resources: 3 of 4 estimated"));
    assert!(output.contains("$42.00/mo +$12.50"));
}

#[tokio::test(start_paused = true)]
async fn canceled_cost_estimate_fails() {
    let h = Harness::new();
    h.remote.script_cost_estimate(vec![CostEstimate {
        id: "ce-1".into(),
        status: CostEstimateStatus::Canceled,
        matched_resources_count: 0,
        resources_count: 0,
        proposed_monthly_cost: String::new(),
        delta_monthly_cost: String::new(),
        error_message: None,
    }]);

    let handle = h.run(h.op(OperationKind::Plan)).await;

    assert_eq!(handle.result(), OperationResult::Failure);
    assert_eq!(
        error_summaries(&handle),
        vec!["cost estimation was canceled".to_string()]
    );
    h.assert_released();
}

#[tokio::test(start_paused = true)]
async fn hard_failed_policy_fails_and_releases_lock() {
    let h = Harness::new();
    h.remote.script_policy_check(vec![PolicyCheck {
        id: "pol-1".into(),
        status: PolicyStatus::HardFailed,
        result: PolicyResult {
            passed: 2,
            total_failed: 1,
            hard_failed: 1,
            ..PolicyResult::default()
        },
        output: "deny public buckets".into(),
    }]);

    let handle = h.run(h.op(OperationKind::Apply)).await;

    assert_eq!(handle.result(), OperationResult::Failure);
    assert_eq!(
        error_summaries(&handle),
        vec!["Hard-mandatory policy check failed".to_string()]
    );
    assert_eq!(h.remote.call_count("apply_run"), 0);
    h.assert_released();
}

#[tokio::test(start_paused = true)]
async fn soft_failed_policy_warns_and_fails() {
    let h = Harness::new();
    h.remote.script_policy_check(vec![PolicyCheck {
        id: "pol-1".into(),
        status: PolicyStatus::SoftFailed,
        result: PolicyResult {
            passed: 1,
            total_failed: 1,
            soft_failed: 1,
            ..PolicyResult::default()
        },
        output: String::new(),
    }]);

    let handle = h.run(h.op(OperationKind::Plan)).await;

    assert_eq!(handle.result(), OperationResult::Failure);
    assert_eq!(handle.diagnostics().warnings().count(), 1);
    assert!(error_summaries(&handle).is_empty());
}

fn stage(status: StageStatus, enforcement: Enforcement, task: TaskStatus) -> TaskStage {
    TaskStage {
        id: "ts-1".into(),
        stage: Stage::PrePlan,
        status,
        task_results: vec![TaskResult {
            id: "task-1".into(),
            task_name: "scan".into(),
            status: task,
            message: "found secrets".into(),
            enforcement,
            url: None,
        }],
    }
}

#[tokio::test(start_paused = true)]
async fn failed_mandatory_task_fails_operation() {
    let h = Harness::new();
    h.remote.script_task_stage(vec![
        stage(StageStatus::Running, Enforcement::Mandatory, TaskStatus::Running),
        stage(StageStatus::Failed, Enforcement::Mandatory, TaskStatus::Failed),
    ]);

    let handle = h.run(h.op(OperationKind::Plan)).await;

    assert_eq!(handle.result(), OperationResult::Failure);
    assert_eq!(
        error_summaries(&handle),
        vec!["Pre-plan task \"scan\" failed".to_string()]
    );
    assert!(h.renderer.output().contains("Pre-plan Tasks: 0 passed, 1 total"));
}

#[tokio::test(start_paused = true)]
async fn failed_advisory_task_only_warns() {
    let h = Harness::new();
    h.remote.script_task_stage(vec![stage(
        StageStatus::Passed,
        Enforcement::Advisory,
        TaskStatus::Failed,
    )]);

    let handle = h.run(h.op(OperationKind::Plan)).await;

    assert_eq!(handle.result(), OperationResult::Success);
    assert_eq!(handle.diagnostics().warnings().count(), 1);
}

// =============================================================================
// Apply
// =============================================================================

fn planned_apply(h: &Harness) {
    h.remote
        .script_run(vec![RunStatus::Pending, RunStatus::Planning, RunStatus::Planned]);
}

#[tokio::test(start_paused = true)]
async fn apply_after_confirmation() {
    let mut h = Harness::new();
    h.prompt = FakePrompt::answering(&["yes"]);
    planned_apply(&h);

    let handle = h.run(h.op(OperationKind::Apply)).await;

    assert_eq!(handle.result(), OperationResult::Success);
    assert_eq!(
        h.prompt.asked()[0].query,
        "Do you want to perform these actions in workspace \"networking-prod\"?"
    );
    assert_eq!(h.remote.call_count("apply_run"), 1);
    assert!(h.renderer.output().contains("Waiting for the apply to start..."));
    h.assert_released();
}

#[tokio::test(start_paused = true)]
async fn declined_apply_discards_run() {
    let mut h = Harness::new();
    h.prompt = FakePrompt::answering(&["no"]);
    planned_apply(&h);

    let handle = h.run(h.op(OperationKind::Apply)).await;

    assert_eq!(handle.result(), OperationResult::Failure);
    assert_eq!(error_summaries(&handle), vec!["Apply discarded.".to_string()]);
    assert_eq!(h.remote.call_count("discard_run"), 1);
    assert_eq!(h.remote.call_count("apply_run"), 0);
    h.assert_released();
}

#[tokio::test(start_paused = true)]
async fn auto_approved_destroy_skips_prompt() {
    let h = Harness::new();
    planned_apply(&h);
    let op = Operation::new(OperationKind::Destroy, "prod").with_auto_approve(true);

    let handle = h.run(op).await;

    assert_eq!(handle.result(), OperationResult::Success);
    assert!(h.prompt.asked().is_empty());
    assert_eq!(h.remote.call_count("apply_run"), 1);
}

#[tokio::test(start_paused = true)]
async fn destroy_asks_destroy_question() {
    let mut h = Harness::new();
    h.prompt = FakePrompt::answering(&["yes"]);
    planned_apply(&h);

    h.run(Operation::new(OperationKind::Destroy, "prod")).await;

    assert_eq!(
        h.prompt.asked()[0].query,
        "Do you really want to destroy all resources in workspace \"networking-prod\"?"
    );
}

#[tokio::test(start_paused = true)]
async fn apply_without_changes_skips_confirmation() {
    let h = Harness::new();
    planned_apply(&h);
    h.remote.set_has_changes(false);

    let handle = h.run(h.op(OperationKind::Apply)).await;

    assert_eq!(handle.result(), OperationResult::Success);
    assert!(handle.plan_empty());
    assert!(h.prompt.asked().is_empty());
    assert_eq!(h.remote.call_count("apply_run"), 0);
}

#[tokio::test(start_paused = true)]
async fn insufficient_apply_permission_creates_nothing() {
    let h = Harness::new();
    let mut ws = workspace();
    ws.id = "ws-5".into();
    ws.name = "networking-readonly".into();
    ws.permissions.can_queue_apply = false;
    h.remote.add_workspace(ws);
    let op = Operation::new(OperationKind::Apply, "readonly").with_config_dir(h.config_dir.path());

    let handle = h.run(op).await;

    assert_eq!(handle.result(), OperationResult::Failure);
    assert!(error_summaries(&handle)[0].contains("queue applies"));
    assert_eq!(h.remote.call_count("create_configuration_version"), 0);
    assert_eq!(h.remote.call_count("create_run"), 0);
}

// =============================================================================
// Workspace listing
// =============================================================================

#[tokio::test]
async fn lists_local_names_of_mapped_workspaces() {
    let h = Harness::new();
    for name in ["networking-dev", "networking-prod", "billing-prod"] {
        h.remote.add_workspace(Workspace {
            name: name.into(),
            ..Workspace::default()
        });
    }

    let names = h.backend().workspaces().await.unwrap();

    assert_eq!(names, vec!["dev".to_string(), "prod".to_string()]);
}

#[tokio::test]
async fn listing_without_mapping_fails() {
    let h = Harness::new();
    let mut config = config();
    config.mapping = WorkspaceMapping::None;
    let deps = BackendDeps {
        remote: h.remote.clone(),
        locker: h.locker.clone(),
        prompt: h.prompt.clone(),
        interrupter: h.interrupter.clone(),
        renderer: h.renderer.clone(),
    };
    let backend = Backend::new(deps, &config, SequentialIdGen::new());

    let err = backend.workspaces().await.unwrap_err();

    assert!(matches!(
        err,
        BackendError::UnsupportedWorkspaceOperation(MappingError::NoMapping)
    ));
    assert!(h.remote.calls().is_empty());
}

#[tokio::test]
async fn listing_surfaces_remote_errors() {
    let h = Harness::new();
    h.remote
        .fail("list_workspaces", RemoteError::Unauthorized("bad token".into()));

    let err = h.backend().workspaces().await.unwrap_err();

    assert!(matches!(err, BackendError::Remote(RemoteError::Unauthorized(_))));
}
