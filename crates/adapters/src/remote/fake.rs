// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted fake remote service for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{LogStream, RemoteClient, RemoteError, RetryAttempt, RetryHook};
use async_trait::async_trait;
use relay_core::{
    ConfigurationVersion, ConfigurationVersionOptions, ConfigurationVersionStatus, CostEstimate,
    PhaseRef, PhaseStatus, PlanMode, PolicyCheck, RedactedPlan, Run, RunActions, RunOptions,
    RunPage, RunStatus, ServiceInfo, TaskStage, Workspace, WorkspaceFilter,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

pub const PLAN_LOG_URL: &str = "fake://logs/plan";
pub const APPLY_LOG_URL: &str = "fake://logs/apply";

/// Recorded remote call
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall {
    ServiceInfo,
    ReadWorkspace { organization: String, name: String },
    ListWorkspaces { organization: String },
    CreateConfigurationVersion { workspace_id: String, speculative: bool },
    ReadConfigurationVersion { id: String },
    UploadConfiguration { upload_url: String, size: usize },
    CreateRun(RunOptions),
    ReadRun { id: String },
    ListRuns { workspace_id: String, page: u32 },
    ApplyRun { id: String },
    CancelRun { id: String },
    DiscardRun { id: String },
    ReadCostEstimate { id: String },
    ReadPolicyCheck { id: String },
    ListTaskStages { run_id: String },
    ReadTaskStage { id: String },
    ReadRedactedPlan { plan_id: String },
    ReadLogs { url: String },
}

impl RemoteCall {
    fn method(&self) -> &'static str {
        match self {
            RemoteCall::ServiceInfo => "service_info",
            RemoteCall::ReadWorkspace { .. } => "read_workspace",
            RemoteCall::ListWorkspaces { .. } => "list_workspaces",
            RemoteCall::CreateConfigurationVersion { .. } => "create_configuration_version",
            RemoteCall::ReadConfigurationVersion { .. } => "read_configuration_version",
            RemoteCall::UploadConfiguration { .. } => "upload_configuration",
            RemoteCall::CreateRun(_) => "create_run",
            RemoteCall::ReadRun { .. } => "read_run",
            RemoteCall::ListRuns { .. } => "list_runs",
            RemoteCall::ApplyRun { .. } => "apply_run",
            RemoteCall::CancelRun { .. } => "cancel_run",
            RemoteCall::DiscardRun { .. } => "discard_run",
            RemoteCall::ReadCostEstimate { .. } => "read_cost_estimate",
            RemoteCall::ReadPolicyCheck { .. } => "read_policy_check",
            RemoteCall::ListTaskStages { .. } => "list_task_stages",
            RemoteCall::ReadTaskStage { .. } => "read_task_stage",
            RemoteCall::ReadRedactedPlan { .. } => "read_redacted_plan",
            RemoteCall::ReadLogs { .. } => "read_logs",
        }
    }
}

/// Pops the next scripted value, repeating the last one forever
fn advance<T: Clone>(script: &mut VecDeque<T>) -> Option<T> {
    if script.len() > 1 {
        script.pop_front()
    } else {
        script.front().cloned()
    }
}

struct FakeState {
    service: ServiceInfo,
    workspaces: Vec<Workspace>,
    cv_script: VecDeque<ConfigurationVersionStatus>,
    configuration_version: Option<ConfigurationVersion>,
    run_script: VecDeque<RunStatus>,
    apply_script: VecDeque<RunStatus>,
    has_changes: bool,
    actions: Option<RunActions>,
    run: Option<Run>,
    older_runs: Vec<Run>,
    cost_estimate: Option<(String, VecDeque<CostEstimate>)>,
    policy_checks: Vec<(String, VecDeque<PolicyCheck>)>,
    task_stages: Vec<(String, VecDeque<TaskStage>)>,
    redacted_plan: Option<RedactedPlan>,
    logs: HashMap<String, Vec<String>>,
    held_logs: HashSet<String>,
    open_streams: Vec<mpsc::Sender<Result<String, RemoteError>>>,
    failures: HashMap<&'static str, RemoteError>,
    hanging: HashSet<&'static str>,
    pending_retries: Vec<RetryAttempt>,
    calls: Vec<RemoteCall>,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            service: ServiceInfo {
                api_version: Some("2.6".to_string()),
                release: None,
            },
            workspaces: Vec::new(),
            cv_script: VecDeque::from([ConfigurationVersionStatus::Uploaded]),
            configuration_version: None,
            run_script: VecDeque::from([RunStatus::PlannedAndFinished]),
            apply_script: VecDeque::from([RunStatus::Applying, RunStatus::Applied]),
            has_changes: true,
            actions: None,
            run: None,
            older_runs: Vec::new(),
            cost_estimate: None,
            policy_checks: Vec::new(),
            task_stages: Vec::new(),
            redacted_plan: None,
            logs: HashMap::new(),
            held_logs: HashSet::new(),
            open_streams: Vec::new(),
            failures: HashMap::new(),
            hanging: HashSet::new(),
            pending_retries: Vec::new(),
            calls: Vec::new(),
        }
    }
}

/// Actions the service would offer for a status
fn actions_for(status: RunStatus, plan_only: bool) -> RunActions {
    let awaiting_confirmation = matches!(
        status,
        RunStatus::Planned
            | RunStatus::CostEstimated
            | RunStatus::PolicyChecked
            | RunStatus::PolicyOverride
            | RunStatus::PostPlanCompleted
    ) && !plan_only;
    RunActions {
        is_cancelable: !status.is_terminal() && !awaiting_confirmation,
        is_confirmable: awaiting_confirmation,
        is_discardable: awaiting_confirmation || status == RunStatus::PolicySoftFailed,
        is_force_cancelable: false,
    }
}

fn plan_status_for(status: RunStatus) -> PhaseStatus {
    match status {
        RunStatus::Pending | RunStatus::Confirmed => PhaseStatus::Pending,
        s if s.is_planning() => PhaseStatus::Running,
        RunStatus::Errored => PhaseStatus::Errored,
        RunStatus::Canceled | RunStatus::ForceCanceled => PhaseStatus::Canceled,
        _ => PhaseStatus::Finished,
    }
}

/// Fake remote service with scripted run progression
///
/// Each `read_run` advances the run through the scripted statuses; the last
/// status repeats. Cancel, discard and apply rewrite the script the way the
/// service would.
#[derive(Clone, Default)]
pub struct FakeRemote {
    state: Arc<Mutex<FakeState>>,
    hook: Option<RetryHook>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.lock().calls.clone()
    }

    /// Number of recorded calls to a method, e.g. `"cancel_run"`
    pub fn call_count(&self, method: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.method() == method)
            .count()
    }

    /// Current state of the created run
    pub fn run(&self) -> Option<Run> {
        self.lock().run.clone()
    }

    pub fn set_service_info(&self, api_version: Option<&str>, release: Option<&str>) {
        self.lock().service = ServiceInfo {
            api_version: api_version.map(str::to_owned),
            release: release.map(str::to_owned),
        };
    }

    pub fn add_workspace(&self, workspace: Workspace) {
        self.lock().workspaces.push(workspace);
    }

    pub fn script_configuration_version(&self, statuses: Vec<ConfigurationVersionStatus>) {
        self.lock().cv_script = statuses.into();
    }

    /// Statuses the run moves through on successive reads
    pub fn script_run(&self, statuses: Vec<RunStatus>) {
        self.lock().run_script = statuses.into();
    }

    /// Statuses the run moves through after it is applied
    pub fn script_apply(&self, statuses: Vec<RunStatus>) {
        self.lock().apply_script = statuses.into();
    }

    pub fn set_has_changes(&self, has_changes: bool) {
        self.lock().has_changes = has_changes;
    }

    /// Override the status-derived run actions
    pub fn set_actions(&self, actions: RunActions) {
        self.lock().actions = Some(actions);
    }

    /// Runs that precede the created run in the workspace run list
    pub fn set_older_runs(&self, runs: Vec<Run>) {
        self.lock().older_runs = runs;
    }

    pub fn script_cost_estimate(&self, estimates: Vec<CostEstimate>) {
        if let Some(first) = estimates.first() {
            let id = first.id.clone();
            self.lock().cost_estimate = Some((id, estimates.into()));
        }
    }

    pub fn script_policy_check(&self, checks: Vec<PolicyCheck>) {
        if let Some(first) = checks.first() {
            let id = first.id.clone();
            self.lock().policy_checks.push((id, checks.into()));
        }
    }

    pub fn script_task_stage(&self, stages: Vec<TaskStage>) {
        if let Some(first) = stages.first() {
            let id = first.id.clone();
            self.lock().task_stages.push((id, stages.into()));
        }
    }

    pub fn set_redacted_plan(&self, plan: RedactedPlan) {
        self.lock().redacted_plan = Some(plan);
    }

    pub fn set_logs(&self, url: &str, lines: Vec<&str>) {
        self.lock()
            .logs
            .insert(url.to_string(), lines.into_iter().map(str::to_owned).collect());
    }

    /// Keep the log stream for `url` open after its lines are delivered
    pub fn hold_logs(&self, url: &str) {
        self.lock().held_logs.insert(url.to_string());
    }

    /// Fail every call to `method` with `error`
    pub fn fail(&self, method: &'static str, error: RemoteError) {
        self.lock().failures.insert(method, error);
    }

    pub fn clear_failure(&self, method: &'static str) {
        self.lock().failures.remove(method);
    }

    /// Calls to `method` never complete
    pub fn hang(&self, method: &'static str) {
        self.lock().hanging.insert(method);
    }

    /// Report these retries through the hook on the next call
    pub fn simulate_retries(&self, attempts: Vec<RetryAttempt>) {
        self.lock().pending_retries = attempts;
    }

    async fn enter(&self, call: RemoteCall) -> Result<(), RemoteError> {
        let method = call.method();
        let (retries, hang, failure) = {
            let mut state = self.lock();
            state.calls.push(call);
            (
                std::mem::take(&mut state.pending_retries),
                state.hanging.contains(method),
                state.failures.get(method).cloned(),
            )
        };
        if let Some(hook) = &self.hook {
            for attempt in retries {
                hook(attempt);
            }
        }
        if hang {
            std::future::pending::<()>().await;
        }
        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn with_run<T>(&self, id: &str, f: impl FnOnce(&mut FakeState) -> T) -> Result<T, RemoteError> {
        let mut state = self.lock();
        if state.run.as_ref().is_some_and(|run| run.id == id) {
            Ok(f(&mut *state))
        } else {
            Err(RemoteError::NotFound(format!("run {id}")))
        }
    }
}

fn refresh_run(state: &mut FakeState) {
    let has_changes = state.has_changes;
    let actions = state.actions;
    if let Some(run) = state.run.as_mut() {
        run.has_changes = has_changes;
        run.actions = actions.unwrap_or_else(|| actions_for(run.status, run.plan_only));
        if let Some(plan) = run.plan.as_mut() {
            plan.status = plan_status_for(run.status);
        }
        if let Some(apply) = run.apply.as_mut() {
            apply.status = match run.status {
                RunStatus::Applying | RunStatus::ApplyQueued => PhaseStatus::Running,
                RunStatus::Applied => PhaseStatus::Finished,
                _ => apply.status,
            };
        }
    }
}

#[async_trait]
impl RemoteClient for FakeRemote {
    fn with_retry_hook(&self, hook: RetryHook) -> Self {
        Self {
            state: Arc::clone(&self.state),
            hook: Some(hook),
        }
    }

    async fn service_info(&self) -> Result<ServiceInfo, RemoteError> {
        self.enter(RemoteCall::ServiceInfo).await?;
        Ok(self.lock().service.clone())
    }

    async fn read_workspace(&self, organization: &str, name: &str) -> Result<Workspace, RemoteError> {
        self.enter(RemoteCall::ReadWorkspace {
            organization: organization.to_string(),
            name: name.to_string(),
        })
        .await?;
        self.lock()
            .workspaces
            .iter()
            .find(|w| w.name == name)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(format!("workspace \"{name}\"")))
    }

    async fn list_workspaces(
        &self,
        organization: &str,
        filter: &WorkspaceFilter,
    ) -> Result<Vec<Workspace>, RemoteError> {
        self.enter(RemoteCall::ListWorkspaces {
            organization: organization.to_string(),
        })
        .await?;
        Ok(self
            .lock()
            .workspaces
            .iter()
            .filter(|w| {
                filter.search.as_ref().map_or(true, |s| w.name.contains(s.as_str()))
                    && filter.tags.iter().all(|t| w.tags.contains(t))
            })
            .cloned()
            .collect())
    }

    async fn create_configuration_version(
        &self,
        workspace_id: &str,
        options: ConfigurationVersionOptions,
    ) -> Result<ConfigurationVersion, RemoteError> {
        self.enter(RemoteCall::CreateConfigurationVersion {
            workspace_id: workspace_id.to_string(),
            speculative: options.speculative,
        })
        .await?;
        let cv = ConfigurationVersion {
            id: "cv-1".to_string(),
            status: ConfigurationVersionStatus::Pending,
            upload_url: "fake://upload/cv-1".to_string(),
            speculative: options.speculative,
            error_message: None,
        };
        self.lock().configuration_version = Some(cv.clone());
        Ok(cv)
    }

    async fn read_configuration_version(&self, id: &str) -> Result<ConfigurationVersion, RemoteError> {
        self.enter(RemoteCall::ReadConfigurationVersion { id: id.to_string() })
            .await?;
        let mut state = self.lock();
        let next = advance(&mut state.cv_script);
        match state.configuration_version.as_mut() {
            Some(cv) if cv.id == id => {
                if let Some(status) = next {
                    cv.status = status;
                }
                if cv.status == ConfigurationVersionStatus::Errored {
                    cv.error_message = Some("failed to extract archive".to_string());
                }
                Ok(cv.clone())
            }
            _ => Err(RemoteError::NotFound(format!("configuration version {id}"))),
        }
    }

    async fn upload_configuration(&self, upload_url: &str, archive: Vec<u8>) -> Result<(), RemoteError> {
        self.enter(RemoteCall::UploadConfiguration {
            upload_url: upload_url.to_string(),
            size: archive.len(),
        })
        .await
    }

    async fn create_run(&self, options: &RunOptions) -> Result<Run, RemoteError> {
        self.enter(RemoteCall::CreateRun(options.clone())).await?;
        let mut state = self.lock();
        let mut run = Run::new("run-1", &options.workspace_id, RunStatus::Pending);
        run.configuration_version_id = options.configuration_version_id.clone();
        run.message = options.message.clone();
        run.plan_only = options.plan_only;
        run.is_destroy = options.plan_mode == PlanMode::Destroy;
        run.refresh_only = options.plan_mode == PlanMode::RefreshOnly;
        run.refresh = options.refresh.unwrap_or(true);
        run.target_addrs = options.target_addrs.clone();
        run.replace_addrs = options.replace_addrs.clone();
        run.cost_estimate_id = state.cost_estimate.as_ref().map(|(id, _)| id.clone());
        run.policy_check_ids = state.policy_checks.iter().map(|(id, _)| id.clone()).collect();
        run.plan = Some(PhaseRef {
            id: "plan-1".to_string(),
            status: PhaseStatus::Pending,
            log_read_url: Some(PLAN_LOG_URL.to_string()),
        });
        run.apply = Some(PhaseRef {
            id: "apply-1".to_string(),
            status: PhaseStatus::Pending,
            log_read_url: Some(APPLY_LOG_URL.to_string()),
        });
        state.run = Some(run);
        refresh_run(&mut state);
        state
            .run
            .clone()
            .ok_or_else(|| RemoteError::NotFound("run".to_string()))
    }

    async fn read_run(&self, id: &str) -> Result<Run, RemoteError> {
        self.enter(RemoteCall::ReadRun { id: id.to_string() }).await?;
        let mut state = self.lock();
        if let Some(run) = state.older_runs.iter().find(|r| r.id == id) {
            return Ok(run.clone());
        }
        let next = advance(&mut state.run_script);
        match state.run.as_mut() {
            Some(run) if run.id == id => {
                if let Some(status) = next {
                    run.status = status;
                }
            }
            _ => return Err(RemoteError::NotFound(format!("run {id}"))),
        }
        refresh_run(&mut state);
        state
            .run
            .clone()
            .ok_or_else(|| RemoteError::NotFound(format!("run {id}")))
    }

    async fn list_runs(&self, workspace_id: &str, page: u32) -> Result<RunPage, RemoteError> {
        self.enter(RemoteCall::ListRuns {
            workspace_id: workspace_id.to_string(),
            page,
        })
        .await?;
        let state = self.lock();
        let items = state
            .run
            .iter()
            .chain(state.older_runs.iter())
            .cloned()
            .collect();
        Ok(RunPage {
            items,
            current_page: 1,
            total_pages: 1,
        })
    }

    async fn apply_run(&self, id: &str, _comment: &str) -> Result<(), RemoteError> {
        self.enter(RemoteCall::ApplyRun { id: id.to_string() }).await?;
        self.with_run(id, |state| {
            state.run_script = state.apply_script.clone();
            if let Some(run) = state.run.as_mut() {
                run.status = RunStatus::Confirmed;
            }
            refresh_run(state);
        })
    }

    async fn cancel_run(&self, id: &str, _comment: &str) -> Result<(), RemoteError> {
        self.enter(RemoteCall::CancelRun { id: id.to_string() }).await?;
        self.with_run(id, |state| {
            state.run_script = VecDeque::from([RunStatus::Canceled]);
            if let Some(run) = state.run.as_mut() {
                run.status = RunStatus::Canceled;
            }
            refresh_run(state);
        })
    }

    async fn discard_run(&self, id: &str, _comment: &str) -> Result<(), RemoteError> {
        self.enter(RemoteCall::DiscardRun { id: id.to_string() }).await?;
        self.with_run(id, |state| {
            state.run_script = VecDeque::from([RunStatus::Discarded]);
            if let Some(run) = state.run.as_mut() {
                run.status = RunStatus::Discarded;
            }
            refresh_run(state);
        })
    }

    async fn read_cost_estimate(&self, id: &str) -> Result<CostEstimate, RemoteError> {
        self.enter(RemoteCall::ReadCostEstimate { id: id.to_string() })
            .await?;
        let mut state = self.lock();
        match state.cost_estimate.as_mut() {
            Some((ce_id, script)) if *ce_id == id => advance(script)
                .ok_or_else(|| RemoteError::NotFound(format!("cost estimate {id}"))),
            _ => Err(RemoteError::NotFound(format!("cost estimate {id}"))),
        }
    }

    async fn read_policy_check(&self, id: &str) -> Result<PolicyCheck, RemoteError> {
        self.enter(RemoteCall::ReadPolicyCheck { id: id.to_string() })
            .await?;
        let mut state = self.lock();
        state
            .policy_checks
            .iter_mut()
            .find(|(pc_id, _)| pc_id == id)
            .and_then(|(_, script)| advance(script))
            .ok_or_else(|| RemoteError::NotFound(format!("policy check {id}")))
    }

    async fn list_task_stages(&self, run_id: &str) -> Result<Vec<TaskStage>, RemoteError> {
        self.enter(RemoteCall::ListTaskStages {
            run_id: run_id.to_string(),
        })
        .await?;
        Ok(self
            .lock()
            .task_stages
            .iter()
            .filter_map(|(_, script)| script.front().cloned())
            .collect())
    }

    async fn read_task_stage(&self, id: &str) -> Result<TaskStage, RemoteError> {
        self.enter(RemoteCall::ReadTaskStage { id: id.to_string() })
            .await?;
        let mut state = self.lock();
        state
            .task_stages
            .iter_mut()
            .find(|(ts_id, _)| ts_id == id)
            .and_then(|(_, script)| advance(script))
            .ok_or_else(|| RemoteError::NotFound(format!("task stage {id}")))
    }

    async fn read_redacted_plan(&self, plan_id: &str) -> Result<RedactedPlan, RemoteError> {
        self.enter(RemoteCall::ReadRedactedPlan {
            plan_id: plan_id.to_string(),
        })
        .await?;
        self.lock()
            .redacted_plan
            .clone()
            .ok_or_else(|| RemoteError::NotFound(format!("plan {plan_id}")))
    }

    async fn read_logs(&self, log_read_url: &str) -> Result<LogStream, RemoteError> {
        self.enter(RemoteCall::ReadLogs {
            url: log_read_url.to_string(),
        })
        .await?;
        let mut state = self.lock();
        let lines = state.logs.get(log_read_url).cloned().unwrap_or_default();
        let (tx, rx) = mpsc::channel(lines.len() + 1);
        for line in lines {
            let _ = tx.try_send(Ok(line));
        }
        if state.held_logs.contains(log_read_url) {
            state.open_streams.push(tx);
        }
        Ok(rx)
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
