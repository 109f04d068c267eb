// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON:API documents exchanged with the remote service

use super::RemoteError;
use relay_core::{
    ConfigurationVersion, ConfigurationVersionOptions, ConfigurationVersionStatus, CostEstimate,
    CostEstimateStatus, Enforcement, ExecutionMode, Permissions, PhaseRef, PhaseStatus,
    PlanMode, PolicyCheck, PolicyResult, PolicyStatus, Run, RunActions, RunOptions, RunPage,
    RunStatus, Stage, StageStatus, TaskResult, TaskStage, TaskStatus, Workspace,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

/// A single-resource or collection document
#[derive(Debug, Deserialize)]
pub(super) struct Document<D> {
    pub data: D,
    #[serde(default)]
    pub included: Vec<Resource<Value>>,
    #[serde(default)]
    pub meta: Option<Meta>,
}

#[derive(Debug, Deserialize)]
pub(super) struct Resource<A> {
    pub id: String,
    pub attributes: A,
    #[serde(default)]
    pub relationships: Value,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct Meta {
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(super) struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
}

pub(super) fn decode<T: DeserializeOwned>(body: &str) -> Result<T, RemoteError> {
    serde_json::from_str(body).map_err(|e| RemoteError::Decode(e.to_string()))
}

/// ID of a to-one relationship
fn related_id(relationships: &Value, name: &str) -> Option<String> {
    relationships[name]["data"]["id"].as_str().map(str::to_owned)
}

/// IDs of a to-many relationship
fn related_ids(relationships: &Value, name: &str) -> Vec<String> {
    relationships[name]["data"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["id"].as_str().map(str::to_owned))
                .collect()
        })
        .unwrap_or_default()
}

// =============================================================================
// Workspaces
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub(super) struct WorkspaceAttributes {
    name: String,
    permissions: PermissionAttributes,
    locked: bool,
    working_directory: Option<String>,
    auto_apply: bool,
    execution_mode: Option<ExecutionMode>,
    vcs_repo: Option<VcsRepo>,
    structured_run_output_enabled: bool,
    tag_names: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct PermissionAttributes {
    can_queue_run: bool,
    can_queue_apply: bool,
    can_queue_destroy: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VcsRepo {
    identifier: String,
}

impl From<Resource<WorkspaceAttributes>> for Workspace {
    fn from(r: Resource<WorkspaceAttributes>) -> Self {
        let a = r.attributes;
        Workspace {
            current_run_id: related_id(&r.relationships, "current-run"),
            id: r.id,
            name: a.name,
            permissions: Permissions {
                can_queue_run: a.permissions.can_queue_run,
                can_queue_apply: a.permissions.can_queue_apply,
                can_queue_destroy: a.permissions.can_queue_destroy,
            },
            locked: a.locked,
            working_directory: a.working_directory.unwrap_or_default(),
            auto_apply: a.auto_apply,
            execution_mode: a.execution_mode.unwrap_or_default(),
            vcs_repo: a.vcs_repo.map(|v| v.identifier),
            structured_run_output_enabled: a.structured_run_output_enabled,
            tags: a.tag_names,
        }
    }
}

// =============================================================================
// Configuration versions
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(super) struct ConfigurationVersionAttributes {
    status: ConfigurationVersionStatus,
    #[serde(default)]
    upload_url: Option<String>,
    #[serde(default)]
    speculative: bool,
    #[serde(default)]
    error_message: Option<String>,
}

impl From<Resource<ConfigurationVersionAttributes>> for ConfigurationVersion {
    fn from(r: Resource<ConfigurationVersionAttributes>) -> Self {
        ConfigurationVersion {
            id: r.id,
            status: r.attributes.status,
            upload_url: r.attributes.upload_url.unwrap_or_default(),
            speculative: r.attributes.speculative,
            error_message: r.attributes.error_message,
        }
    }
}

pub(super) fn configuration_version_request(options: ConfigurationVersionOptions) -> Value {
    json!({
        "data": {
            "type": "configuration-versions",
            "attributes": {
                "auto-queue-runs": options.auto_queue_runs,
                "speculative": options.speculative,
            }
        }
    })
}

// =============================================================================
// Runs
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(super) struct RunAttributes {
    status: RunStatus,
    #[serde(default)]
    actions: ActionAttributes,
    #[serde(default)]
    has_changes: bool,
    #[serde(default)]
    is_destroy: bool,
    #[serde(default = "default_true")]
    refresh: bool,
    #[serde(default)]
    refresh_only: bool,
    #[serde(default)]
    plan_only: bool,
    #[serde(default)]
    message: String,
    #[serde(default)]
    target_addrs: Option<Vec<String>>,
    #[serde(default)]
    replace_addrs: Option<Vec<String>>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct ActionAttributes {
    is_cancelable: bool,
    is_confirmable: bool,
    is_discardable: bool,
    is_force_cancelable: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct PhaseAttributes {
    status: PhaseStatus,
    log_read_url: Option<String>,
}

/// Plan or apply reference, resolved from the `included` section
fn phase_ref(relationships: &Value, name: &str, included: &[Resource<Value>]) -> Option<PhaseRef> {
    let id = related_id(relationships, name)?;
    let attributes = included
        .iter()
        .find(|r| r.id == id)
        .and_then(|r| PhaseAttributes::deserialize(&r.attributes).ok())
        .unwrap_or_default();
    Some(PhaseRef {
        id,
        status: attributes.status,
        log_read_url: attributes.log_read_url,
    })
}

pub(super) fn run_from(r: Resource<RunAttributes>, included: &[Resource<Value>]) -> Run {
    let a = r.attributes;
    Run {
        workspace_id: related_id(&r.relationships, "workspace").unwrap_or_default(),
        configuration_version_id: related_id(&r.relationships, "configuration-version")
            .unwrap_or_default(),
        cost_estimate_id: related_id(&r.relationships, "cost-estimate"),
        policy_check_ids: related_ids(&r.relationships, "policy-checks"),
        plan: phase_ref(&r.relationships, "plan", included),
        apply: phase_ref(&r.relationships, "apply", included),
        id: r.id,
        status: a.status,
        actions: RunActions {
            is_cancelable: a.actions.is_cancelable,
            is_confirmable: a.actions.is_confirmable,
            is_discardable: a.actions.is_discardable,
            is_force_cancelable: a.actions.is_force_cancelable,
        },
        target_addrs: a.target_addrs.unwrap_or_default(),
        replace_addrs: a.replace_addrs.unwrap_or_default(),
        has_changes: a.has_changes,
        is_destroy: a.is_destroy,
        refresh: a.refresh,
        refresh_only: a.refresh_only,
        plan_only: a.plan_only,
        message: a.message,
    }
}

pub(super) fn run_page(doc: Document<Vec<Resource<RunAttributes>>>) -> RunPage {
    let pagination = doc.meta.and_then(|m| m.pagination).unwrap_or_default();
    let included = doc.included;
    RunPage {
        items: doc.data.into_iter().map(|r| run_from(r, &included)).collect(),
        current_page: pagination.current_page.max(1),
        total_pages: pagination.total_pages.max(1),
    }
}

pub(super) fn run_request(options: &RunOptions) -> Value {
    let mut attributes = json!({
        "message": options.message,
        "plan-only": options.plan_only,
        "is-destroy": options.plan_mode == PlanMode::Destroy,
    });
    if options.plan_mode == PlanMode::RefreshOnly {
        attributes["refresh-only"] = json!(true);
    }
    if let Some(refresh) = options.refresh {
        attributes["refresh"] = json!(refresh);
    }
    if !options.target_addrs.is_empty() {
        attributes["target-addrs"] = json!(options.target_addrs);
    }
    if !options.replace_addrs.is_empty() {
        attributes["replace-addrs"] = json!(options.replace_addrs);
    }
    if !options.variables.is_empty() {
        attributes["variables"] = options
            .variables
            .iter()
            .map(|(key, value)| json!({ "key": key, "value": value }))
            .collect();
    }
    json!({
        "data": {
            "type": "runs",
            "attributes": attributes,
            "relationships": {
                "workspace": {
                    "data": { "type": "workspaces", "id": options.workspace_id }
                },
                "configuration-version": {
                    "data": {
                        "type": "configuration-versions",
                        "id": options.configuration_version_id
                    }
                }
            }
        }
    })
}

// =============================================================================
// Stages
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(super) struct CostEstimateAttributes {
    status: CostEstimateStatus,
    #[serde(default)]
    matched_resources_count: u32,
    #[serde(default)]
    resources_count: u32,
    #[serde(default)]
    proposed_monthly_cost: String,
    #[serde(default)]
    delta_monthly_cost: String,
    #[serde(default)]
    error_message: Option<String>,
}

impl From<Resource<CostEstimateAttributes>> for CostEstimate {
    fn from(r: Resource<CostEstimateAttributes>) -> Self {
        let a = r.attributes;
        CostEstimate {
            id: r.id,
            status: a.status,
            matched_resources_count: a.matched_resources_count,
            resources_count: a.resources_count,
            proposed_monthly_cost: a.proposed_monthly_cost,
            delta_monthly_cost: a.delta_monthly_cost,
            error_message: a.error_message,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(super) struct PolicyCheckAttributes {
    status: PolicyStatus,
    #[serde(default)]
    result: PolicyResultAttributes,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct PolicyResultAttributes {
    passed: u32,
    total_failed: u32,
    advisory_failed: u32,
    soft_failed: u32,
    hard_failed: u32,
}

pub(super) fn policy_check_from(r: Resource<PolicyCheckAttributes>, output: String) -> PolicyCheck {
    let result = r.attributes.result;
    PolicyCheck {
        id: r.id,
        status: r.attributes.status,
        result: PolicyResult {
            passed: result.passed,
            total_failed: result.total_failed,
            advisory_failed: result.advisory_failed,
            soft_failed: result.soft_failed,
            hard_failed: result.hard_failed,
        },
        output,
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct TaskStageAttributes {
    stage: Stage,
    status: StageStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct TaskResultAttributes {
    #[serde(default)]
    task_name: String,
    status: TaskStatus,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    workspace_task_enforcement_level: Enforcement,
    #[serde(default)]
    url: Option<String>,
}

pub(super) fn task_stage_from(
    r: Resource<TaskStageAttributes>,
    included: &[Resource<Value>],
) -> TaskStage {
    let result_ids = related_ids(&r.relationships, "task-results");
    let task_results = included
        .iter()
        .filter(|inc| result_ids.contains(&inc.id))
        .filter_map(|inc| {
            let a = TaskResultAttributes::deserialize(&inc.attributes).ok()?;
            Some(TaskResult {
                id: inc.id.clone(),
                task_name: a.task_name,
                status: a.status,
                message: a.message.unwrap_or_default(),
                enforcement: a.workspace_task_enforcement_level,
                url: a.url,
            })
        })
        .collect();
    TaskStage {
        id: r.id,
        stage: r.attributes.stage,
        status: r.attributes.status,
        task_results,
    }
}

/// Human-readable message from a JSON:API error document
pub(super) fn error_message(body: &str) -> String {
    let Ok(doc) = serde_json::from_str::<Value>(body) else {
        return body.trim().chars().take(200).collect();
    };
    doc["errors"]
        .as_array()
        .map(|errors| {
            errors
                .iter()
                .filter_map(|e| e["detail"].as_str().or(e["title"].as_str()))
                .collect::<Vec<_>>()
                .join("; ")
        })
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| body.trim().chars().take(200).collect())
}

#[cfg(test)]
#[path = "dto_tests.rs"]
mod tests;
