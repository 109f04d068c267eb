// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON:API client for the remote service over blocking `ureq`
//!
//! Requests run on the blocking pool. Transport errors, 429 and 5xx
//! responses are retried with exponential backoff up to `max_retries`.

use super::dto::{self, Document, Resource};
use super::{LogStream, RemoteClient, RemoteError, RetryAttempt, RetryHook};
use async_trait::async_trait;
use relay_core::{
    BackendConfig, ConfigurationVersion, ConfigurationVersionOptions, CostEstimate, PolicyCheck,
    RedactedPlan, Run, RunOptions, RunPage, ServiceInfo, TaskStage, Workspace, WorkspaceFilter,
};
use serde_json::Value;
use std::borrow::Cow;
use std::time::Duration;
use tokio::sync::mpsc;

const JSON_API: &str = "application/vnd.api+json";
const API_VERSION_HEADER: &str = "tfp-api-version";
const RELEASE_HEADER: &str = "x-tfe-version";

const RETRY_WAIT_MIN: Duration = Duration::from_millis(100);
const RETRY_WAIT_MAX: Duration = Duration::from_millis(400);

const LOG_CHUNK: usize = 65_536;
const LOG_POLL_INTERVAL: Duration = Duration::from_millis(500);
const STX: u8 = 0x02;
const ETX: u8 = 0x03;

#[derive(Debug, Clone, Copy)]
enum Method {
    Get,
    Post,
    Put,
}

#[derive(Debug, Clone)]
struct Request {
    method: Method,
    url: String,
    query: Vec<(String, String)>,
    body: Option<Vec<u8>>,
    content_type: &'static str,
}

impl Request {
    fn get(url: String) -> Self {
        Self {
            method: Method::Get,
            url,
            query: Vec::new(),
            body: None,
            content_type: JSON_API,
        }
    }

    fn post(url: String, body: &Value) -> Self {
        Self {
            method: Method::Post,
            url,
            query: Vec::new(),
            body: Some(body.to_string().into_bytes()),
            content_type: JSON_API,
        }
    }

    fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }
}

struct Reply {
    status: u16,
    body: Vec<u8>,
    api_version: Option<String>,
    release: Option<String>,
}

impl Reply {
    fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Remote service client over HTTPS
#[derive(Clone)]
pub struct HttpRemote {
    agent: ureq::Agent,
    base_url: String,
    token: Option<String>,
    max_retries: u32,
    hook: Option<RetryHook>,
}

impl HttpRemote {
    pub fn new(config: &BackendConfig) -> Self {
        let agent_config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(config.http.timeout))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(agent_config),
            base_url: config.base_url(),
            token: config.token.clone(),
            max_retries: config.http.max_retries,
            hook: None,
        }
    }

    fn api(&self, path: &str) -> String {
        format!("{}/api/v2/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Send with retries, returning the first non-retryable reply
    async fn send(&self, request: Request) -> Result<Reply, RemoteError> {
        let mut last_status = None;
        let mut attempt = 0;
        loop {
            if let Some(hook) = &self.hook {
                hook(RetryAttempt {
                    attempt,
                    status: last_status,
                });
            }

            let agent = self.agent.clone();
            let token = self
                .token
                .clone()
                .filter(|_| request.url.starts_with(&self.base_url));
            let req = request.clone();
            let outcome = tokio::task::spawn_blocking(move || call(&agent, token.as_deref(), &req))
                .await
                .map_err(|e| RemoteError::Transport(e.to_string()))?;

            let retryable = match &outcome {
                Ok(reply) => reply.status == 429 || reply.status >= 500,
                Err(_) => true,
            };
            if !retryable || attempt >= self.max_retries {
                return match outcome {
                    Ok(reply) => Ok(reply),
                    Err(e) => Err(RemoteError::Transport(e.to_string())),
                };
            }

            last_status = outcome.as_ref().ok().map(|r| r.status);
            tracing::debug!(
                url = %request.url,
                attempt,
                status = ?last_status,
                "retrying request"
            );
            tokio::time::sleep(retry_wait(attempt)).await;
            attempt += 1;
        }
    }

    /// Send and map non-2xx statuses to errors
    async fn fetch(&self, request: Request, resource: impl Into<String>) -> Result<Reply, RemoteError> {
        let reply = self.send(request).await?;
        match reply.status {
            200..=299 => Ok(reply),
            404 => Err(RemoteError::NotFound(resource.into())),
            401 => Err(RemoteError::Unauthorized(dto::error_message(&reply.text()))),
            status => Err(RemoteError::Status {
                status,
                message: dto::error_message(&reply.text()),
            }),
        }
    }

    async fn run_action(&self, id: &str, action: &str, comment: &str) -> Result<(), RemoteError> {
        let body = serde_json::json!({ "comment": comment });
        self.fetch(
            Request::post(self.api(&format!("runs/{id}/actions/{action}")), &body),
            format!("run {id}"),
        )
        .await?;
        Ok(())
    }

    /// Follow a phase log until its end-of-text marker
    ///
    /// Chunks are requested by byte offset, so a chunk may end inside a
    /// multibyte character. Bytes are buffered and only complete lines are
    /// decoded.
    async fn follow_log(self, url: String, tx: mpsc::Sender<Result<String, RemoteError>>) {
        let mut offset = 0usize;
        let mut pending: Vec<u8> = Vec::new();
        loop {
            let request = Request::get(url.clone())
                .query("offset", offset)
                .query("limit", LOG_CHUNK);
            let chunk = match self.fetch(request, "log").await {
                Ok(reply) => reply.body,
                Err(e) => {
                    let _ = tx.send(Err(e)).await;
                    return;
                }
            };

            let mut bytes = chunk.as_slice();
            if offset == 0 {
                bytes = bytes.strip_prefix(&[STX]).unwrap_or(bytes);
            }
            offset += chunk.len();

            let finished = match bytes.iter().position(|&b| b == ETX) {
                Some(end) => {
                    pending.extend_from_slice(&bytes[..end]);
                    true
                }
                None => {
                    pending.extend_from_slice(bytes);
                    false
                }
            };

            for line in take_lines(&mut pending) {
                if tx.send(Ok(line)).await.is_err() {
                    return;
                }
            }

            if finished {
                if !pending.is_empty() {
                    let _ = tx.send(Ok(decode_line(&pending))).await;
                }
                return;
            }
            if chunk.is_empty() {
                tokio::time::sleep(LOG_POLL_INTERVAL).await;
            }
            if tx.is_closed() {
                return;
            }
        }
    }
}

/// Drain every complete line from `pending`, leaving a trailing partial line
fn take_lines(pending: &mut Vec<u8>) -> Vec<String> {
    let Some(last) = pending.iter().rposition(|&b| b == b'\n') else {
        return Vec::new();
    };
    let complete: Vec<u8> = pending.drain(..=last).collect();
    complete[..last]
        .split(|&b| b == b'\n')
        .map(decode_line)
        .collect()
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

fn retry_wait(attempt: u32) -> Duration {
    RETRY_WAIT_MIN
        .saturating_mul(1u32 << attempt.min(16))
        .min(RETRY_WAIT_MAX)
}

fn call(agent: &ureq::Agent, token: Option<&str>, request: &Request) -> Result<Reply, ureq::Error> {
    let auth = token.map(|t| format!("Bearer {t}"));
    let mut response = match request.method {
        Method::Get => {
            let mut builder = agent.get(&request.url).header("Accept", JSON_API);
            for (k, v) in &request.query {
                builder = builder.query(k, v);
            }
            if let Some(auth) = &auth {
                builder = builder.header("Authorization", auth);
            }
            builder.call()?
        }
        Method::Post | Method::Put => {
            let mut builder = match request.method {
                Method::Put => agent.put(&request.url),
                _ => agent.post(&request.url),
            }
            .header("Content-Type", request.content_type);
            if let Some(auth) = &auth {
                builder = builder.header("Authorization", auth);
            }
            builder.send(request.body.as_deref().unwrap_or_default())?
        }
    };

    let header = |name: &str| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    };
    let api_version = header(API_VERSION_HEADER);
    let release = header(RELEASE_HEADER);
    let status = response.status().as_u16();
    let body = response.body_mut().read_to_vec()?;
    Ok(Reply {
        status,
        body,
        api_version,
        release,
    })
}

#[async_trait]
impl RemoteClient for HttpRemote {
    fn with_retry_hook(&self, hook: RetryHook) -> Self {
        Self {
            hook: Some(hook),
            ..self.clone()
        }
    }

    async fn service_info(&self) -> Result<ServiceInfo, RemoteError> {
        let reply = self.fetch(Request::get(self.api("ping")), "ping").await?;
        Ok(ServiceInfo {
            api_version: reply.api_version,
            release: reply.release,
        })
    }

    async fn read_workspace(&self, organization: &str, name: &str) -> Result<Workspace, RemoteError> {
        let url = self.api(&format!("organizations/{organization}/workspaces/{name}"));
        let reply = self
            .fetch(Request::get(url), format!("workspace \"{name}\""))
            .await?;
        let doc: Document<Resource<dto::WorkspaceAttributes>> = dto::decode(&reply.text())?;
        Ok(doc.data.into())
    }

    async fn list_workspaces(
        &self,
        organization: &str,
        filter: &WorkspaceFilter,
    ) -> Result<Vec<Workspace>, RemoteError> {
        let mut workspaces = Vec::new();
        let mut page = 1;
        loop {
            let mut request = Request::get(self.api(&format!("organizations/{organization}/workspaces")))
                .query("page[number]", page)
                .query("page[size]", 100);
            if let Some(search) = &filter.search {
                request = request.query("search[name]", search);
            }
            if !filter.tags.is_empty() {
                request = request.query("search[tags]", filter.tags.join(","));
            }
            let reply = self
                .fetch(request, format!("organization \"{organization}\""))
                .await?;
            let doc: Document<Vec<Resource<dto::WorkspaceAttributes>>> = dto::decode(&reply.text())?;
            let pagination = doc.meta.and_then(|m| m.pagination).unwrap_or_default();
            workspaces.extend(doc.data.into_iter().map(Workspace::from));
            if pagination.current_page >= pagination.total_pages {
                return Ok(workspaces);
            }
            page = pagination.current_page + 1;
        }
    }

    async fn create_configuration_version(
        &self,
        workspace_id: &str,
        options: ConfigurationVersionOptions,
    ) -> Result<ConfigurationVersion, RemoteError> {
        let url = self.api(&format!("workspaces/{workspace_id}/configuration-versions"));
        let body = dto::configuration_version_request(options);
        let reply = self
            .fetch(Request::post(url, &body), format!("workspace {workspace_id}"))
            .await?;
        let doc: Document<Resource<dto::ConfigurationVersionAttributes>> =
            dto::decode(&reply.text())?;
        Ok(doc.data.into())
    }

    async fn read_configuration_version(&self, id: &str) -> Result<ConfigurationVersion, RemoteError> {
        let url = self.api(&format!("configuration-versions/{id}"));
        let reply = self
            .fetch(Request::get(url), format!("configuration version {id}"))
            .await?;
        let doc: Document<Resource<dto::ConfigurationVersionAttributes>> =
            dto::decode(&reply.text())?;
        Ok(doc.data.into())
    }

    async fn upload_configuration(&self, upload_url: &str, archive: Vec<u8>) -> Result<(), RemoteError> {
        let request = Request {
            method: Method::Put,
            url: upload_url.to_string(),
            query: Vec::new(),
            body: Some(archive),
            content_type: "application/octet-stream",
        };
        self.fetch(request, "upload URL").await?;
        Ok(())
    }

    async fn create_run(&self, options: &RunOptions) -> Result<Run, RemoteError> {
        let body = dto::run_request(options);
        let reply = self
            .fetch(
                Request::post(self.api("runs"), &body),
                format!("workspace {}", options.workspace_id),
            )
            .await?;
        let doc: Document<Resource<dto::RunAttributes>> = dto::decode(&reply.text())?;
        Ok(dto::run_from(doc.data, &doc.included))
    }

    async fn read_run(&self, id: &str) -> Result<Run, RemoteError> {
        let request = Request::get(self.api(&format!("runs/{id}"))).query("include", "plan,apply");
        let reply = self.fetch(request, format!("run {id}")).await?;
        let doc: Document<Resource<dto::RunAttributes>> = dto::decode(&reply.text())?;
        Ok(dto::run_from(doc.data, &doc.included))
    }

    async fn list_runs(&self, workspace_id: &str, page: u32) -> Result<RunPage, RemoteError> {
        let request = Request::get(self.api(&format!("workspaces/{workspace_id}/runs")))
            .query("page[number]", page.max(1));
        let reply = self
            .fetch(request, format!("workspace {workspace_id}"))
            .await?;
        Ok(dto::run_page(dto::decode(&reply.text())?))
    }

    async fn apply_run(&self, id: &str, comment: &str) -> Result<(), RemoteError> {
        self.run_action(id, "apply", comment).await
    }

    async fn cancel_run(&self, id: &str, comment: &str) -> Result<(), RemoteError> {
        self.run_action(id, "cancel", comment).await
    }

    async fn discard_run(&self, id: &str, comment: &str) -> Result<(), RemoteError> {
        self.run_action(id, "discard", comment).await
    }

    async fn read_cost_estimate(&self, id: &str) -> Result<CostEstimate, RemoteError> {
        let url = self.api(&format!("cost-estimates/{id}"));
        let reply = self
            .fetch(Request::get(url), format!("cost estimate {id}"))
            .await?;
        let doc: Document<Resource<dto::CostEstimateAttributes>> = dto::decode(&reply.text())?;
        Ok(doc.data.into())
    }

    async fn read_policy_check(&self, id: &str) -> Result<PolicyCheck, RemoteError> {
        let url = self.api(&format!("policy-checks/{id}"));
        let reply = self
            .fetch(Request::get(url), format!("policy check {id}"))
            .await?;
        let doc: Document<Resource<dto::PolicyCheckAttributes>> = dto::decode(&reply.text())?;
        let check = dto::policy_check_from(doc.data, String::new());
        if !check.status.is_terminal() {
            return Ok(check);
        }
        let output_url = self.api(&format!("policy-checks/{id}/output"));
        let output = self
            .fetch(Request::get(output_url), format!("policy check output {id}"))
            .await?;
        Ok(relay_core::PolicyCheck {
            output: output.text().into_owned(),
            ..check
        })
    }

    async fn list_task_stages(&self, run_id: &str) -> Result<Vec<TaskStage>, RemoteError> {
        let request = Request::get(self.api(&format!("runs/{run_id}/task-stages")))
            .query("include", "task_results");
        let reply = self.fetch(request, format!("run {run_id}")).await?;
        let doc: Document<Vec<Resource<dto::TaskStageAttributes>>> = dto::decode(&reply.text())?;
        let included = doc.included;
        Ok(doc
            .data
            .into_iter()
            .map(|r| dto::task_stage_from(r, &included))
            .collect())
    }

    async fn read_task_stage(&self, id: &str) -> Result<TaskStage, RemoteError> {
        let request =
            Request::get(self.api(&format!("task-stages/{id}"))).query("include", "task_results");
        let reply = self.fetch(request, format!("task stage {id}")).await?;
        let doc: Document<Resource<dto::TaskStageAttributes>> = dto::decode(&reply.text())?;
        Ok(dto::task_stage_from(doc.data, &doc.included))
    }

    async fn read_redacted_plan(&self, plan_id: &str) -> Result<RedactedPlan, RemoteError> {
        let url = self.api(&format!("plans/{plan_id}/json-output-redacted"));
        let reply = self.fetch(Request::get(url), format!("plan {plan_id}")).await?;
        let raw: Value = dto::decode(&reply.text())?;
        RedactedPlan::from_json(raw).map_err(|e| RemoteError::Decode(e.to_string()))
    }

    async fn read_logs(&self, log_read_url: &str) -> Result<LogStream, RemoteError> {
        let (tx, rx) = mpsc::channel(256);
        tokio::spawn(self.clone().follow_log(log_read_url.to_string(), tx));
        Ok(rx)
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
