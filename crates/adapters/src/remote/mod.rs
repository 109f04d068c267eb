// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote execution service client

mod dto;
mod http;

pub use http::HttpRemote;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeRemote, RemoteCall, APPLY_LOG_URL, PLAN_LOG_URL};

use async_trait::async_trait;
use relay_core::{
    ConfigurationVersion, ConfigurationVersionOptions, CostEstimate, PolicyCheck, RedactedPlan,
    Run, RunOptions, RunPage, ServiceInfo, TaskStage, Workspace, WorkspaceFilter,
};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors from the remote service
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    /// The service answers 404 both for missing resources and for ones the
    /// caller may not see
    #[error("{0} not found")]
    NotFound(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("unexpected status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("invalid response: {0}")]
    Decode(String),
}

impl RemoteError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound(_))
    }
}

/// A request about to be retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryAttempt {
    /// Zero for the first try
    pub attempt: u32,
    /// Status code of the failed response, if one was received
    pub status: Option<u16>,
}

/// Invoked before every retry of a request
pub type RetryHook = Arc<dyn Fn(RetryAttempt) + Send + Sync>;

/// Lines of a phase log. The channel closes after the end-of-text marker.
pub type LogStream = mpsc::Receiver<Result<String, RemoteError>>;

/// Client for the remote execution service
#[async_trait]
pub trait RemoteClient: Clone + Send + Sync + 'static {
    /// A copy of this client that reports retries through `hook`
    fn with_retry_hook(&self, hook: RetryHook) -> Self;

    async fn service_info(&self) -> Result<ServiceInfo, RemoteError>;

    async fn read_workspace(
        &self,
        organization: &str,
        name: &str,
    ) -> Result<Workspace, RemoteError>;

    async fn list_workspaces(
        &self,
        organization: &str,
        filter: &WorkspaceFilter,
    ) -> Result<Vec<Workspace>, RemoteError>;

    async fn create_configuration_version(
        &self,
        workspace_id: &str,
        options: ConfigurationVersionOptions,
    ) -> Result<ConfigurationVersion, RemoteError>;

    async fn read_configuration_version(
        &self,
        id: &str,
    ) -> Result<ConfigurationVersion, RemoteError>;

    async fn upload_configuration(&self, upload_url: &str, archive: Vec<u8>)
        -> Result<(), RemoteError>;

    async fn create_run(&self, options: &RunOptions) -> Result<Run, RemoteError>;

    async fn read_run(&self, id: &str) -> Result<Run, RemoteError>;

    /// One page of a workspace's runs, most recent first
    async fn list_runs(&self, workspace_id: &str, page: u32) -> Result<RunPage, RemoteError>;

    async fn apply_run(&self, id: &str, comment: &str) -> Result<(), RemoteError>;

    async fn cancel_run(&self, id: &str, comment: &str) -> Result<(), RemoteError>;

    async fn discard_run(&self, id: &str, comment: &str) -> Result<(), RemoteError>;

    async fn read_cost_estimate(&self, id: &str) -> Result<CostEstimate, RemoteError>;

    async fn read_policy_check(&self, id: &str) -> Result<PolicyCheck, RemoteError>;

    async fn list_task_stages(&self, run_id: &str) -> Result<Vec<TaskStage>, RemoteError>;

    async fn read_task_stage(&self, id: &str) -> Result<TaskStage, RemoteError>;

    async fn read_redacted_plan(&self, plan_id: &str) -> Result<RedactedPlan, RemoteError>;

    /// Start following a phase log
    async fn read_logs(&self, log_read_url: &str) -> Result<LogStream, RemoteError>;
}
