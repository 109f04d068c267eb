// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::locker::{LockError, StateLocker};
use crate::remote::{LogStream, RemoteClient, RemoteError, RetryHook};
use async_trait::async_trait;
use relay_core::{
    ConfigurationVersion, ConfigurationVersionOptions, CostEstimate, LockInfo, PolicyCheck,
    RedactedPlan, Run, RunOptions, RunPage, ServiceInfo, TaskStage, Workspace, WorkspaceFilter,
};
use std::time::{Duration, Instant};
use tracing::Instrument;

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// Wrapper that adds tracing to any RemoteClient
#[derive(Clone)]
pub struct TracedRemote<R> {
    inner: R,
}

impl<R> TracedRemote<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<R: RemoteClient> RemoteClient for TracedRemote<R> {
    fn with_retry_hook(&self, hook: RetryHook) -> Self {
        Self::new(self.inner.with_retry_hook(hook))
    }

    async fn service_info(&self) -> Result<ServiceInfo, RemoteError> {
        let result = self.inner.service_info().await;
        match &result {
            Ok(info) => tracing::debug!(
                api_version = ?info.api_version,
                release = ?info.release,
                "service info"
            ),
            Err(e) => tracing::warn!(error = %e, "service info unavailable"),
        }
        result
    }

    async fn read_workspace(
        &self,
        organization: &str,
        name: &str,
    ) -> Result<Workspace, RemoteError> {
        let span = tracing::info_span!("remote.read_workspace", organization, name);
        async {
            let result = self.inner.read_workspace(organization, name).await;
            match &result {
                Ok(ws) => tracing::debug!(workspace_id = %ws.id, locked = ws.locked, "read"),
                Err(e) => tracing::error!(error = %e, "read failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn list_workspaces(
        &self,
        organization: &str,
        filter: &WorkspaceFilter,
    ) -> Result<Vec<Workspace>, RemoteError> {
        let result = self.inner.list_workspaces(organization, filter).await;
        tracing::debug!(
            organization,
            count = result.as_ref().map(|v| v.len()).ok(),
            "listed workspaces"
        );
        result
    }

    async fn create_configuration_version(
        &self,
        workspace_id: &str,
        options: ConfigurationVersionOptions,
    ) -> Result<ConfigurationVersion, RemoteError> {
        let span = tracing::info_span!("remote.create_configuration_version", workspace_id);
        async {
            let start = Instant::now();
            let result = self
                .inner
                .create_configuration_version(workspace_id, options)
                .await;
            match &result {
                Ok(cv) => tracing::info!(
                    configuration_version_id = %cv.id,
                    elapsed_ms = elapsed_ms(start),
                    "created"
                ),
                Err(e) => tracing::error!(elapsed_ms = elapsed_ms(start), error = %e, "failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn read_configuration_version(
        &self,
        id: &str,
    ) -> Result<ConfigurationVersion, RemoteError> {
        let result = self.inner.read_configuration_version(id).await;
        tracing::trace!(id, status = ?result.as_ref().map(|cv| cv.status).ok(), "polled");
        result
    }

    async fn upload_configuration(
        &self,
        upload_url: &str,
        archive: Vec<u8>,
    ) -> Result<(), RemoteError> {
        let span = tracing::info_span!("remote.upload", bytes = archive.len());
        async {
            let start = Instant::now();
            let result = self.inner.upload_configuration(upload_url, archive).await;
            match &result {
                Ok(()) => tracing::info!(elapsed_ms = elapsed_ms(start), "uploaded"),
                Err(e) => tracing::error!(elapsed_ms = elapsed_ms(start), error = %e, "failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn create_run(&self, options: &RunOptions) -> Result<Run, RemoteError> {
        let span = tracing::info_span!(
            "remote.create_run",
            workspace_id = %options.workspace_id,
            plan_mode = ?options.plan_mode,
        );
        async {
            let start = Instant::now();
            let result = self.inner.create_run(options).await;
            match &result {
                Ok(run) => tracing::info!(
                    run_id = %run.id,
                    elapsed_ms = elapsed_ms(start),
                    "run created"
                ),
                Err(e) => tracing::error!(elapsed_ms = elapsed_ms(start), error = %e, "failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn read_run(&self, id: &str) -> Result<Run, RemoteError> {
        let result = self.inner.read_run(id).await;
        tracing::trace!(id, status = ?result.as_ref().map(|r| r.status).ok(), "polled");
        result
    }

    async fn list_runs(&self, workspace_id: &str, page: u32) -> Result<RunPage, RemoteError> {
        let result = self.inner.list_runs(workspace_id, page).await;
        tracing::trace!(
            workspace_id,
            page,
            count = result.as_ref().map(|p| p.items.len()).ok(),
            "listed runs"
        );
        result
    }

    async fn apply_run(&self, id: &str, comment: &str) -> Result<(), RemoteError> {
        let result = self.inner.apply_run(id, comment).await;
        match &result {
            Ok(()) => tracing::info!(run_id = id, "apply confirmed"),
            Err(e) => tracing::error!(run_id = id, error = %e, "apply failed"),
        }
        result
    }

    async fn cancel_run(&self, id: &str, comment: &str) -> Result<(), RemoteError> {
        let result = self.inner.cancel_run(id, comment).await;
        match &result {
            Ok(()) => tracing::info!(run_id = id, "cancel requested"),
            Err(e) => tracing::warn!(run_id = id, error = %e, "cancel failed"),
        }
        result
    }

    async fn discard_run(&self, id: &str, comment: &str) -> Result<(), RemoteError> {
        let result = self.inner.discard_run(id, comment).await;
        match &result {
            Ok(()) => tracing::info!(run_id = id, "discarded"),
            Err(e) => tracing::warn!(run_id = id, error = %e, "discard failed"),
        }
        result
    }

    async fn read_cost_estimate(&self, id: &str) -> Result<CostEstimate, RemoteError> {
        let result = self.inner.read_cost_estimate(id).await;
        tracing::trace!(id, status = ?result.as_ref().map(|c| c.status).ok(), "polled");
        result
    }

    async fn read_policy_check(&self, id: &str) -> Result<PolicyCheck, RemoteError> {
        let result = self.inner.read_policy_check(id).await;
        tracing::trace!(id, status = ?result.as_ref().map(|p| p.status).ok(), "polled");
        result
    }

    async fn list_task_stages(&self, run_id: &str) -> Result<Vec<TaskStage>, RemoteError> {
        self.inner.list_task_stages(run_id).await
    }

    async fn read_task_stage(&self, id: &str) -> Result<TaskStage, RemoteError> {
        let result = self.inner.read_task_stage(id).await;
        tracing::trace!(id, status = ?result.as_ref().map(|s| s.status).ok(), "polled");
        result
    }

    async fn read_redacted_plan(&self, plan_id: &str) -> Result<RedactedPlan, RemoteError> {
        let result = self.inner.read_redacted_plan(plan_id).await;
        if let Err(e) = &result {
            tracing::warn!(plan_id, error = %e, "redacted plan unavailable");
        }
        result
    }

    async fn read_logs(&self, log_read_url: &str) -> Result<LogStream, RemoteError> {
        let result = self.inner.read_logs(log_read_url).await;
        match &result {
            Ok(_) => tracing::debug!("following logs"),
            Err(e) => tracing::error!(error = %e, "log stream failed"),
        }
        result
    }
}

/// Wrapper that adds tracing to any StateLocker
#[derive(Clone)]
pub struct TracedStateLocker<L> {
    inner: L,
}

impl<L> TracedStateLocker<L> {
    pub fn new(inner: L) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<L: StateLocker> StateLocker for TracedStateLocker<L> {
    async fn lock(&self, info: &LockInfo) -> Result<(), LockError> {
        let span = tracing::info_span!("state.lock", id = %info.id, operation = %info.operation);
        async {
            let start = Instant::now();
            let result = self.inner.lock(info).await;
            match &result {
                Ok(()) => tracing::info!(elapsed_ms = elapsed_ms(start), "acquired"),
                Err(e) => tracing::error!(elapsed_ms = elapsed_ms(start), error = %e, "failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn unlock(&self) -> Result<(), LockError> {
        let result = self.inner.unlock().await;
        match &result {
            Ok(()) => tracing::info!("state unlocked"),
            Err(e) => tracing::warn!(error = %e, "unlock failed"),
        }
        result
    }

    fn timeout(&self) -> Duration {
        self.inner.timeout()
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
