// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run polling and log streaming

use crate::error::BackendError;
use crate::task::OperationTask;
use relay_adapters::{Interrupter, Prompt, RemoteClient, RemoteError, Renderer, StateLocker};
use relay_core::{LogLine, OperationKind, Run, RunStatus, Workspace};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Whole 30-second blocks, as reported in queue status lines
fn elapsed_label(elapsed: Duration) -> String {
    let secs = elapsed.as_secs() / 30 * 30;
    if secs < 60 {
        format!(" ({}s elapsed)", secs)
    } else {
        format!(" ({}m{}s elapsed)", secs / 60, secs % 60)
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
    /// Re-read a value with backoff until `done` holds
    pub(crate) async fn poll<T, F, Fut>(
        &self,
        mut read: F,
        done: impl Fn(&T) -> bool,
    ) -> Result<T, BackendError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RemoteError>>,
    {
        let mut iteration = 0u32;
        loop {
            let value = self.race(read()).await?;
            if done(&value) {
                return Ok(value);
            }
            self.sleep(self.settings.polling.backoff(iteration)).await?;
            iteration = iteration.saturating_add(1);
        }
    }

    /// Poll a run until `done` holds or it reaches a terminal status
    pub(crate) async fn poll_run(
        &self,
        id: &str,
        done: impl Fn(&Run) -> bool,
    ) -> Result<Run, BackendError> {
        self.poll(
            || self.remote.read_run(id),
            |run: &Run| done(run) || run.status.is_terminal(),
        )
        .await
    }

    /// Wait for a run to leave the queue, reporting why it is still waiting
    pub(crate) async fn wait_for_run(
        &self,
        workspace: &Workspace,
        mut run: Run,
    ) -> Result<Run, BackendError> {
        let polling = &self.settings.polling;
        let started = Instant::now();
        let mut updated = started;
        let mut iteration = 0u32;
        loop {
            self.sleep(polling.backoff(iteration)).await?;
            run = self.race(self.remote.read_run(&run.id)).await?;
            if !run.status.is_queued() {
                tracing::debug!(run_id = %run.id, status = %run.status, "run left the queue");
                return Ok(run);
            }

            let now = Instant::now();
            if iteration == 0 || now.duration_since(updated) > polling.status_interval {
                updated = now;
                let elapsed = if iteration > 0 {
                    elapsed_label(now.duration_since(started))
                } else {
                    String::new()
                };
                self.report_queue_status(workspace, &run, &elapsed).await?;
            }
            iteration = iteration.saturating_add(1);
        }
    }

    async fn report_queue_status(
        &self,
        workspace: &Workspace,
        run: &Run,
        elapsed: &str,
    ) -> Result<(), BackendError> {
        let workspace = self
            .race(
                self.remote
                    .read_workspace(&self.settings.organization, &workspace.name),
            )
            .await?;

        if workspace.locked {
            if let Some(current) = &workspace.current_run_id {
                let current = self.race(self.remote.read_run(current)).await?;
                if current.status == RunStatus::Pending {
                    self.renderer.print(&format!(
                        "Waiting for the manually locked workspace to be unlocked...{}",
                        elapsed
                    ));
                    return Ok(());
                }
            }
        }

        if workspace.current_run_id.as_deref() != Some(run.id.as_str()) {
            let position = self.queue_position(&workspace, run).await?;
            if position > 0 {
                self.renderer.print(&format!(
                    "Waiting for {} run(s) to finish before being queued...{}",
                    position, elapsed
                ));
                return Ok(());
            }
        }

        let phase = match self.op.kind {
            OperationKind::Plan => "plan",
            _ => "apply",
        };
        self.renderer
            .print(&format!("Waiting for the {} to start...{}", phase, elapsed));
        Ok(())
    }

    /// Runs ahead of `run`, up to and including the workspace's current run
    async fn queue_position(&self, workspace: &Workspace, run: &Run) -> Result<usize, BackendError> {
        let mut position = 0;
        let mut found = false;
        let mut page = 1;
        loop {
            let runs = self
                .race(self.remote.list_runs(&workspace.id, page))
                .await?;
            for item in &runs.items {
                if !found {
                    found = item.id == run.id;
                    continue;
                }
                if item.status.is_settled()
                    || (self.op.kind == OperationKind::Plan && item.status == RunStatus::Planned)
                {
                    continue;
                }
                position += 1;
                if workspace.current_run_id.as_deref() == Some(item.id.as_str()) {
                    return Ok(position);
                }
            }
            match runs.next_page() {
                Some(next) => page = next,
                None => return Ok(position),
            }
        }
    }

    /// Follow the plan phase: logs, completion, then the final render
    pub(crate) async fn follow_plan(&self, run: Run, render_plan: bool) -> Result<Run, BackendError> {
        if let Some(url) = run.plan.as_ref().and_then(|p| p.log_read_url.as_deref()) {
            self.stream_logs(url, render_plan).await?;
        }
        let run = self
            .poll_run(&run.id, |r| !r.status.is_queued() && !r.status.is_planning())
            .await?;

        let unfinished_failure = run.status.is_failure() && !run.plan_finished();
        if render_plan && !unfinished_failure {
            if let Some(plan) = &run.plan {
                let redacted = self
                    .race(self.remote.read_redacted_plan(&plan.id))
                    .await?;
                self.renderer.render_human_plan(&redacted, run.plan_mode());
            }
        }
        Ok(run)
    }

    /// Stream a phase log to the renderer until it ends
    ///
    /// With a final render pending, records it would duplicate are dropped.
    pub(crate) async fn stream_logs(&self, url: &str, render_pending: bool) -> Result<(), BackendError> {
        let mut lines = self.race(self.remote.read_logs(url)).await?;
        let mut count = 0usize;
        loop {
            let next = self
                .interruptible(async { Ok::<_, BackendError>(lines.recv().await) })
                .await?;
            let Some(line) = next else {
                tracing::debug!(lines = count, "log stream ended");
                return Ok(());
            };
            count += 1;
            match LogLine::parse(&line?) {
                LogLine::Structured(record) => {
                    if self.settings.filter.allows(&record.kind, render_pending) {
                        self.renderer.render_log(&record);
                    }
                }
                LogLine::Raw(text) => self.renderer.print(&text),
            }
        }
    }
}
