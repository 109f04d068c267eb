// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The background task driving one operation
//!
//! Cancellation precedence: a hard cancel ends every wait immediately. Until
//! the run is created a graceful stop also interrupts, so nothing is queued
//! remotely. Afterwards it is observed at the next poll or log read and
//! offers to cancel the remote run; remote calls and prompts from then on are
//! raced against the hard cancel only.

use crate::error::BackendError;
use crate::guard::LockTimeoutGuard;
use crate::operation::Completion;
use crate::report;
use crate::validate::validate;
use relay_adapters::{Interrupter, Prompt, Query, RemoteClient, Renderer, StateLocker};
use relay_core::{
    Diagnostic, LockInfo, LogFilter, Operation, OperationResult, PollConfig, Run, Stage,
};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Backend settings shared by every operation
#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub organization: String,
    pub polling: PollConfig,
    pub filter: LogFilter,
}

pub(crate) struct OperationTask<R, L, P, I, Rd> {
    pub remote: R,
    pub locker: L,
    pub prompt: P,
    pub interrupter: I,
    pub renderer: Rd,
    pub settings: Arc<Settings>,
    pub op: Operation,
    /// Remote workspace name, already resolved
    pub workspace_name: String,
    pub lock_id: String,
    pub stop: CancellationToken,
    pub cancel: CancellationToken,
    /// Set by the lock-timeout guard: cancel the remote run without asking
    pub approved: Arc<AtomicBool>,
}

impl<R, L, P, I, Rd> OperationTask<R, L, P, I, Rd>
where
    R: RemoteClient,
    L: StateLocker,
    P: Prompt,
    I: Interrupter,
    Rd: Renderer,
{
    pub async fn run(self, completion: Completion) {
        let span = tracing::info_span!(
            "operation",
            kind = %self.op.kind,
            workspace = %self.workspace_name,
        );
        async move {
            let info = LockInfo::new(
                self.lock_id.clone(),
                self.op.kind.to_string(),
                self.workspace_name.clone(),
            );
            let result = match self.interruptible(self.locker.lock(&info)).await {
                Ok(()) => {
                    let result = self.drive(&completion).await;
                    self.release(&completion).await;
                    result
                }
                Err(BackendError::Canceled | BackendError::Stopped) => {
                    // The abandoned acquisition may still have succeeded
                    self.release(&completion).await;
                    OperationResult::Failure
                }
                Err(e) => {
                    completion.push(report::diagnostic(&e));
                    OperationResult::Failure
                }
            };
            tracing::info!(?result, "operation finished");
            completion.finish(result);
        }
        .instrument(span)
        .await
    }

    async fn release(&self, completion: &Completion) {
        if let Err(e) = self.locker.unlock().await {
            tracing::warn!(error = %e, "failed to release state lock");
            completion.push(
                Diagnostic::warning("Error releasing the state lock").with_detail(format!(
                    "{}\n\nThe lock may need to be removed manually (lock ID {}).",
                    e, self.lock_id
                )),
            );
        }
    }

    async fn drive(&self, completion: &Completion) -> OperationResult {
        let mut run_id = None;
        match self.execute(completion, &mut run_id).await {
            Ok(true) => OperationResult::Success,
            Ok(false) => OperationResult::Failure,
            Err(BackendError::Stopped) => {
                tracing::info!(run_id = ?run_id, "stop requested");
                if let Some(id) = run_id {
                    match self.negotiate_cancel(&id).await {
                        Ok(()) | Err(BackendError::Canceled) => {}
                        Err(e) => completion.push(report::diagnostic(&e)),
                    }
                }
                OperationResult::Failure
            }
            Err(BackendError::Canceled) => {
                tracing::info!("hard cancel, abandoning remote run");
                OperationResult::Failure
            }
            Err(e) => {
                tracing::warn!(error = %e, "operation failed");
                completion.push(report::diagnostic(&e));
                OperationResult::Failure
            }
        }
    }

    async fn execute(
        &self,
        completion: &Completion,
        run_id: &mut Option<String>,
    ) -> Result<bool, BackendError> {
        let workspace = self
            .interruptible(
                self.remote
                    .read_workspace(&self.settings.organization, &self.workspace_name),
            )
            .await?;
        let service = self.interruptible(self.remote.service_info()).await?;

        let validated = validate(&self.op, &workspace, &service)?;
        for warning in validated.warnings {
            completion.push(warning);
        }
        let render_plan =
            workspace.structured_run_output_enabled && service.supports_structured_output();

        let run = self.submit(&workspace, &validated.variables).await?;
        *run_id = Some(run.id.clone());
        completion.observe(&run);
        let _guard = self.guard().arm(&run.id, self.guard_duration());

        let stages = self.race(self.remote.list_task_stages(&run.id)).await?;

        let run = self.wait_for_run(&workspace, run).await?;
        let mut ok = self
            .await_task_stage(&stages, Stage::PrePlan, completion)
            .await?;

        let run = self.follow_plan(run, render_plan).await?;
        completion.observe(&run);

        ok &= self
            .await_task_stage(&stages, Stage::PostPlan, completion)
            .await?;
        if let Some(id) = &run.cost_estimate_id {
            ok &= self.cost_estimate(id).await?;
        }
        for id in &run.policy_check_ids {
            ok &= self.policy_check(id, completion).await?;
        }

        if !ok || run.status.is_failure() {
            return Ok(false);
        }
        if !self.op.kind.applies() {
            return Ok(true);
        }
        self.apply(&workspace, run, completion).await
    }

    fn guard(&self) -> LockTimeoutGuard<R, I, Rd> {
        LockTimeoutGuard {
            remote: self.remote.clone(),
            interrupter: self.interrupter.clone(),
            renderer: self.renderer.clone(),
            approved: Arc::clone(&self.approved),
            stop: self.stop.clone(),
            cancel: self.cancel.clone(),
        }
    }

    /// The operation's lock timeout, else the locker's; zero disables the guard
    fn guard_duration(&self) -> Duration {
        if self.op.lock_timeout.is_zero() {
            self.locker.timeout()
        } else {
            self.op.lock_timeout
        }
    }

    /// After a graceful stop: offer to cancel the remote run
    async fn negotiate_cancel(&self, run_id: &str) -> Result<(), BackendError> {
        let run: Run = self.race(self.remote.read_run(run_id)).await?;
        if !run.actions.is_cancelable {
            return Ok(());
        }
        if !self.op.auto_approve && !self.approved.load(Ordering::SeqCst) {
            let query = Query::new(
                "Do you want to cancel the remote operation?",
                "Only 'yes' will be accepted to cancel.",
            );
            let answer = self.race(self.prompt.ask(&query)).await?;
            if answer != "yes" {
                self.renderer.print("The remote operation was not cancelled.");
                return Ok(());
            }
        }
        self.race(self.remote.cancel_run(run_id, "Canceled by relay"))
            .await?;
        self.renderer
            .print("The remote operation was successfully cancelled.");
        Ok(())
    }

    /// Await `fut` unless the operation is hard-canceled first
    pub(crate) async fn race<T, E>(
        &self,
        fut: impl Future<Output = Result<T, E>>,
    ) -> Result<T, BackendError>
    where
        E: Into<BackendError>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(BackendError::Canceled),
            result = fut => result.map_err(Into::into),
        }
    }

    /// Like [`Self::race`], but a graceful stop also interrupts
    pub(crate) async fn interruptible<T, E>(
        &self,
        fut: impl Future<Output = Result<T, E>>,
    ) -> Result<T, BackendError>
    where
        E: Into<BackendError>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(BackendError::Canceled),
            _ = self.stop.cancelled() => Err(BackendError::Stopped),
            result = fut => result.map_err(Into::into),
        }
    }

    /// Fail if a stop or cancel has already been requested
    pub(crate) fn checkpoint(&self) -> Result<(), BackendError> {
        if self.cancel.is_cancelled() {
            Err(BackendError::Canceled)
        } else if self.stop.is_cancelled() {
            Err(BackendError::Stopped)
        } else {
            Ok(())
        }
    }

    pub(crate) async fn sleep(&self, duration: Duration) -> Result<(), BackendError> {
        self.interruptible(async {
            tokio::time::sleep(duration).await;
            Ok::<_, BackendError>(())
        })
        .await
    }
}
