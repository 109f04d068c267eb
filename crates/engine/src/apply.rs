// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Apply phase: confirmation, apply request and apply log streaming

use crate::error::BackendError;
use crate::operation::Completion;
use crate::task::OperationTask;
use relay_adapters::{Interrupter, Prompt, Query, RemoteClient, Renderer, StateLocker};
use relay_core::{PlanMode, Run, RunStatus, Workspace};

const APPLY_COMMENT: &str = "Applied by relay";
const DISCARD_COMMENT: &str = "Discarded by relay";

impl<R, L, P, I, Rd> OperationTask<R, L, P, I, Rd>
where
    R: RemoteClient,
    L: StateLocker,
    P: Prompt,
    I: Interrupter,
    Rd: Renderer,
{
    /// Drive a planned run through its apply phase
    pub(crate) async fn apply(
        &self,
        workspace: &Workspace,
        run: Run,
        completion: &Completion,
    ) -> Result<bool, BackendError> {
        if !run.has_changes {
            self.renderer
                .print("No changes. Your infrastructure matches the configuration.");
            return Ok(true);
        }

        let run = self
            .poll_run(&run.id, |r| {
                r.actions.is_confirmable || r.status.is_applying() || r.status == RunStatus::Confirmed
            })
            .await?;
        completion.observe(&run);
        if run.status.is_terminal() {
            return Ok(!run.status.is_failure());
        }

        if run.actions.is_confirmable && !workspace.auto_apply {
            if !self.op.auto_approve {
                self.confirm_apply(workspace, &run).await?;
            }
            self.race(self.remote.apply_run(&run.id, APPLY_COMMENT))
                .await?;
            tracing::info!(run_id = %run.id, "apply requested");
        }

        let run = self.race(self.remote.read_run(&run.id)).await?;
        if let Some(url) = run.apply.as_ref().and_then(|a| a.log_read_url.as_deref()) {
            self.stream_logs(url, false).await?;
        }
        let run = self.poll_run(&run.id, |_| false).await?;
        completion.observe(&run);
        Ok(run.status == RunStatus::Applied)
    }

    /// Ask before applying; anything but "yes" discards the run
    async fn confirm_apply(&self, workspace: &Workspace, run: &Run) -> Result<(), BackendError> {
        let query = match self.op.plan_mode {
            PlanMode::Destroy => Query::new(
                format!(
                    "Do you really want to destroy all resources in workspace \"{}\"?",
                    workspace.name
                ),
                "relay will destroy all your managed infrastructure, as shown above.\nThere is no undo. Only 'yes' will be accepted to confirm.",
            ),
            _ => Query::new(
                format!(
                    "Do you want to perform these actions in workspace \"{}\"?",
                    workspace.name
                ),
                "relay will perform the actions described above.\nOnly 'yes' will be accepted to approve.",
            ),
        };
        let answer = self.interruptible(self.prompt.ask(&query)).await?;
        if answer == "yes" {
            return Ok(());
        }

        let current = self.race(self.remote.read_run(&run.id)).await?;
        if current.actions.is_discardable {
            self.race(self.remote.discard_run(&run.id, DISCARD_COMMENT))
                .await?;
            tracing::info!(run_id = %run.id, "run discarded after declined apply");
        }
        Err(BackendError::ApplyDiscarded)
    }
}
