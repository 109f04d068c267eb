// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backend that dispatches operations to the remote service

use crate::error::BackendError;
use crate::operation::RunningOperation;
use crate::retry::RetryReporter;
use crate::task::{OperationTask, Settings};
use relay_adapters::{Interrupter, Prompt, RemoteClient, Renderer, StateLocker};
use relay_core::{BackendConfig, IdGen, MappingError, Operation, WorkspaceMapping};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Backend adapter dependencies
pub struct BackendDeps<R, L, P, I, Rd> {
    pub remote: R,
    pub locker: L,
    pub prompt: P,
    pub interrupter: I,
    pub renderer: Rd,
}

/// Remote backend
///
/// Runs at most one operation at a time; a second [`Backend::operation`]
/// call waits until the first operation's task has finished.
pub struct Backend<R, L, P, I, Rd, G: IdGen> {
    deps: BackendDeps<R, L, P, I, Rd>,
    mapping: WorkspaceMapping,
    settings: Arc<Settings>,
    id_gen: G,
    single_flight: Arc<tokio::sync::Mutex<()>>,
}

impl<R, L, P, I, Rd, G> Backend<R, L, P, I, Rd, G>
where
    R: RemoteClient,
    L: StateLocker,
    P: Prompt,
    I: Interrupter,
    Rd: Renderer,
    G: IdGen,
{
    pub fn new(deps: BackendDeps<R, L, P, I, Rd>, config: &BackendConfig, id_gen: G) -> Self {
        Self {
            deps,
            mapping: config.mapping.clone(),
            settings: Arc::new(Settings {
                organization: config.organization.clone(),
                polling: config.polling.clone(),
                filter: config.logs.filter(),
            }),
            id_gen,
            single_flight: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Dispatch an operation and return its handle immediately
    ///
    /// The workspace is resolved before anything else, so an unsupported
    /// workspace never touches the network or the lock. `caller` is the
    /// embedding process's context: cancelling it stops the operation
    /// gracefully.
    pub async fn operation(
        &self,
        op: Operation,
        caller: &CancellationToken,
    ) -> Result<RunningOperation, BackendError> {
        let workspace_name = self.mapping.resolve(&op.workspace)?;
        let permit = Arc::clone(&self.single_flight).lock_owned().await;

        let stop = caller.child_token();
        let cancel = CancellationToken::new();
        let (handle, completion) = RunningOperation::new(stop.clone(), cancel.clone());

        let remote = self
            .deps
            .remote
            .with_retry_hook(RetryReporter::new(self.deps.renderer.clone()).into_hook());
        let task = OperationTask {
            remote,
            locker: self.deps.locker.clone(),
            prompt: self.deps.prompt.clone(),
            interrupter: self.deps.interrupter.clone(),
            renderer: self.deps.renderer.clone(),
            settings: Arc::clone(&self.settings),
            op,
            workspace_name,
            lock_id: self.id_gen.next("lock"),
            stop,
            cancel,
            approved: Arc::new(AtomicBool::new(false)),
        };
        tracing::debug!(workspace = %task.workspace_name, kind = %task.op.kind, "dispatching operation");

        tokio::spawn(async move {
            let _permit = permit;
            task.run(completion).await;
        });
        Ok(handle)
    }

    /// Local names of the remote workspaces this backend maps to, sorted
    pub async fn workspaces(&self) -> Result<Vec<String>, BackendError> {
        if self.mapping == WorkspaceMapping::None {
            return Err(MappingError::NoMapping.into());
        }
        let remote = self
            .deps
            .remote
            .list_workspaces(&self.settings.organization, &self.mapping.filter())
            .await?;
        let mut names: Vec<String> = remote
            .iter()
            .filter_map(|w| self.mapping.local_name(w))
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }
}

#[cfg(test)]
#[path = "backend_tests.rs"]
mod tests;
