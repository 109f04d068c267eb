// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration upload and run creation

use crate::error::BackendError;
use crate::task::OperationTask;
use relay_adapters::{slug, Interrupter, Prompt, RemoteClient, Renderer, StateLocker};
use relay_core::{
    ConfigurationVersionOptions, ConfigurationVersionStatus, OperationKind, ResolvedVariables,
    Run, RunOptions, Workspace,
};
use std::path::{Path, PathBuf};

pub const RUN_MESSAGE: &str = "Queued manually using relay";

impl<R, L, P, I, Rd> OperationTask<R, L, P, I, Rd>
where
    R: RemoteClient,
    L: StateLocker,
    P: Prompt,
    I: Interrupter,
    Rd: Renderer,
{
    pub(crate) async fn submit(
        &self,
        workspace: &Workspace,
        variables: &ResolvedVariables,
    ) -> Result<Run, BackendError> {
        let options = ConfigurationVersionOptions {
            auto_queue_runs: false,
            speculative: self.op.kind == OperationKind::Plan,
        };
        let cv = self
            .interruptible(
                self.remote
                    .create_configuration_version(&workspace.id, options),
            )
            .await?;

        let archive = self.package(workspace).await?;
        tracing::debug!(configuration_version_id = %cv.id, bytes = archive.len(), "uploading configuration");
        self.interruptible(self.remote.upload_configuration(&cv.upload_url, archive))
            .await?;
        self.await_upload(&cv.id).await?;

        let options = RunOptions {
            workspace_id: workspace.id.clone(),
            configuration_version_id: cv.id.clone(),
            message: RUN_MESSAGE.to_string(),
            plan_mode: self.op.plan_mode,
            plan_only: self.op.kind == OperationKind::Plan,
            refresh: (!self.op.refresh).then_some(false),
            target_addrs: self.op.targets.clone(),
            replace_addrs: self.op.force_replace.clone(),
            variables: variables.values.clone(),
        };
        // The run may exist once the request is sent; only a hard cancel abandons it
        self.checkpoint()?;
        self.race(self.remote.create_run(&options)).await
    }

    async fn await_upload(&self, id: &str) -> Result<(), BackendError> {
        let polling = &self.settings.polling;
        for attempt in 0..polling.upload_poll_attempts {
            if attempt > 0 {
                self.sleep(polling.upload_poll_interval).await?;
            }
            let cv = self
                .interruptible(self.remote.read_configuration_version(id))
                .await?;
            match cv.status {
                ConfigurationVersionStatus::Uploaded => return Ok(()),
                ConfigurationVersionStatus::Errored => {
                    return Err(BackendError::UploadErrored(
                        cv.error_message
                            .unwrap_or_else(|| "no error message was reported".to_string()),
                    ))
                }
                _ => {}
            }
        }
        Err(BackendError::UploadTimeout {
            attempts: polling.upload_poll_attempts,
        })
    }

    async fn package(&self, workspace: &Workspace) -> Result<Vec<u8>, BackendError> {
        let working_dir = workspace.working_directory.trim_matches('/');
        match &self.op.config_dir {
            Some(dir) => {
                let dir = if dir.is_absolute() {
                    dir.clone()
                } else {
                    std::env::current_dir()?.join(dir)
                };
                let root = self.upload_root(&dir, working_dir);
                pack(root).await
            }
            None => {
                // Destroy without configuration: the service still needs the
                // working directory to exist
                let scratch = tempfile::tempdir()?;
                if !working_dir.is_empty() {
                    std::fs::create_dir_all(scratch.path().join(working_dir))?;
                }
                pack(scratch.path().to_path_buf()).await
            }
        }
    }

    /// Directory to upload so that `dir` lands at the workspace's working directory
    fn upload_root(&self, dir: &Path, working_dir: &str) -> PathBuf {
        if working_dir.is_empty() {
            return dir.to_path_buf();
        }
        let relative = Path::new(working_dir);
        if !dir.ends_with(relative) {
            self.renderer.print(&format!(
                "WARNING: The remote workspace is configured to work with configuration at\n{} relative to the target repository, but the current directory\n{} does not end with it. Uploading the current directory as-is.",
                working_dir,
                dir.display()
            ));
            return dir.to_path_buf();
        }
        let mut root = dir.to_path_buf();
        for _ in relative.components() {
            root.pop();
        }
        self.renderer.print(&format!(
            "The remote workspace is configured to work with configuration at\n{} relative to the target repository.\n\nrelay will upload the contents of the following directory,\nexcluding files or directories as defined by a .relayignore file\nat {}/.relayignore (if it is present),\nin order to capture the filesystem context the remote workspace expects:\n    {}",
            working_dir,
            root.display(),
            root.display()
        ));
        root
    }
}

async fn pack(root: PathBuf) -> Result<Vec<u8>, BackendError> {
    let archive = tokio::task::spawn_blocking(move || slug::pack(&root))
        .await
        .map_err(std::io::Error::from)??;
    Ok(archive)
}
