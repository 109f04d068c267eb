// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the remote backend

use relay_adapters::{LockError, PackError, PromptError, RemoteError};
use relay_core::{ApiVersion, Capability, MappingError};
use thiserror::Error;

/// One reason an operation cannot be run remotely
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("insufficient rights to {action} in workspace \"{workspace}\"")]
    InsufficientPermission {
        action: &'static str,
        workspace: String,
    },
    #[error(
        "custom parallelism values are currently not supported: remote runs always use parallelism {default}, but {requested} was requested"
    )]
    UnsupportedParallelism { requested: u32, default: u32 },
    #[error("{what} is not supported with remote execution")]
    UnsupportedArtifact { what: &'static str },
    #[error("no configuration files found; a configuration directory is required unless planning a destroy")]
    NoConfiguration,
    #[error(
        "{capability} ({option}) requires remote API version {required} or later, but the service reports {actual}"
    )]
    UnsupportedOnApiVersion {
        capability: Capability,
        option: &'static str,
        required: ApiVersion,
        actual: String,
    },
    #[error("workspace \"{workspace}\" is connected to a VCS repository; apply runs must be started from the service")]
    VcsConnectedApply { workspace: String },
    #[error("workspace \"{workspace}\" is configured for local execution and cannot run operations remotely")]
    LocalExecutionMode { workspace: String },
    #[error("value for undeclared variable \"{name}\" was given on the command line")]
    UndeclaredVariable { name: String },
}

/// Every violation found while validating an operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", render(.0))]
pub struct ValidationErrors(pub Vec<Violation>);

fn render(violations: &[Violation]) -> String {
    match violations {
        [only] => format!("operation rejected: {}", only),
        many => {
            let mut text = format!("operation rejected ({} problems):", many.len());
            for v in many {
                text.push_str("\n  - ");
                text.push_str(&v.to_string());
            }
            text
        }
    }
}

/// Errors that end a remote operation
#[derive(Debug, Error)]
pub enum BackendError {
    #[error(transparent)]
    UnsupportedWorkspaceOperation(#[from] MappingError),
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("error acquiring the state lock: {0}")]
    Lock(#[from] LockError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("failed to package configuration: {0}")]
    Pack(#[from] PackError),
    #[error(transparent)]
    Prompt(#[from] PromptError),
    #[error("failed to prepare configuration directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("configuration upload did not complete after {attempts} status checks")]
    UploadTimeout { attempts: u32 },
    #[error("configuration version errored: {0}")]
    UploadErrored(String),
    #[error("cost estimation was canceled")]
    CostEstimateCanceled,
    #[error("Apply discarded.")]
    ApplyDiscarded,
    /// Graceful stop was requested; the remote run may still need canceling
    #[error("operation stopped")]
    Stopped,
    /// Hard cancel: local waiting was abandoned
    #[error("operation canceled")]
    Canceled,
}
