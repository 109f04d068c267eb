// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Translating failures into user-facing diagnostics

use crate::error::BackendError;
use relay_adapters::RemoteError;
use relay_core::Diagnostic;

/// The service answers 404 for hidden resources too, so never confirm absence
pub const NOT_FOUND_DETAIL: &str = "For security, the remote service answers \"404 Not Found\" for resources the token has insufficient access to as well as for resources that do not exist. If the resource does exist, check the permissions of the configured token.";

pub fn diagnostic(err: &BackendError) -> Diagnostic {
    match err {
        BackendError::Remote(RemoteError::NotFound(what)) => {
            Diagnostic::error(format!("{} not found", what)).with_detail(NOT_FOUND_DETAIL)
        }
        BackendError::Remote(RemoteError::Unauthorized(message)) => {
            Diagnostic::error("Failed to authenticate with the remote service")
                .with_detail(format!("{}. Check the configured token.", message))
        }
        BackendError::Lock(e) => Diagnostic::error("Error acquiring the state lock")
            .with_detail(e.to_string()),
        other => Diagnostic::error(other.to_string()),
    }
}
