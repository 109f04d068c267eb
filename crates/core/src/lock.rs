// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local consistency lock metadata

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who holds the consistency lock, and for what
///
/// Written into the lock file so a blocked user can see the holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockInfo {
    pub id: String,
    /// Operation kind, e.g. `apply`
    pub operation: String,
    /// Remote workspace name
    pub workspace: String,
    /// `user@host` of the holder
    pub who: String,
    pub created: DateTime<Utc>,
}

impl LockInfo {
    pub fn new(
        id: impl Into<String>,
        operation: impl Into<String>,
        workspace: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            operation: operation.into(),
            workspace: workspace.into(),
            who: current_user(),
            created: Utc::now(),
        }
    }
}

fn current_user() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());
    let host = std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
    format!("{}@{}", user, host)
}

impl std::fmt::Display for LockInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ID: {}\nOperation: {}\nWorkspace: {}\nWho: {}\nCreated: {}",
            self.id,
            self.operation,
            self.workspace,
            self.who,
            self.created.to_rfc3339()
        )
    }
}
