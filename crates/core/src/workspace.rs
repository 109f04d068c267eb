// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace mapping strategies and remote workspace attributes
//!
//! A local workspace name is mapped onto a remote workspace by exactly one
//! strategy. Resolution is pure and must happen before any network call.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the implicit local workspace
pub const DEFAULT_WORKSPACE: &str = "default";

/// Errors from resolving a local workspace name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("no workspace mapping is configured; set one of name, prefix or tags")]
    NoMapping,
    #[error(
        "workspace \"{requested}\" is not supported: this backend is bound to the single remote workspace \"{bound}\""
    )]
    NamedOnly { bound: String, requested: String },
    #[error("the \"default\" workspace is not supported when workspaces are selected by {strategy}")]
    DefaultNotSupported { strategy: &'static str },
}

/// How local workspace names map to remote ones
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum WorkspaceMapping {
    #[default]
    None,
    /// Bound to one fixed remote workspace
    Name(String),
    /// Remote name is `prefix + local`
    Prefix(String),
    /// Workspaces are discovered by label; names map 1:1
    Tags(Vec<String>),
}

impl WorkspaceMapping {
    /// Resolve a local workspace name to the remote workspace name
    pub fn resolve(&self, local: &str) -> Result<String, MappingError> {
        match self {
            WorkspaceMapping::None => Err(MappingError::NoMapping),
            WorkspaceMapping::Name(bound) => {
                if local == DEFAULT_WORKSPACE || local == bound {
                    Ok(bound.clone())
                } else {
                    Err(MappingError::NamedOnly {
                        bound: bound.clone(),
                        requested: local.to_string(),
                    })
                }
            }
            WorkspaceMapping::Prefix(prefix) => {
                if local == DEFAULT_WORKSPACE {
                    Err(MappingError::DefaultNotSupported { strategy: "prefix" })
                } else {
                    Ok(format!("{}{}", prefix, local))
                }
            }
            WorkspaceMapping::Tags(_) => {
                if local == DEFAULT_WORKSPACE {
                    Err(MappingError::DefaultNotSupported { strategy: "tags" })
                } else {
                    Ok(local.to_string())
                }
            }
        }
    }

    /// Map a remote workspace name back to the local name, if it belongs to this mapping
    pub fn local_name(&self, remote: &Workspace) -> Option<String> {
        match self {
            WorkspaceMapping::None => None,
            WorkspaceMapping::Name(bound) => {
                (remote.name == *bound).then(|| DEFAULT_WORKSPACE.to_string())
            }
            WorkspaceMapping::Prefix(prefix) => remote
                .name
                .strip_prefix(prefix.as_str())
                .filter(|rest| !rest.is_empty())
                .map(str::to_owned),
            WorkspaceMapping::Tags(tags) => tags
                .iter()
                .all(|t| remote.tags.contains(t))
                .then(|| remote.name.clone()),
        }
    }

    /// Server-side filter for listing candidate workspaces
    pub fn filter(&self) -> WorkspaceFilter {
        match self {
            WorkspaceMapping::Prefix(prefix) => WorkspaceFilter {
                search: Some(prefix.clone()),
                tags: Vec::new(),
            },
            WorkspaceMapping::Tags(tags) => WorkspaceFilter {
                search: None,
                tags: tags.clone(),
            },
            WorkspaceMapping::Name(name) => WorkspaceFilter {
                search: Some(name.clone()),
                tags: Vec::new(),
            },
            WorkspaceMapping::None => WorkspaceFilter::default(),
        }
    }

    pub fn strategy(&self) -> &'static str {
        match self {
            WorkspaceMapping::None => "none",
            WorkspaceMapping::Name(_) => "name",
            WorkspaceMapping::Prefix(_) => "prefix",
            WorkspaceMapping::Tags(_) => "tags",
        }
    }
}

/// Filter used when listing remote workspaces
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkspaceFilter {
    pub search: Option<String>,
    pub tags: Vec<String>,
}

/// Where runs for a workspace execute
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    #[default]
    Remote,
    Local,
    Agent,
}

/// What the caller may do in a workspace
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    pub can_queue_run: bool,
    pub can_queue_apply: bool,
    pub can_queue_destroy: bool,
}

impl Permissions {
    pub fn all() -> Self {
        Self {
            can_queue_run: true,
            can_queue_apply: true,
            can_queue_destroy: true,
        }
    }
}

/// A remote workspace as reported by the service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: String,
    pub name: String,
    pub permissions: Permissions,
    pub locked: bool,
    pub current_run_id: Option<String>,
    /// Sub-directory of the uploaded configuration the service runs in
    pub working_directory: String,
    pub auto_apply: bool,
    pub execution_mode: ExecutionMode,
    /// Identifier of a connected VCS repository, if any
    pub vcs_repo: Option<String>,
    pub structured_run_output_enabled: bool,
    pub tags: Vec<String>,
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
