// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace commands

use crate::adapters::make_backend;
use crate::error::RelayError;
use anyhow::Result;
use clap::{Args, Subcommand};
use relay_adapters::NoOpStateLocker;
use relay_core::{BackendConfig, DEFAULT_WORKSPACE};

#[derive(Args)]
pub struct WorkspaceArgs {
    #[command(subcommand)]
    pub command: WorkspaceCommand,
}

#[derive(Subcommand)]
pub enum WorkspaceCommand {
    /// List the remote workspaces this backend maps to
    List {
        /// Currently selected local workspace
        #[arg(long, short = 'w', env = "RELAY_WORKSPACE", default_value = DEFAULT_WORKSPACE)]
        workspace: String,
    },
}

pub async fn handle(config: &BackendConfig, args: WorkspaceArgs) -> Result<()> {
    match args.command {
        WorkspaceCommand::List { workspace } => list(config, &workspace).await,
    }
}

async fn list(config: &BackendConfig, current: &str) -> Result<()> {
    let backend = make_backend(config, NoOpStateLocker::new(), false);
    let names = backend.workspaces().await.map_err(RelayError::from)?;

    if names.is_empty() {
        println!("No workspaces found.");
        return Ok(());
    }
    for line in format_list(&names, current) {
        println!("{}", line);
    }
    Ok(())
}

/// One line per workspace, the selected one marked with `*`
fn format_list(names: &[String], current: &str) -> Vec<String> {
    names
        .iter()
        .map(|name| {
            let marker = if name == current { '*' } else { ' ' };
            format!("{} {}", marker, name)
        })
        .collect()
}
