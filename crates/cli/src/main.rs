// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! relay - remote run orchestration CLI

mod adapters;
mod commands;
mod error;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{run, workspace};
use relay_core::{BackendConfig, OperationKind};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::error::RelayError;

/// Log file for diagnostics logging; stderr when unset
const ENV_LOG_FILE: &str = "RELAY_LOG_FILE";

#[derive(Parser)]
#[command(
    name = "relay",
    version,
    about = "relay - run plans and applies on a remote execution service"
)]
struct Cli {
    /// Backend configuration file
    #[arg(long, global = true, env = "RELAY_CONFIG", default_value = "relay.toml")]
    config: PathBuf,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a speculative plan on the remote service
    Plan(run::PlanArgs),
    /// Plan and apply changes remotely
    Apply(run::ApplyArgs),
    /// Destroy every remotely managed resource
    Destroy(run::ConfirmArgs),
    /// Reconcile state with remote objects
    Refresh(run::ConfirmArgs),
    /// Workspace management
    Workspace(workspace::WorkspaceArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let _log_guard = match setup_logging() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("error: failed to set up logging: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    match dispatch(cli).await {
        Ok(code) => code,
        Err(e) => {
            match e.downcast_ref::<RelayError>() {
                Some(relay) => eprint!("{}", relay),
                None => eprintln!("error: {:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(cli: Cli) -> Result<ExitCode> {
    let config = BackendConfig::load_or_default(&cli.config)
        .map_err(|e| RelayError::config(&cli.config, e))?;
    let color = !cli.no_color;

    match cli.command {
        Commands::Plan(args) => run::plan(&config, args, color).await,
        Commands::Apply(args) => run::apply(&config, args, color).await,
        Commands::Destroy(args) => {
            run::confirmed(&config, OperationKind::Destroy, args, color).await
        }
        Commands::Refresh(args) => {
            run::confirmed(&config, OperationKind::Refresh, args, color).await
        }
        Commands::Workspace(args) => {
            workspace::handle(&config, args).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn setup_logging() -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let Some(path) = std::env::var_os(ENV_LOG_FILE).map(PathBuf::from) else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
        return Ok(None);
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir)?;
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("{} has no file name: {}", ENV_LOG_FILE, path.display()))?;

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(Some(guard))
}
