// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `relay plan|apply|destroy|refresh` - Run an operation remotely

use crate::adapters::{lock_path, make_backend, RealBackend};
use crate::error::RelayError;
use crate::output::print_diagnostics;
use anyhow::Result;
use clap::{ArgAction, Args};
use relay_adapters::{FileStateLocker, NoOpStateLocker, StateLocker};
use relay_core::{
    BackendConfig, Operation, OperationKind, OperationResult, PlanMode, VariableAssignment,
    DEFAULT_PARALLELISM, DEFAULT_WORKSPACE,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Flags shared by every operation
#[derive(Args)]
pub struct OperationArgs {
    /// Local workspace name
    #[arg(long, short = 'w', env = "RELAY_WORKSPACE", default_value = DEFAULT_WORKSPACE)]
    pub workspace: String,

    /// Configuration directory (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub chdir: Option<PathBuf>,

    /// Limit the operation to a resource address
    #[arg(long = "target", value_name = "ADDRESS")]
    pub targets: Vec<String>,

    /// Force replacement of a resource address
    #[arg(long = "replace", value_name = "ADDRESS")]
    pub replace: Vec<String>,

    /// Set a variable (key=value)
    #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_var)]
    pub vars: Vec<VariableAssignment>,

    /// Hold the local state lock while the operation runs
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub lock: bool,

    /// How long to wait for the state lock, and for a queued run to start
    #[arg(long, value_parser = humantime::parse_duration, default_value = "0s")]
    pub lock_timeout: Duration,

    /// Concurrent resource operations (remote runs only support the default)
    #[arg(long, default_value_t = DEFAULT_PARALLELISM)]
    pub parallelism: u32,

    /// Refresh state before planning
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub refresh: bool,
}

#[derive(Args)]
pub struct PlanArgs {
    #[command(flatten)]
    pub common: OperationArgs,

    /// Plan to destroy every managed resource
    #[arg(long, conflicts_with = "refresh_only")]
    pub destroy: bool,

    /// Only reconcile state with remote objects
    #[arg(long)]
    pub refresh_only: bool,

    /// Save the plan to a file
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,
}

#[derive(Args)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub common: OperationArgs,

    /// Skip interactive approval
    #[arg(long)]
    pub auto_approve: bool,

    /// Saved plan to apply
    pub plan_file: Option<PathBuf>,
}

/// Arguments for destroy and refresh
#[derive(Args)]
pub struct ConfirmArgs {
    #[command(flatten)]
    pub common: OperationArgs,

    /// Skip interactive approval
    #[arg(long)]
    pub auto_approve: bool,
}

fn parse_var(s: &str) -> Result<VariableAssignment, String> {
    VariableAssignment::parse_flag(s).ok_or_else(|| format!("invalid key=value: `{s}`"))
}

/// Whether `dir` holds anything worth uploading
fn has_configuration(dir: &Path) -> Result<bool> {
    if !dir.is_dir() {
        return Ok(false);
    }
    for entry in std::fs::read_dir(dir)? {
        if !entry?.file_name().to_string_lossy().starts_with('.') {
            return Ok(true);
        }
    }
    Ok(false)
}

impl OperationArgs {
    fn dir(&self) -> Result<PathBuf> {
        match &self.chdir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(std::env::current_dir()?),
        }
    }

    fn operation(&self, kind: OperationKind, dir: &Path) -> Result<Operation> {
        let mut op = Operation::new(kind, &self.workspace)
            .with_targets(self.targets.clone())
            .with_force_replace(self.replace.clone())
            .with_parallelism(self.parallelism)
            .with_refresh(self.refresh)
            .with_lock_timeout(self.lock_timeout);
        for var in &self.vars {
            op = op.with_variable(var.clone());
        }
        if has_configuration(dir)? {
            op = op.with_config_dir(dir);
        }
        Ok(op)
    }
}

pub async fn plan(config: &BackendConfig, args: PlanArgs, color: bool) -> Result<ExitCode> {
    let dir = args.common.dir()?;
    let mode = if args.destroy {
        PlanMode::Destroy
    } else if args.refresh_only {
        PlanMode::RefreshOnly
    } else {
        PlanMode::Normal
    };
    let mut op = args
        .common
        .operation(OperationKind::Plan, &dir)?
        .with_plan_mode(mode);
    if let Some(out) = args.out {
        op = op.with_plan_out(out);
    }
    execute(config, &args.common, &dir, op, color).await
}

pub async fn apply(config: &BackendConfig, args: ApplyArgs, color: bool) -> Result<ExitCode> {
    let dir = args.common.dir()?;
    let mut op = args
        .common
        .operation(OperationKind::Apply, &dir)?
        .with_auto_approve(args.auto_approve);
    if let Some(plan_file) = args.plan_file {
        op = op.with_plan_file(plan_file);
    }
    execute(config, &args.common, &dir, op, color).await
}

pub async fn confirmed(
    config: &BackendConfig,
    kind: OperationKind,
    args: ConfirmArgs,
    color: bool,
) -> Result<ExitCode> {
    let dir = args.common.dir()?;
    let op = args
        .common
        .operation(kind, &dir)?
        .with_auto_approve(args.auto_approve);
    execute(config, &args.common, &dir, op, color).await
}

async fn execute(
    config: &BackendConfig,
    args: &OperationArgs,
    dir: &Path,
    op: Operation,
    color: bool,
) -> Result<ExitCode> {
    if args.lock {
        let locker = FileStateLocker::new(lock_path(dir), args.lock_timeout);
        dispatch(make_backend(config, locker, color), op).await
    } else {
        dispatch(make_backend(config, NoOpStateLocker::new(), color), op).await
    }
}

async fn dispatch<L: StateLocker>(backend: RealBackend<L>, op: Operation) -> Result<ExitCode> {
    let interrupts = Interrupts::install()?;
    let handle = backend
        .operation(op, &interrupts.stop)
        .await
        .map_err(RelayError::from)?;

    let hard_cancel = {
        let handle = handle.clone();
        let cancel = interrupts.cancel.clone();
        tokio::spawn(async move {
            cancel.cancelled().await;
            handle.cancel();
        })
    };
    handle.wait().await;
    hard_cancel.abort();

    print_diagnostics(&handle.diagnostics());
    let result = handle.result();
    tracing::info!(?result, run_id = ?handle.run_id(), "operation complete");
    Ok(match result {
        OperationResult::Success => ExitCode::SUCCESS,
        OperationResult::Failure => ExitCode::FAILURE,
    })
}

/// Ctrl-C handling: the first interrupt stops gracefully, the second cancels
struct Interrupts {
    stop: CancellationToken,
    cancel: CancellationToken,
}

impl Interrupts {
    fn install() -> Result<Self> {
        let stop = CancellationToken::new();
        let cancel = CancellationToken::new();
        let count = Arc::new(AtomicUsize::new(0));

        let (s, c) = (stop.clone(), cancel.clone());
        ctrlc::set_handler(move || {
            if count.fetch_add(1, Ordering::SeqCst) == 0 {
                eprintln!("\nInterrupt received.\nPlease wait for relay to exit or data loss may occur.\nGracefully shutting down...");
                s.cancel();
            } else {
                eprintln!("\nTwo interrupts received. Exiting immediately.");
                c.cancel();
            }
        })?;
        Ok(Self { stop, cancel })
    }
}
