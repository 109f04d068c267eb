// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! relay-core: domain model for the relay remote run orchestrator
//!
//! This crate provides:
//! - Operations, runs, and the run status state machine
//! - Workspace mapping strategies and remote workspace attributes
//! - Auxiliary stage results (run tasks, cost estimates, policy checks)
//! - Structured log records and the suppression filter
//! - Backend configuration loading

pub mod api;
pub mod config;
pub mod diagnostic;
pub mod id;
pub mod lock;
pub mod log;
pub mod operation;
pub mod plan;
pub mod run;
pub mod stage;
pub mod variables;
pub mod workspace;

// Re-exports
pub use api::{ApiVersion, Capability, Release, ServiceInfo};
pub use config::{BackendConfig, ConfigError, HttpConfig, LogConfig, PollConfig};
pub use diagnostic::{Diagnostic, Diagnostics, Severity};
pub use id::{IdGen, SequentialIdGen, UuidIdGen};
pub use lock::LockInfo;
pub use log::{LogFilter, LogKind, LogLine, LogRecord};
pub use operation::{
    Operation, OperationKind, OperationResult, PlanMode, DEFAULT_PARALLELISM,
};
pub use plan::{ChangeAction, ChangeSummary, RedactedPlan, ResourceChange};
pub use run::{
    ConfigurationVersion, ConfigurationVersionOptions, ConfigurationVersionStatus, PhaseRef,
    PhaseStatus, Run, RunActions, RunOptions, RunPage, RunStatus,
};
pub use stage::{
    CostEstimate, CostEstimateStatus, Enforcement, PolicyCheck, PolicyResult, PolicyStatus,
    Stage, StageStatus, TaskResult, TaskStage, TaskStatus,
};
pub use variables::{
    Declarations, ResolvedVariables, TypeHint, VariableAssignment, VariableSource,
};
pub use workspace::{
    ExecutionMode, MappingError, Permissions, Workspace, WorkspaceFilter, WorkspaceMapping,
    DEFAULT_WORKSPACE,
};
