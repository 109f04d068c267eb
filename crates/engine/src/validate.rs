// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pre-submission checks
//!
//! Every check runs; violations are accumulated rather than reported one at
//! a time.

use crate::error::{ValidationErrors, Violation};
use relay_core::variables::resolve;
use relay_core::{
    Capability, Diagnostic, ExecutionMode, Operation, PlanMode, ResolvedVariables, ServiceInfo,
    Workspace, DEFAULT_PARALLELISM,
};

/// What a passing validation hands to the submitter
#[derive(Debug, Clone, Default)]
pub struct Validated {
    pub variables: ResolvedVariables,
    pub warnings: Vec<Diagnostic>,
}

pub fn validate(
    op: &Operation,
    workspace: &Workspace,
    service: &ServiceInfo,
) -> Result<Validated, ValidationErrors> {
    let mut violations = Vec::new();
    let name = &workspace.name;

    let permissions = workspace.permissions;
    if !permissions.can_queue_run {
        violations.push(Violation::InsufficientPermission {
            action: "queue runs",
            workspace: name.clone(),
        });
    }
    if op.kind.applies() {
        let (allowed, action) = match op.plan_mode {
            PlanMode::Destroy => (permissions.can_queue_destroy, "queue destroy runs"),
            _ => (permissions.can_queue_apply, "queue applies"),
        };
        if !allowed {
            violations.push(Violation::InsufficientPermission {
                action,
                workspace: name.clone(),
            });
        }
    }

    if op.parallelism != DEFAULT_PARALLELISM {
        violations.push(Violation::UnsupportedParallelism {
            requested: op.parallelism,
            default: DEFAULT_PARALLELISM,
        });
    }
    if op.plan_file.is_some() {
        violations.push(Violation::UnsupportedArtifact {
            what: "applying a saved plan file",
        });
    }
    if op.plan_out.is_some() {
        violations.push(Violation::UnsupportedArtifact {
            what: "saving a generated plan (-out)",
        });
    }
    if op.config_dir.is_none() && !op.allows_missing_config() {
        violations.push(Violation::NoConfiguration);
    }

    let requested = [
        (Capability::Targeting, !op.targets.is_empty()),
        (Capability::RefreshSkip, !op.refresh),
        (Capability::RefreshOnly, op.plan_mode == PlanMode::RefreshOnly),
        (Capability::ReplaceAddrs, !op.force_replace.is_empty()),
    ];
    for (capability, wanted) in requested {
        if wanted && !service.supports(capability) {
            violations.push(Violation::UnsupportedOnApiVersion {
                capability,
                option: capability.option(),
                required: capability.required(),
                actual: service
                    .api_version
                    .clone()
                    .unwrap_or_else(|| "no version".to_string()),
            });
        }
    }

    if op.kind.applies() && workspace.vcs_repo.is_some() {
        violations.push(Violation::VcsConnectedApply {
            workspace: name.clone(),
        });
    }
    if workspace.execution_mode == ExecutionMode::Local {
        violations.push(Violation::LocalExecutionMode {
            workspace: name.clone(),
        });
    }

    let variables = resolve(&op.variables, op.declared_variables.as_ref());
    for undeclared in &variables.undeclared_cli {
        violations.push(Violation::UndeclaredVariable {
            name: undeclared.clone(),
        });
    }

    if !violations.is_empty() {
        return Err(ValidationErrors(violations));
    }

    let warnings = variables
        .undeclared_file
        .iter()
        .map(|name| {
            Diagnostic::warning(format!("Value for undeclared variable \"{}\"", name)).with_detail(
                "A variables file assigns a value to a variable that the configuration does not declare. The value is ignored.",
            )
        })
        .collect();

    Ok(Validated {
        variables,
        warnings,
    })
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
