//! Workspace resolution specs
//!
//! An operation on an unsupported workspace fails before any network call.

use crate::prelude::*;

#[test]
fn operation_without_mapping_suggests_workspaces_table() {
    let temp = Project::with_config(UNMAPPED_CONFIG);

    temp.relay()
        .args(&["plan"])
        .fails()
        .stderr_has("no workspace mapping is configured")
        .stderr_has("[backend.workspaces]");
}

#[test]
fn default_workspace_with_prefix_suggests_flag() {
    let temp = Project::with_config(PREFIX_CONFIG);

    temp.relay()
        .args(&["plan"])
        .fails()
        .stderr_has("\"default\" workspace is not supported")
        .stderr_has("--workspace <name>");
}

#[test]
fn default_workspace_rejected_for_destroy_too() {
    let temp = Project::with_config(PREFIX_CONFIG);

    temp.relay()
        .args(&["destroy", "--auto-approve"])
        .fails()
        .stderr_has("\"default\" workspace is not supported");
}

#[test]
fn named_mapping_rejects_other_workspace() {
    let temp = Project::with_config(NAMED_CONFIG);

    temp.relay()
        .args(&["apply", "--workspace", "staging"])
        .fails()
        .stderr_has("workspace \"staging\" is not supported")
        .stderr_has("--workspace networking-prod");
}

#[test]
fn workspace_from_environment_is_resolved() {
    let temp = Project::with_config(NAMED_CONFIG);

    temp.relay()
        .env("RELAY_WORKSPACE", "staging")
        .args(&["refresh"])
        .fails()
        .stderr_has("workspace \"staging\" is not supported");
}
