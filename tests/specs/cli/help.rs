//! Help output specs

use crate::prelude::*;

#[test]
fn help_lists_every_command() {
    let temp = Project::empty();

    temp.relay()
        .args(&["--help"])
        .passes()
        .stdout_has("plan")
        .stdout_has("apply")
        .stdout_has("destroy")
        .stdout_has("refresh")
        .stdout_has("workspace");
}

#[test]
fn plan_help_shows_operation_flags() {
    let temp = Project::empty();

    temp.relay()
        .args(&["plan", "--help"])
        .passes()
        .stdout_has("--lock-timeout")
        .stdout_has("--target")
        .stdout_has("--var")
        .stdout_has("--refresh-only");
}

#[test]
fn apply_help_shows_auto_approve() {
    let temp = Project::empty();

    temp.relay()
        .args(&["apply", "--help"])
        .passes()
        .stdout_has("--auto-approve");
}

#[test]
fn unknown_command_is_rejected() {
    let temp = Project::empty();

    temp.relay().args(&["import"]).rejected();
}
