//! Argument validation specs
//!
//! Malformed flags are rejected before any configuration is read.

use crate::prelude::*;

#[test]
fn variable_without_value_is_rejected() {
    let temp = Project::with_config(PREFIX_CONFIG);

    temp.relay()
        .args(&["plan", "--var", "region"])
        .rejected()
        .stderr_has("invalid key=value");
}

#[test]
fn unparseable_lock_timeout_is_rejected() {
    let temp = Project::with_config(PREFIX_CONFIG);

    temp.relay()
        .args(&["plan", "--lock-timeout", "soon"])
        .rejected()
        .stderr_has("--lock-timeout");
}

#[test]
fn destroy_and_refresh_only_conflict() {
    let temp = Project::with_config(PREFIX_CONFIG);

    temp.relay()
        .args(&["plan", "--destroy", "--refresh-only"])
        .rejected()
        .stderr_has("cannot be used with");
}

#[test]
fn parallelism_must_be_a_number() {
    let temp = Project::with_config(PREFIX_CONFIG);

    temp.relay()
        .args(&["apply", "--parallelism", "many"])
        .rejected();
}
