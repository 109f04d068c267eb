//! Workspace listing specs

use crate::prelude::*;

#[test]
fn list_without_mapping_fails() {
    let temp = Project::with_config(UNMAPPED_CONFIG);

    temp.relay()
        .args(&["workspace", "list"])
        .fails()
        .stderr_has("no workspace mapping is configured");
}

#[test]
fn list_requires_connection_settings() {
    let temp = Project::empty();

    temp.relay()
        .args(&["workspace", "list"])
        .fails()
        .stderr_has("backend.hostname");
}
