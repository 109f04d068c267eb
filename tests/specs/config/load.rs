//! Configuration loading specs

use crate::prelude::*;

#[test]
fn missing_hostname_points_at_environment() {
    let temp = Project::empty();

    temp.relay()
        .args(&["plan"])
        .fails()
        .stderr_has("missing required setting: backend.hostname")
        .stderr_has("RELAY_HOSTNAME");
}

#[test]
fn missing_organization_is_reported() {
    let temp = Project::with_config("[backend]\nhostname = \"127.0.0.1:9\"\n");

    temp.relay()
        .args(&["plan"])
        .fails()
        .stderr_has("missing required setting: backend.organization");
}

#[test]
fn environment_supplies_connection_settings() {
    let temp = Project::empty();

    // Settings resolve, so the failure moves on to the missing mapping
    temp.relay()
        .env("RELAY_HOSTNAME", "127.0.0.1:9")
        .env("RELAY_ORGANIZATION", "acme")
        .args(&["plan"])
        .fails()
        .stderr_has("no workspace mapping is configured")
        .stderr_lacks("missing required setting");
}

#[test]
fn name_and_prefix_conflict() {
    let temp = Project::with_config(
        r#"
[backend]
hostname = "127.0.0.1:9"
organization = "acme"

[backend.workspaces]
name = "networking-prod"
prefix = "networking-"
"#,
    );

    temp.relay()
        .args(&["plan"])
        .fails()
        .stderr_has("only one of")
        .stderr_has("Keep exactly one of name, prefix or tags");
}

#[test]
fn malformed_toml_is_reported_with_path() {
    let temp = Project::with_config("[backend\nhostname = ");

    temp.relay()
        .args(&["plan"])
        .fails()
        .stderr_has("TOML parse error")
        .stderr_has("relay.toml");
}

#[test]
fn unknown_settings_are_rejected() {
    let temp = Project::with_config(&format!("{}\n[extras]\nenabled = true\n", PREFIX_CONFIG));

    temp.relay()
        .args(&["plan"])
        .fails()
        .stderr_has("invalid configuration");
}

#[test]
fn config_flag_selects_another_file() {
    let temp = Project::empty();
    temp.file("backends/unmapped.toml", UNMAPPED_CONFIG);

    temp.relay()
        .args(&["--config", "backends/unmapped.toml", "plan"])
        .fails()
        .stderr_has("no workspace mapping is configured");
}
