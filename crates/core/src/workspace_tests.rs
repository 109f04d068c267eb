// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn remote(name: &str, tags: &[&str]) -> Workspace {
    Workspace {
        name: name.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        ..Workspace::default()
    }
}

#[parameterized(
    name_default = { WorkspaceMapping::Name("prod".into()), "default", Some("prod") },
    name_bound = { WorkspaceMapping::Name("prod".into()), "prod", Some("prod") },
    name_other = { WorkspaceMapping::Name("prod".into()), "staging", None },
    prefix_named = { WorkspaceMapping::Prefix("app-".into()), "prod", Some("app-prod") },
    prefix_default = { WorkspaceMapping::Prefix("app-".into()), "default", None },
    tags_named = { WorkspaceMapping::Tags(vec!["net".into()]), "edge", Some("edge") },
    tags_default = { WorkspaceMapping::Tags(vec!["net".into()]), "default", None },
    none = { WorkspaceMapping::None, "prod", None },
)]
fn resolve(mapping: WorkspaceMapping, local: &str, expected: Option<&str>) {
    assert_eq!(mapping.resolve(local).ok().as_deref(), expected);
}

#[test]
fn name_strategy_error_names_both_workspaces() {
    let err = WorkspaceMapping::Name("prod".into())
        .resolve("staging")
        .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("staging"));
    assert!(msg.contains("prod"));
}

#[test]
fn no_mapping_is_reported() {
    assert_eq!(
        WorkspaceMapping::None.resolve("default"),
        Err(MappingError::NoMapping)
    );
}

#[test]
fn prefix_reverse_mapping_strips_prefix() {
    let mapping = WorkspaceMapping::Prefix("app-".into());
    assert_eq!(
        mapping.local_name(&remote("app-prod", &[])),
        Some("prod".to_string())
    );
    assert_eq!(mapping.local_name(&remote("app-", &[])), None);
    assert_eq!(mapping.local_name(&remote("other", &[])), None);
}

#[test]
fn tag_reverse_mapping_requires_every_tag() {
    let mapping = WorkspaceMapping::Tags(vec!["net".into(), "prod".into()]);
    assert_eq!(
        mapping.local_name(&remote("edge", &["net", "prod", "eu"])),
        Some("edge".to_string())
    );
    assert_eq!(mapping.local_name(&remote("core", &["net"])), None);
}

#[test]
fn name_reverse_mapping_is_default() {
    let mapping = WorkspaceMapping::Name("prod".into());
    assert_eq!(
        mapping.local_name(&remote("prod", &[])),
        Some(DEFAULT_WORKSPACE.to_string())
    );
}

#[test]
fn filter_follows_strategy() {
    let filter = WorkspaceMapping::Tags(vec!["net".into()]).filter();
    assert_eq!(filter.tags, vec!["net".to_string()]);
    assert!(filter.search.is_none());
    let filter = WorkspaceMapping::Prefix("app-".into()).filter();
    assert_eq!(filter.search.as_deref(), Some("app-"));
}
