// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[test]
fn parses_structured_record() {
    let line = r#"{"@level":"info","@message":"Plan: 1 to add","@module":"relay.ui","type":"change_summary","changes":{"add":1}}"#;
    let LogLine::Structured(record) = LogLine::parse(line) else {
        panic!("expected structured record");
    };
    assert_eq!(record.kind, LogKind::ChangeSummary);
    assert_eq!(record.message, "Plan: 1 to add");
    assert_eq!(record.payload["changes"]["add"], 1);
}

#[parameterized(
    plain_text = { "Initializing plugins..." },
    json_without_type = { r#"{"@message":"hi"}"# },
    json_scalar = { "42" },
    truncated = { r#"{"type":"log""# },
)]
fn unparsable_lines_pass_through(line: &str) {
    assert_eq!(LogLine::parse(line), LogLine::Raw(line.to_string()));
}

#[test]
fn unknown_kind_is_preserved() {
    let LogLine::Structured(record) = LogLine::parse(r#"{"type":"test_summary"}"#) else {
        panic!("expected structured record");
    };
    assert_eq!(record.kind, LogKind::Other("test_summary".to_string()));
    assert_eq!(record.kind.as_str(), "test_summary");
}

#[test]
fn filter_suppresses_only_when_final_render_pending() {
    let filter = LogFilter::default();
    assert!(!filter.allows(&LogKind::PlannedChange, true));
    assert!(filter.allows(&LogKind::PlannedChange, false));
    assert!(filter.allows(&LogKind::ApplyComplete, true));
}

#[test]
fn filter_is_configurable() {
    let filter = LogFilter::new([LogKind::from("resource_drift")]);
    assert!(!filter.allows(&LogKind::ResourceDrift, true));
    assert!(filter.allows(&LogKind::Outputs, true));
}
