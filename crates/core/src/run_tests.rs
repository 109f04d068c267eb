// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    pending = { RunStatus::Pending, true, false, false },
    confirmed = { RunStatus::Confirmed, true, false, false },
    planning = { RunStatus::Planning, false, false, false },
    planned = { RunStatus::Planned, false, false, false },
    applied = { RunStatus::Applied, false, true, false },
    errored = { RunStatus::Errored, false, true, true },
    canceled = { RunStatus::Canceled, false, true, true },
    discarded = { RunStatus::Discarded, false, true, true },
    finished = { RunStatus::PlannedAndFinished, false, true, false },
)]
fn status_classification(status: RunStatus, queued: bool, terminal: bool, failure: bool) {
    assert_eq!(status.is_queued(), queued);
    assert_eq!(status.is_terminal(), terminal);
    assert_eq!(status.is_failure(), failure);
}

#[test]
fn status_round_trips_through_snake_case() {
    let status: RunStatus = serde_json::from_str("\"policy_soft_failed\"").unwrap();
    assert_eq!(status, RunStatus::PolicySoftFailed);
    assert_eq!(status.to_string(), "policy_soft_failed");
}

#[test]
fn unknown_status_is_tolerated() {
    let status: RunStatus = serde_json::from_str("\"assessing\"").unwrap();
    assert_eq!(status, RunStatus::Unknown);
    assert!(!status.is_terminal());
}

#[test]
fn planning_statuses_are_not_queued() {
    for status in [
        RunStatus::Fetching,
        RunStatus::PrePlanRunning,
        RunStatus::PlanQueued,
        RunStatus::Planning,
    ] {
        assert!(status.is_planning());
        assert!(!status.is_queued());
    }
}

#[test]
fn run_page_next_page() {
    let page = RunPage {
        items: vec![],
        current_page: 1,
        total_pages: 2,
    };
    assert_eq!(page.next_page(), Some(2));
    let last = RunPage {
        current_page: 2,
        ..page
    };
    assert_eq!(last.next_page(), None);
}
