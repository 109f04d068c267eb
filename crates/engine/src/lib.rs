// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! relay remote run engine
//!
//! Dispatches plan, apply, destroy and refresh operations to the remote
//! service, follows them to completion and reports the outcome on a
//! [`RunningOperation`] handle.

mod apply;
mod backend;
mod error;
mod guard;
mod operation;
mod poller;
mod report;
mod retry;
mod stages;
mod submit;
mod task;
mod validate;

pub use backend::{Backend, BackendDeps};
pub use error::{BackendError, ValidationErrors, Violation};
pub use guard::LOCK_TIMEOUT_NOTICE;
pub use operation::RunningOperation;
pub use report::{diagnostic, NOT_FOUND_DETAIL};
pub use retry::{RetryReporter, INITIAL_RETRY_MESSAGE};
pub use stages::SKIPPED_DUE_TO_TARGETING;
pub use submit::RUN_MESSAGE;
pub use validate::{validate, Validated};
