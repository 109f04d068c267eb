// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for external I/O

pub mod interrupt;
pub mod locker;
pub mod prompt;
pub mod remote;
pub mod render;
pub mod slug;
pub mod traced;

pub use interrupt::{InterruptError, Interrupter, SignalInterrupter};
pub use locker::{FileStateLocker, LockError, NoOpStateLocker, StateLocker};
pub use prompt::{Prompt, PromptError, Query, TerminalPrompt};
pub use remote::{
    HttpRemote, LogStream, RemoteClient, RemoteError, RetryAttempt, RetryHook,
};
pub use render::{Renderer, TerminalRenderer};
pub use slug::{pack, IgnoreRules, PackError};
pub use traced::{TracedRemote, TracedStateLocker};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use interrupt::FakeInterrupter;
#[cfg(any(test, feature = "test-support"))]
pub use locker::{FakeStateLocker, LockCall};
#[cfg(any(test, feature = "test-support"))]
pub use prompt::FakePrompt;
#[cfg(any(test, feature = "test-support"))]
pub use remote::{FakeRemote, RemoteCall, APPLY_LOG_URL, PLAN_LOG_URL};
#[cfg(any(test, feature = "test-support"))]
pub use render::{FakeRenderer, RenderCall};
