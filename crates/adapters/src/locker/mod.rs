// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local consistency lock adapters

mod file;
mod noop;

pub use file::FileStateLocker;
pub use noop::NoOpStateLocker;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeStateLocker, LockCall};

use async_trait::async_trait;
use relay_core::LockInfo;
use std::time::Duration;
use thiserror::Error;

/// Errors from lock operations
#[derive(Debug, Clone, Error)]
pub enum LockError {
    #[error("state is locked by another operation\n\n{holder}")]
    Held { holder: String },
    #[error("lock I/O failed: {0}")]
    Io(String),
}

/// Guards local state against concurrent operations
#[async_trait]
pub trait StateLocker: Clone + Send + Sync + 'static {
    /// Acquire the lock, waiting up to [`StateLocker::timeout`]
    async fn lock(&self, info: &LockInfo) -> Result<(), LockError>;

    /// Release the lock. Releasing an unheld lock succeeds.
    async fn unlock(&self) -> Result<(), LockError>;

    /// How long acquisition may wait; zero means a single attempt
    fn timeout(&self) -> Duration;
}
