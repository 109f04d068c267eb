// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op locker for when local locking is disabled.

use super::{LockError, StateLocker};
use async_trait::async_trait;
use relay_core::LockInfo;
use std::time::Duration;

/// Locker that never blocks.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpStateLocker;

impl NoOpStateLocker {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StateLocker for NoOpStateLocker {
    async fn lock(&self, _info: &LockInfo) -> Result<(), LockError> {
        Ok(())
    }

    async fn unlock(&self) -> Result<(), LockError> {
        Ok(())
    }

    fn timeout(&self) -> Duration {
        Duration::ZERO
    }
}
