// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake state locker for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{LockError, StateLocker};
use async_trait::async_trait;
use relay_core::LockInfo;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Recorded locker call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockCall {
    Lock { id: String, operation: String },
    Unlock,
}

#[derive(Default)]
struct FakeLockState {
    held: bool,
    fail_lock: Option<LockError>,
    fail_unlock: Option<LockError>,
    calls: Vec<LockCall>,
}

/// In-memory locker that records calls
#[derive(Clone, Default)]
pub struct FakeStateLocker {
    state: Arc<Mutex<FakeLockState>>,
    timeout: Duration,
}

impl FakeStateLocker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, FakeLockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn calls(&self) -> Vec<LockCall> {
        self.lock_state().calls.clone()
    }

    pub fn is_locked(&self) -> bool {
        self.lock_state().held
    }

    pub fn unlock_count(&self) -> usize {
        self.lock_state()
            .calls
            .iter()
            .filter(|c| matches!(c, LockCall::Unlock))
            .count()
    }

    pub fn fail_lock(&self, error: LockError) {
        self.lock_state().fail_lock = Some(error);
    }

    pub fn fail_unlock(&self, error: LockError) {
        self.lock_state().fail_unlock = Some(error);
    }
}

#[async_trait]
impl StateLocker for FakeStateLocker {
    async fn lock(&self, info: &LockInfo) -> Result<(), LockError> {
        let mut state = self.lock_state();
        state.calls.push(LockCall::Lock {
            id: info.id.clone(),
            operation: info.operation.clone(),
        });
        if let Some(error) = state.fail_lock.clone() {
            return Err(error);
        }
        if state.held {
            return Err(LockError::Held {
                holder: "fake".to_string(),
            });
        }
        state.held = true;
        Ok(())
    }

    async fn unlock(&self) -> Result<(), LockError> {
        let mut state = self.lock_state();
        state.calls.push(LockCall::Unlock);
        state.held = false;
        match state.fail_unlock.clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}
