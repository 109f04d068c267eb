// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifier generation for lock holders and fake remote resources

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Generates prefixed unique identifiers such as `run-3f2a...`
pub trait IdGen: Clone + Send + Sync + 'static {
    fn next(&self, prefix: &str) -> String;
}

/// UUID-based ID generator for production use
#[derive(Clone, Default)]
pub struct UuidIdGen;

impl IdGen for UuidIdGen {
    fn next(&self, prefix: &str) -> String {
        let uuid = uuid::Uuid::new_v4().simple().to_string();
        format!("{}-{}", prefix, &uuid[..16])
    }
}

/// Sequential ID generator for testing
#[derive(Clone)]
pub struct SequentialIdGen {
    counter: Arc<AtomicU64>,
}

impl SequentialIdGen {
    pub fn new() -> Self {
        Self {
            counter: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl Default for SequentialIdGen {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGen for SequentialIdGen {
    fn next(&self, prefix: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        format!("{}-{}", prefix, n)
    }
}
