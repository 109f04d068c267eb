// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake interrupter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{InterruptError, Interrupter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

type Callback = Arc<dyn Fn() + Send + Sync>;

/// Counts interrupts and optionally runs a callback for each
#[derive(Clone, Default)]
pub struct FakeInterrupter {
    count: Arc<AtomicUsize>,
    on_interrupt: Option<Callback>,
}

impl FakeInterrupter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` on every interrupt, e.g. to trigger a graceful stop
    pub fn with_callback(f: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            count: Arc::default(),
            on_interrupt: Some(Arc::new(f)),
        }
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl Interrupter for FakeInterrupter {
    fn interrupt(&self) -> Result<(), InterruptError> {
        self.count.fetch_add(1, Ordering::SeqCst);
        if let Some(f) = &self.on_interrupt {
            f();
        }
        Ok(())
    }
}
