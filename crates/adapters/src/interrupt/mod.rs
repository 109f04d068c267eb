// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Delivering a process interrupt

mod signal;

pub use signal::SignalInterrupter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeInterrupter;

use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("failed to deliver interrupt: {0}")]
pub struct InterruptError(pub String);

/// Interrupts the process as if the user pressed Ctrl-C
pub trait Interrupter: Clone + Send + Sync + 'static {
    fn interrupt(&self) -> Result<(), InterruptError>;
}
