// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock-timeout guard
//!
//! A run stuck in the queue holds the local consistency lock indefinitely.
//! Once the timeout passes, a still-pending run is interrupted so the stop
//! path can cancel it without asking.

use relay_adapters::{Interrupter, RemoteClient, Renderer};
use relay_core::RunStatus;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const LOCK_TIMEOUT_NOTICE: &str =
    "Lock timeout exceeded, sending interrupt to cancel the remote operation.";

pub(crate) struct LockTimeoutGuard<R, I, Rd> {
    pub remote: R,
    pub interrupter: I,
    pub renderer: Rd,
    pub approved: Arc<AtomicBool>,
    pub stop: CancellationToken,
    pub cancel: CancellationToken,
}

/// Disarms the guard when dropped
pub(crate) struct ArmedGuard {
    finished: CancellationToken,
}

impl Drop for ArmedGuard {
    fn drop(&mut self) {
        self.finished.cancel();
    }
}

impl<R, I, Rd> LockTimeoutGuard<R, I, Rd>
where
    R: RemoteClient,
    I: Interrupter,
    Rd: Renderer,
{
    /// Start watching `run_id`; a zero duration arms nothing
    pub fn arm(self, run_id: &str, after: Duration) -> Option<ArmedGuard> {
        if after.is_zero() {
            return None;
        }
        let finished = CancellationToken::new();
        tokio::spawn(self.watch(run_id.to_string(), after, finished.clone()));
        Some(ArmedGuard { finished })
    }

    /// Returns whether the interrupt was sent
    pub async fn watch(self, run_id: String, after: Duration, finished: CancellationToken) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return false,
            _ = self.stop.cancelled() => return false,
            _ = finished.cancelled() => return false,
            _ = tokio::time::sleep(after) => {}
        }

        let run = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return false,
            result = self.remote.read_run(&run_id) => match result {
                Ok(run) => run,
                Err(e) => {
                    tracing::warn!(run_id = %run_id, error = %e, "lock timeout guard could not read run");
                    return false;
                }
            },
        };
        if run.status != RunStatus::Pending || !run.actions.is_cancelable {
            tracing::debug!(run_id = %run_id, status = %run.status, "run left the queue before lock timeout");
            return false;
        }
        if self.stop.is_cancelled() || self.cancel.is_cancelled() || finished.is_cancelled() {
            return false;
        }

        tracing::info!(run_id = %run_id, timeout_ms = after.as_millis() as u64, "lock timeout exceeded");
        self.renderer.print(LOCK_TIMEOUT_NOTICE);
        self.approved.store(true, Ordering::SeqCst);
        if let Err(e) = self.interrupter.interrupt() {
            tracing::error!(error = %e, "failed to interrupt after lock timeout");
        }
        true
    }
}

#[cfg(test)]
#[path = "guard_tests.rs"]
mod tests;
