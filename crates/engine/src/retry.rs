// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reconnect reporting for flaky connections

use relay_adapters::{Renderer, RetryAttempt, RetryHook};
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

pub const INITIAL_RETRY_MESSAGE: &str = "There was an error connecting to the remote service. Please do not exit relay to prevent data loss! Trying to restore the connection...";

/// Per-operation retry bookkeeping
///
/// Rate-limited responses (429) are retried by the client but not reported.
pub struct RetryReporter<Rd> {
    renderer: Rd,
    last_retry: Mutex<Instant>,
}

impl<Rd: Renderer> RetryReporter<Rd> {
    pub fn new(renderer: Rd) -> Self {
        Self {
            renderer,
            last_retry: Mutex::new(Instant::now()),
        }
    }

    pub fn record(&self, attempt: RetryAttempt) {
        if attempt.status == Some(429) {
            return;
        }
        let mut last_retry = self.last_retry.lock().unwrap_or_else(|e| e.into_inner());
        if attempt.attempt == 0 {
            *last_retry = Instant::now();
            return;
        }
        tracing::debug!(attempt = attempt.attempt, status = ?attempt.status, "retrying request");
        if attempt.attempt == 1 {
            self.renderer.print(INITIAL_RETRY_MESSAGE);
        } else {
            let elapsed = last_retry.elapsed().as_secs_f64().round() as u64;
            self.renderer.print(&format!(
                "Still trying to restore the connection... ({}s elapsed)",
                elapsed
            ));
        }
    }

    /// The hook handed to the remote client
    pub fn into_hook(self) -> RetryHook {
        let reporter = Arc::new(self);
        Arc::new(move |attempt: RetryAttempt| reporter.record(attempt))
    }
}
