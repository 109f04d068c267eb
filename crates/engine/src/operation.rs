// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handle to a dispatched operation

use relay_core::{Diagnostic, Diagnostics, OperationResult, Run};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
struct Outcome {
    result: OperationResult,
    plan_empty: bool,
    run_id: Option<String>,
    diagnostics: Diagnostics,
}

impl Default for Outcome {
    fn default() -> Self {
        Self {
            result: OperationResult::Failure,
            plan_empty: true,
            run_id: None,
            diagnostics: Diagnostics::new(),
        }
    }
}

fn lock(outcome: &Mutex<Outcome>) -> MutexGuard<'_, Outcome> {
    outcome.lock().unwrap_or_else(|e| e.into_inner())
}

/// A running remote operation
///
/// Returned as soon as the background task is spawned. Result fields are
/// final once [`RunningOperation::wait`] returns.
#[derive(Clone)]
pub struct RunningOperation {
    outcome: Arc<Mutex<Outcome>>,
    done: watch::Receiver<bool>,
    stop: CancellationToken,
    cancel: CancellationToken,
}

impl RunningOperation {
    pub(crate) fn new(stop: CancellationToken, cancel: CancellationToken) -> (Self, Completion) {
        let outcome = Arc::new(Mutex::new(Outcome::default()));
        let (tx, rx) = watch::channel(false);
        let handle = Self {
            outcome: Arc::clone(&outcome),
            done: rx,
            stop,
            cancel,
        };
        (handle, Completion { outcome, done: tx })
    }

    /// Wait for the background task to finish
    pub async fn wait(&self) {
        let mut done = self.done.clone();
        // A dropped sender also means the task is gone
        let _ = done.wait_for(|finished| *finished).await;
    }

    pub fn is_done(&self) -> bool {
        *self.done.borrow()
    }

    /// Graceful stop: offer to cancel the remote run, then finish
    pub fn stop(&self) {
        self.stop.cancel();
    }

    /// Hard cancel: abandon local waiting immediately
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn result(&self) -> OperationResult {
        lock(&self.outcome).result
    }

    pub fn plan_empty(&self) -> bool {
        lock(&self.outcome).plan_empty
    }

    pub fn run_id(&self) -> Option<String> {
        lock(&self.outcome).run_id.clone()
    }

    pub fn diagnostics(&self) -> Diagnostics {
        lock(&self.outcome).diagnostics.clone()
    }
}

/// Write side of the handle, owned by the background task
pub(crate) struct Completion {
    outcome: Arc<Mutex<Outcome>>,
    done: watch::Sender<bool>,
}

impl Completion {
    pub fn observe(&self, run: &Run) {
        let mut outcome = lock(&self.outcome);
        outcome.run_id = Some(run.id.clone());
        outcome.plan_empty = !run.has_changes;
    }

    pub fn push(&self, diagnostic: Diagnostic) {
        lock(&self.outcome).diagnostics.push(diagnostic);
    }

    /// Record the result and fire the completion signal
    pub fn finish(self, result: OperationResult) {
        lock(&self.outcome).result = result;
        self.done.send_replace(true);
    }
}
