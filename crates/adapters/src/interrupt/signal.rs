// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SIGINT delivery via `nix`

use super::{InterruptError, Interrupter};
use nix::sys::signal::{raise, Signal};

/// Raises SIGINT in the current process, routing through the installed
/// Ctrl-C handler
#[derive(Clone, Copy, Debug, Default)]
pub struct SignalInterrupter;

impl Interrupter for SignalInterrupter {
    fn interrupt(&self) -> Result<(), InterruptError> {
        raise(Signal::SIGINT).map_err(|e| InterruptError(e.to_string()))
    }
}
