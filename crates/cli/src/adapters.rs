// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backend factory for CLI commands

use relay_adapters::{
    HttpRemote, SignalInterrupter, StateLocker, TerminalPrompt, TerminalRenderer, TracedRemote,
    TracedStateLocker,
};
use relay_core::{BackendConfig, UuidIdGen};
use relay_engine::{Backend, BackendDeps};
use std::path::{Path, PathBuf};

/// Production backend over HTTPS with terminal I/O
pub type RealBackend<L> = Backend<
    TracedRemote<HttpRemote>,
    TracedStateLocker<L>,
    TerminalPrompt,
    SignalInterrupter,
    TerminalRenderer,
    UuidIdGen,
>;

/// Create a production backend using `locker` for local state consistency
pub fn make_backend<L: StateLocker>(config: &BackendConfig, locker: L, color: bool) -> RealBackend<L> {
    let deps = BackendDeps {
        remote: TracedRemote::new(HttpRemote::new(config)),
        locker: TracedStateLocker::new(locker),
        prompt: TerminalPrompt::new(),
        interrupter: SignalInterrupter,
        renderer: TerminalRenderer::new(color),
    };
    Backend::new(deps, config, UuidIdGen)
}

/// Lock file guarding local state in `dir`
pub fn lock_path(dir: &Path) -> PathBuf {
    dir.join(".relay").join("relay.lock")
}
