// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exclusive file lock via `fs2`

use super::{LockError, StateLocker};
use async_trait::async_trait;
use fs2::FileExt;
use relay_core::LockInfo;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const RETRY_INTERVAL: Duration = Duration::from_millis(250);

/// Locks a file next to the local state. The holder's [`LockInfo`] is
/// written into the file.
#[derive(Clone)]
pub struct FileStateLocker {
    path: PathBuf,
    timeout: Duration,
    held: Arc<Mutex<Option<File>>>,
}

impl FileStateLocker {
    pub fn new(path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            path: path.into(),
            timeout,
            held: Arc::new(Mutex::new(None)),
        }
    }

    fn try_acquire(&self, info: &LockInfo) -> Result<Option<File>, LockError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LockError::Io(e.to_string()))?;
        }
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .map_err(|e| LockError::Io(e.to_string()))?;

        if file.try_lock_exclusive().is_err() {
            return Ok(None);
        }

        let contents =
            serde_json::to_string_pretty(info).map_err(|e| LockError::Io(e.to_string()))?;
        file.set_len(0)
            .and_then(|_| file.seek(SeekFrom::Start(0)))
            .and_then(|_| file.write_all(contents.as_bytes()))
            .and_then(|_| file.flush())
            .map_err(|e| LockError::Io(e.to_string()))?;
        Ok(Some(file))
    }

    fn holder(&self) -> String {
        let mut contents = String::new();
        let read = File::open(&self.path).and_then(|mut f| f.read_to_string(&mut contents));
        match read.ok().and_then(|_| serde_json::from_str::<LockInfo>(&contents).ok()) {
            Some(info) => info.to_string(),
            None => format!("Lock file: {}", self.path.display()),
        }
    }
}

#[async_trait]
impl StateLocker for FileStateLocker {
    async fn lock(&self, info: &LockInfo) -> Result<(), LockError> {
        let started = Instant::now();
        loop {
            let locker = self.clone();
            let attempt_info = info.clone();
            let acquired = tokio::task::spawn_blocking(move || locker.try_acquire(&attempt_info))
                .await
                .map_err(|e| LockError::Io(e.to_string()))??;

            if let Some(file) = acquired {
                *self.held.lock().unwrap_or_else(|e| e.into_inner()) = Some(file);
                tracing::debug!(path = %self.path.display(), id = %info.id, "state locked");
                return Ok(());
            }

            if started.elapsed() >= self.timeout {
                return Err(LockError::Held {
                    holder: self.holder(),
                });
            }
            tokio::time::sleep(RETRY_INTERVAL).await;
        }
    }

    async fn unlock(&self) -> Result<(), LockError> {
        let file = self.held.lock().unwrap_or_else(|e| e.into_inner()).take();
        let Some(file) = file else {
            return Ok(());
        };
        file.set_len(0).map_err(|e| LockError::Io(e.to_string()))?;
        FileExt::unlock(&file).map_err(|e| LockError::Io(e.to_string()))?;
        tracing::debug!(path = %self.path.display(), "state unlocked");
        Ok(())
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
