// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::locker::FakeStateLocker;
use crate::remote::FakeRemote;
use relay_core::OperationKind;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// A writer that captures log output for testing
#[derive(Clone, Default)]
struct CapturedLogs {
    logs: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    fn new() -> Self {
        Self::default()
    }

    fn contents(&self) -> String {
        let logs = self.logs.lock().unwrap();
        String::from_utf8_lossy(&logs).to_string()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.logs.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run a test with captured tracing output
fn with_tracing<F, Fut>(f: F) -> (String, Fut::Output)
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future,
{
    let logs = CapturedLogs::new();
    let logs_clone = logs.clone();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(logs_clone)
        .with_ansi(false)
        .without_time()
        .finish();

    let result = tracing::subscriber::with_default(subscriber, || {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(f())
    });

    (logs.contents(), result)
}

#[test]
fn create_run_logs_span_and_run_id() {
    let traced = TracedRemote::new(FakeRemote::new());
    let options = RunOptions {
        workspace_id: "ws-1".into(),
        configuration_version_id: "cv-1".into(),
        ..RunOptions::default()
    };

    let (logs, result) = with_tracing(|| async { traced.create_run(&options).await });

    assert!(result.is_ok());
    assert!(logs.contains("remote.create_run"), "logs: {logs}");
    assert!(logs.contains("workspace_id=ws-1"), "logs: {logs}");
    assert!(logs.contains("run created"), "logs: {logs}");
    assert!(logs.contains("run_id=run-1"), "logs: {logs}");
    assert!(logs.contains("elapsed_ms="), "logs: {logs}");
}

#[test]
fn read_workspace_failure_is_logged_at_error() {
    let fake = FakeRemote::new();
    fake.fail("read_workspace", RemoteError::NotFound("workspace \"app\"".into()));
    let traced = TracedRemote::new(fake);

    let (logs, result) =
        with_tracing(|| async { traced.read_workspace("acme", "app").await });

    assert!(result.unwrap_err().is_not_found());
    assert!(logs.contains("ERROR"), "logs: {logs}");
    assert!(logs.contains("read failed"), "logs: {logs}");
    assert!(logs.contains("acme"), "logs: {logs}");
}

#[test]
fn polling_reads_log_at_trace() {
    let traced = TracedRemote::new(FakeRemote::new());

    let (logs, _) = with_tracing(|| async {
        let run = traced.create_run(&RunOptions::default()).await.unwrap();
        traced.read_run(&run.id).await
    });

    assert!(logs.contains("TRACE"), "logs: {logs}");
    assert!(logs.contains("polled"), "logs: {logs}");
}

#[test]
fn retry_hook_survives_wrapping() {
    let fake = FakeRemote::new();
    fake.simulate_retries(vec![crate::remote::RetryAttempt {
        attempt: 1,
        status: Some(503),
    }]);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let traced = TracedRemote::new(fake).with_retry_hook(Arc::new(move |a: crate::remote::RetryAttempt| {
        sink.lock().unwrap().push(a.attempt);
    }));

    let (_, result) = with_tracing(|| async { traced.service_info().await });

    assert!(result.is_ok());
    assert_eq!(*seen.lock().unwrap(), vec![1]);
}

#[test]
fn locker_logs_acquire_and_release() {
    let traced = TracedStateLocker::new(FakeStateLocker::new());
    let info = LockInfo::new("lock-1", OperationKind::Plan.to_string(), "app");

    let (logs, result) = with_tracing(|| async {
        traced.lock(&info).await?;
        traced.unlock().await
    });

    assert!(result.is_ok());
    assert!(logs.contains("state.lock"), "logs: {logs}");
    assert!(logs.contains("acquired"), "logs: {logs}");
    assert!(logs.contains("state unlocked"), "logs: {logs}");
}

#[test]
fn locker_contention_is_logged_as_error() {
    let inner = FakeStateLocker::new();
    let traced = TracedStateLocker::new(inner.clone());
    let info = LockInfo::new("lock-1", "apply", "app");

    let (logs, result) = with_tracing(|| async {
        traced.lock(&info).await?;
        traced.lock(&info).await
    });

    assert!(matches!(result, Err(LockError::Held { .. })));
    assert!(logs.contains("ERROR"), "logs: {logs}");
    assert!(inner.is_locked());
}

#[test]
fn timeout_passes_through() {
    let traced = TracedStateLocker::new(FakeStateLocker::with_timeout(Duration::from_secs(5)));
    assert_eq!(traced.timeout(), Duration::from_secs(5));
}
