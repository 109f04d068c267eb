// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};

/// Request line target and parsed query of one received request
#[derive(Debug, Clone)]
struct Received {
    path: String,
    query: Vec<(String, String)>,
}

impl Received {
    fn param(&self, key: &str) -> Option<usize> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.parse().ok())
    }
}

struct Response {
    status: u16,
    headers: Vec<(&'static str, String)>,
    body: Vec<u8>,
}

impl Response {
    fn status(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    fn header(mut self, name: &'static str, value: &str) -> Self {
        self.headers.push((name, value.to_string()));
        self
    }
}

/// Minimal HTTP/1.1 server on a local port, one response per connection
struct Server {
    base: String,
    received: Arc<Mutex<Vec<Received>>>,
}

impl Server {
    fn start(handler: impl Fn(usize, &Received) -> Response + Send + 'static) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let received = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&received);
        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { return };
                let request = read_request(&stream);
                let index = {
                    let mut log = log.lock().unwrap();
                    log.push(request.clone());
                    log.len() - 1
                };
                write_response(stream, handler(index, &request));
            }
        });
        Self { base, received }
    }

    fn remote(&self, max_retries: u32) -> HttpRemote {
        let config = BackendConfig::parse(
            &format!(
                "[backend]\nhostname = \"{}\"\norganization = \"acme\"\n\n[http]\nmax_retries = {}\n",
                self.base, max_retries
            ),
            |_| None,
        )
        .unwrap();
        HttpRemote::new(&config)
    }

    fn received(&self) -> Vec<Received> {
        self.received.lock().unwrap().clone()
    }
}

fn read_request(stream: &TcpStream) -> Received {
    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).unwrap();
    let mut content_length = 0;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap();
            }
        }
    }
    let mut body = vec![0; content_length];
    reader.read_exact(&mut body).unwrap();

    let target = request_line.split_whitespace().nth(1).unwrap_or_default();
    let (path, query) = target.split_once('?').unwrap_or((target, ""));
    Received {
        path: path.to_string(),
        query: query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    }
}

fn write_response(mut stream: TcpStream, response: Response) {
    let mut head = format!(
        "HTTP/1.1 {} Status\r\nContent-Length: {}\r\nConnection: close\r\n",
        response.status,
        response.body.len()
    );
    for (name, value) in &response.headers {
        head.push_str(&format!("{name}: {value}\r\n"));
    }
    head.push_str("\r\n");
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&response.body);
}

/// Serve `content` by byte offset, at most `chunk` bytes per request
fn log_server(content: Vec<u8>, chunk: usize) -> Server {
    Server::start(move |_, request| {
        let offset = request.param("offset").unwrap_or(0).min(content.len());
        let limit = request.param("limit").unwrap_or(chunk).min(chunk);
        let end = (offset + limit).min(content.len());
        Response::status(200).body(content[offset..end].to_vec())
    })
}

async fn collect_lines(remote: &HttpRemote, url: &str) -> Vec<Result<String, RemoteError>> {
    let mut rx = remote.read_logs(url).await.unwrap();
    let mut lines = Vec::new();
    while let Some(line) = rx.recv().await {
        lines.push(line);
    }
    lines
}

fn recording_hook() -> (RetryHook, Arc<Mutex<Vec<RetryAttempt>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);
    let hook: RetryHook = Arc::new(move |attempt: RetryAttempt| log.lock().unwrap().push(attempt));
    (hook, seen)
}

fn attempt(attempt: u32, status: Option<u16>) -> RetryAttempt {
    RetryAttempt { attempt, status }
}

#[test]
fn retry_wait_is_bounded() {
    assert_eq!(retry_wait(0), Duration::from_millis(100));
    assert_eq!(retry_wait(1), Duration::from_millis(200));
    assert_eq!(retry_wait(2), Duration::from_millis(400));
    assert_eq!(retry_wait(30), Duration::from_millis(400));
}

#[test]
fn api_urls_are_rooted_at_the_base() {
    let config = BackendConfig::parse(
        "[backend]\nhostname = \"app.example.com\"\norganization = \"acme\"\n",
        |_| None,
    )
    .unwrap();
    let remote = HttpRemote::new(&config);
    assert_eq!(
        remote.api("/runs/run-1"),
        "https://app.example.com/api/v2/runs/run-1"
    );
}

#[test]
fn take_lines_keeps_partial_tail() {
    let mut pending = b"one\r\ntwo\nthr".to_vec();

    assert_eq!(take_lines(&mut pending), vec!["one", "two"]);
    assert_eq!(pending, b"thr");
    assert!(take_lines(&mut pending).is_empty());
}

// =============================================================================
// Log following
// =============================================================================

#[tokio::test]
async fn log_chunk_boundary_inside_multibyte_character() {
    let mut content = vec![STX];
    content.extend(std::iter::repeat(b'a').take(LOG_CHUNK - 2));
    content.extend("é first line\nsecond\n".as_bytes());
    content.push(ETX);
    let server = log_server(content, LOG_CHUNK);
    let remote = server.remote(0);

    let lines = collect_lines(&remote, &format!("{}/logs/plan", server.base)).await;

    let lines: Vec<String> = lines.into_iter().map(Result::unwrap).collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], format!("{}é first line", "a".repeat(LOG_CHUNK - 2)));
    assert_eq!(lines[1], "second");
    // The first chunk ends between the two bytes of 'é'
    assert_eq!(server.received()[1].param("offset"), Some(LOG_CHUNK));
}

#[tokio::test]
async fn log_lines_span_chunks_and_final_line_is_flushed() {
    let mut content = vec![STX];
    content.extend(b"one\r\ntwo\nthree");
    content.push(ETX);
    let server = log_server(content, 4);
    let remote = server.remote(0);

    let lines = collect_lines(&remote, &format!("{}/logs/plan", server.base)).await;

    let lines: Vec<String> = lines.into_iter().map(Result::unwrap).collect();
    assert_eq!(lines, vec!["one", "two", "three"]);
    let offsets: Vec<_> = server
        .received()
        .iter()
        .map(|r| r.param("offset").unwrap())
        .collect();
    assert_eq!(offsets, vec![0, 4, 8, 12]);
}

#[tokio::test]
async fn log_failure_is_delivered_on_the_stream() {
    let server = Server::start(|_, _| Response::status(404));
    let remote = server.remote(0);

    let lines = collect_lines(&remote, &format!("{}/logs/plan", server.base)).await;

    assert_eq!(lines.len(), 1);
    assert!(matches!(&lines[0], Err(RemoteError::NotFound(what)) if what == "log"));
}

// =============================================================================
// Status mapping
// =============================================================================

#[tokio::test]
async fn missing_run_is_not_found() {
    let server = Server::start(|_, _| Response::status(404));
    let remote = server.remote(3);

    let err = remote.read_run("run-1").await.unwrap_err();

    assert!(matches!(&err, RemoteError::NotFound(what) if what == "run run-1"), "{err:?}");
    assert_eq!(server.received().len(), 1);
    assert_eq!(server.received()[0].path, "/api/v2/runs/run-1");
}

#[tokio::test]
async fn rejected_token_is_unauthorized() {
    let server = Server::start(|_, _| {
        Response::status(401).body(r#"{"errors":[{"status":"401","title":"unauthorized"}]}"#)
    });
    let remote = server.remote(3);

    let err = remote.read_workspace("acme", "prod").await.unwrap_err();

    assert!(matches!(err, RemoteError::Unauthorized(_)), "{err:?}");
    assert_eq!(server.received().len(), 1);
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = Server::start(|_, _| Response::status(422));
    let remote = server.remote(3);

    let err = remote.read_run("run-1").await.unwrap_err();

    assert!(matches!(err, RemoteError::Status { status: 422, .. }), "{err:?}");
    assert_eq!(server.received().len(), 1);
}

// =============================================================================
// Retries
// =============================================================================

#[tokio::test]
async fn server_errors_are_retried_until_success() {
    let server = Server::start(|index, _| match index {
        0 | 1 => Response::status(503),
        _ => Response::status(200)
            .header(API_VERSION_HEADER, "2.5")
            .header(RELEASE_HEADER, "v202302-1"),
    });
    let (hook, seen) = recording_hook();
    let remote = server.remote(5).with_retry_hook(hook);

    let info = remote.service_info().await.unwrap();

    assert_eq!(info.api_version.as_deref(), Some("2.5"));
    assert_eq!(info.release.as_deref(), Some("v202302-1"));
    assert_eq!(server.received().len(), 3);
    assert_eq!(
        *seen.lock().unwrap(),
        vec![attempt(0, None), attempt(1, Some(503)), attempt(2, Some(503))]
    );
}

#[tokio::test]
async fn rate_limited_requests_are_retried() {
    let server = Server::start(|index, _| match index {
        0 => Response::status(429),
        _ => Response::status(200),
    });
    let (hook, seen) = recording_hook();
    let remote = server.remote(5).with_retry_hook(hook);

    remote.service_info().await.unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![attempt(0, None), attempt(1, Some(429))]
    );
}

#[tokio::test]
async fn retries_stop_at_the_cap() {
    let server = Server::start(|_, _| Response::status(500));
    let (hook, seen) = recording_hook();
    let remote = server.remote(2).with_retry_hook(hook);

    let err = remote.service_info().await.unwrap_err();

    assert!(matches!(err, RemoteError::Status { status: 500, .. }), "{err:?}");
    assert_eq!(server.received().len(), 3);
    assert_eq!(
        *seen.lock().unwrap(),
        vec![attempt(0, None), attempt(1, Some(500)), attempt(2, Some(500))]
    );
}

#[tokio::test]
async fn transport_errors_are_retried() {
    // Nothing listens on a port whose listener was dropped
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let config = BackendConfig::parse(
        &format!(
            "[backend]\nhostname = \"http://127.0.0.1:{port}\"\norganization = \"acme\"\n\n[http]\nmax_retries = 1\n"
        ),
        |_| None,
    )
    .unwrap();
    let (hook, seen) = recording_hook();
    let remote = HttpRemote::new(&config).with_retry_hook(hook);

    let err = remote.service_info().await.unwrap_err();

    assert!(matches!(err, RemoteError::Transport(_)), "{err:?}");
    assert_eq!(*seen.lock().unwrap(), vec![attempt(0, None), attempt(1, None)]);
}
