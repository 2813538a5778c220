//! Test helpers for tether.

use parking_lot::Mutex;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tether::streamer::OutputSender;
use tether::{StreamId, Streamer};
use tether_shared::constants::upgrade;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

// ============================================================================
// SINKS
// ============================================================================

/// An in-memory sink that can be told to reject writes.
///
/// Clones share the buffer, so a test can keep one clone and move another
/// into a forwarding task.
#[derive(Clone, Default)]
pub struct RecordingSink {
    inner: Arc<Mutex<SinkState>>,
}

#[derive(Default)]
struct SinkState {
    data: Vec<u8>,
    fail_next: bool,
    writes: usize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink whose first write fails.
    pub fn failing_once() -> Self {
        let sink = Self::new();
        sink.fail_next_write();
        sink
    }

    pub fn fail_next_write(&self) {
        self.inner.lock().fail_next = true;
    }

    pub fn contents(&self) -> Vec<u8> {
        self.inner.lock().data.clone()
    }

    pub fn contents_string(&self) -> String {
        String::from_utf8_lossy(&self.inner.lock().data).into_owned()
    }

    /// Number of successful writes.
    pub fn writes(&self) -> usize {
        self.inner.lock().writes
    }
}

impl AsyncWrite for RecordingSink {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let mut state = self.inner.lock();
        if state.fail_next {
            state.fail_next = false;
            return Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "failed")));
        }
        state.data.extend_from_slice(buf);
        state.writes += 1;
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

// ============================================================================
// PRODUCERS
// ============================================================================

/// Producer side of a registered stream.
pub struct Producer {
    pub id: StreamId,
    pub stdout: OutputSender,
    pub stderr: OutputSender,
}

impl Producer {
    pub async fn send_stdout(&self, chunk: &str) {
        self.stdout
            .send(chunk.as_bytes().to_vec())
            .await
            .expect("stdout receiver dropped");
    }

    pub async fn send_stderr(&self, chunk: &str) {
        self.stderr
            .send(chunk.as_bytes().to_vec())
            .await
            .expect("stderr receiver dropped");
    }
}

/// Register a fresh channel pair of `capacity` chunks with `streamer`.
pub fn register(streamer: &Streamer, capacity: usize) -> Producer {
    let (stdout, stdout_rx) = mpsc::channel(capacity);
    let (stderr, stderr_rx) = mpsc::channel(capacity);
    let id = streamer
        .stream(stdout_rx, stderr_rx)
        .expect("stream registration failed");
    Producer { id, stdout, stderr }
}

// ============================================================================
// WAITING
// ============================================================================

/// Poll `check` every few milliseconds until it returns true or `timeout` passes.
pub async fn eventually<F>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Run `fut`, panicking if it takes longer than `timeout`.
pub async fn within<F: Future>(timeout: Duration, fut: F) -> F::Output {
    tokio::time::timeout(timeout, fut)
        .await
        .expect("operation timed out")
}

// ============================================================================
// HTTP
// ============================================================================

/// Send a raw HTTP/1.1 request and return the whole response as text.
///
/// The request is sent with `Connection: close`, so the response ends at EOF.
pub async fn http_request(addr: SocketAddr, method: &str, path: &str, body: &str) -> String {
    let mut conn = TcpStream::connect(addr).await.expect("connect failed");
    let request = format!(
        "{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\
         Content-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    );
    conn.write_all(request.as_bytes())
        .await
        .expect("write failed");

    let mut response = Vec::new();
    conn.read_to_end(&mut response).await.expect("read failed");
    String::from_utf8_lossy(&response).into_owned()
}

/// Issue an upgrade request for `path` and read everything until the server closes.
///
/// Returns the response head (status line and headers) and the raw bytes after it.
pub async fn attach(addr: SocketAddr, path: &str) -> (String, Vec<u8>) {
    let mut conn = TcpStream::connect(addr).await.expect("connect failed");
    let request = format!(
        "GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: Upgrade\r\nUpgrade: {}\r\n\r\n",
        upgrade::PROTOCOL
    );
    conn.write_all(request.as_bytes())
        .await
        .expect("write failed");

    let mut response = Vec::new();
    conn.read_to_end(&mut response).await.expect("read failed");
    split_head(&response)
}

/// Split a raw response at the blank line ending its head.
pub fn split_head(response: &[u8]) -> (String, Vec<u8>) {
    match response.windows(4).position(|w| w == b"\r\n\r\n") {
        Some(end) => (
            String::from_utf8_lossy(&response[..end]).into_owned(),
            response[end + 4..].to_vec(),
        ),
        None => (String::from_utf8_lossy(response).into_owned(), Vec::new()),
    }
}
