//! Stream registry.
//!
//! Lets HTTP consumers attach to the stdout/stderr of a running process at
//! any point in its life, including shortly after it exited.
//!
//! ## Lifecycle
//!
//! ```text
//! stream() ──► LIVE ──stop()──► STOPPED ──grace time──► removed
//! ```
//!
//! - `stream_stdout`/`stream_stderr` on a LIVE stream forward chunks until
//!   the stream is stopped, then drain what is buffered.
//! - On a STOPPED stream they only drain.
//! - On a removed (or never issued) id they return immediately.
//! - `stop` is only valid on a LIVE stream.
//!
//! The registry map is the only shared state. Its lock is held for map
//! operations only, never while forwarding.

mod entry;
mod error;
mod forward;
mod id;

pub use entry::{OutputKind, OutputReceiver, OutputSender};
pub use error::StreamerError;
pub use forward::ForwardOutcome;
pub use id::StreamId;

use crate::runtime::options::StreamerOptions;
use entry::StreamEntry;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tether_shared::errors::TetherResult;
use tokio::io::AsyncWrite;
use tracing::debug;

/// Registry of attachable output streams.
///
/// Cheap to clone; clones share the same registry. Create one per server
/// and pass it to whatever needs it.
#[derive(Clone)]
pub struct Streamer {
    inner: Arc<Inner>,
}

struct Inner {
    options: StreamerOptions,
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    next_id: u32,
    streams: HashMap<StreamId, Arc<StreamEntry>>,
}

impl State {
    /// Pick the next id at or after the cursor that is not registered.
    ///
    /// The cursor wraps at `max_streams`. Returns `None` when every id is taken.
    fn allocate(&mut self, max_streams: u32) -> Option<StreamId> {
        for _ in 0..max_streams {
            let candidate = StreamId::new(self.next_id);
            self.next_id = if self.next_id + 1 >= max_streams {
                0
            } else {
                self.next_id + 1
            };
            if !self.streams.contains_key(&candidate) {
                return Some(candidate);
            }
        }
        None
    }
}

impl Streamer {
    /// Registry with the full `u32` id space.
    ///
    /// `grace_time` bounds how long a stopped stream holds memory.
    pub fn new(grace_time: Duration) -> Self {
        Self::from_valid_options(StreamerOptions::with_grace_time(grace_time))
    }

    /// Registry allowing at most `max_streams` registered streams at once.
    pub fn with_limit(grace_time: Duration, max_streams: u32) -> TetherResult<Self> {
        Self::with_options(StreamerOptions {
            grace_time,
            max_streams,
        })
    }

    pub fn with_options(options: StreamerOptions) -> TetherResult<Self> {
        options.validate()?;
        Ok(Self::from_valid_options(options))
    }

    fn from_valid_options(options: StreamerOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                options,
                state: Mutex::new(State::default()),
            }),
        }
    }

    pub fn options(&self) -> &StreamerOptions {
        &self.inner.options
    }

    /// Register a stdout/stderr channel pair and return its id.
    ///
    /// The caller keeps the senders and must call [`Streamer::stop`] once the
    /// process has finished producing output, or the entry is never freed.
    ///
    /// # Errors
    ///
    /// [`StreamerError::CapacityExhausted`] if every id is registered. The
    /// receivers are dropped in that case. This indicates streams that were
    /// never stopped.
    pub fn stream(
        &self,
        stdout: OutputReceiver,
        stderr: OutputReceiver,
    ) -> Result<StreamId, StreamerError> {
        let max_streams = self.inner.options.max_streams;
        let mut state = self.inner.state.lock();

        let id = state
            .allocate(max_streams)
            .ok_or(StreamerError::CapacityExhausted { max_streams })?;
        state
            .streams
            .insert(id, Arc::new(StreamEntry::new(stdout, stderr)));

        debug!(stream_id = %id, registered = state.streams.len(), "stream registered");
        Ok(id)
    }

    /// Forward the stdout channel of `id` into `sink`.
    ///
    /// See [`Streamer::stream_output`].
    pub async fn stream_stdout<W>(&self, id: StreamId, sink: Option<W>) -> ForwardOutcome
    where
        W: AsyncWrite + Unpin,
    {
        self.stream_output(id, OutputKind::Stdout, sink).await
    }

    /// Forward the stderr channel of `id` into `sink`.
    ///
    /// See [`Streamer::stream_output`].
    pub async fn stream_stderr<W>(&self, id: StreamId, sink: Option<W>) -> ForwardOutcome
    where
        W: AsyncWrite + Unpin,
    {
        self.stream_output(id, OutputKind::Stderr, sink).await
    }

    /// Forward one channel of `id` into `sink` until the stream is stopped
    /// and drained, the sink rejects a write, or the producer hangs up.
    ///
    /// Returns immediately when `sink` is `None` or `id` is not registered.
    /// Neither case is an error: a consumer racing process exit and cleanup
    /// simply sees an empty stream.
    ///
    /// Consumers attaching to the same channel concurrently are served one
    /// after another.
    pub async fn stream_output<W>(
        &self,
        id: StreamId,
        kind: OutputKind,
        sink: Option<W>,
    ) -> ForwardOutcome
    where
        W: AsyncWrite + Unpin,
    {
        let Some(mut sink) = sink else {
            return ForwardOutcome::NoSink;
        };
        let Some(entry) = self.entry(id) else {
            debug!(stream_id = %id, channel = %kind, "attach to unknown stream");
            return ForwardOutcome::UnknownStream;
        };

        debug!(stream_id = %id, channel = %kind, "forwarding started");
        let outcome = forward::forward_until_stopped(&entry, kind, &mut sink).await;
        debug!(stream_id = %id, channel = %kind, ?outcome, "forwarding finished");
        outcome
    }

    /// Mark `id` as stopped and schedule its removal after the grace time.
    ///
    /// Consumers already forwarding drain what is buffered and return.
    /// Consumers attaching during the grace time drain and return.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Both errors are caller bugs in process lifecycle bookkeeping:
    /// - [`StreamerError::UnknownStream`] if `id` was never issued or was already removed
    /// - [`StreamerError::AlreadyStopped`] if `stop` was already called for `id`
    pub fn stop(&self, id: StreamId) -> Result<(), StreamerError> {
        {
            let state = self.inner.state.lock();
            let entry = state
                .streams
                .get(&id)
                .ok_or(StreamerError::UnknownStream(id))?;
            if !entry.stop() {
                return Err(StreamerError::AlreadyStopped(id));
            }
        }

        debug!(stream_id = %id, grace_time = ?self.inner.options.grace_time, "stream stopped");
        self.schedule_removal(id);
        Ok(())
    }

    fn schedule_removal(&self, id: StreamId) {
        let registry: Weak<Inner> = Arc::downgrade(&self.inner);
        let grace_time = self.inner.options.grace_time;

        tokio::spawn(async move {
            tokio::time::sleep(grace_time).await;

            let Some(inner) = registry.upgrade() else {
                return;
            };
            let removed = inner.state.lock().streams.remove(&id).is_some();
            if removed {
                debug!(stream_id = %id, "stream removed");
            }
        });
    }

    /// Whether `id` is currently registered (live or within its grace time).
    pub fn contains(&self, id: StreamId) -> bool {
        self.inner.state.lock().streams.contains_key(&id)
    }

    /// Whether `id` is registered and has been stopped.
    pub fn is_stopped(&self, id: StreamId) -> bool {
        self.entry(id).is_some_and(|entry| entry.is_stopped())
    }

    /// Number of registered streams, including stopped ones awaiting removal.
    pub fn len(&self) -> usize {
        self.inner.state.lock().streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entry(&self, id: StreamId) -> Option<Arc<StreamEntry>> {
        self.inner.state.lock().streams.get(&id).cloned()
    }
}

impl std::fmt::Debug for Streamer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Streamer")
            .field("options", &self.inner.options)
            .field("registered", &self.len())
            .finish()
    }
}
