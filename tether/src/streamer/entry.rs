//! Per-stream state held by the registry.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

/// Receiving half of a producer channel. Each message is one output chunk.
pub type OutputReceiver = mpsc::Receiver<Vec<u8>>;

/// Sending half of a producer channel, kept by whoever runs the process.
pub type OutputSender = mpsc::Sender<Vec<u8>>;

/// Which of a process's two output channels to read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Stdout,
    Stderr,
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputKind::Stdout => f.write_str("stdout"),
            OutputKind::Stderr => f.write_str("stderr"),
        }
    }
}

/// A registered channel pair and its stop signal.
///
/// Each receiver sits behind an async mutex so that consumers attaching to
/// the same channel take turns instead of splitting chunks between them.
/// The stop signal is set once and observed by any number of consumers.
pub(super) struct StreamEntry {
    stdout: Mutex<OutputReceiver>,
    stderr: Mutex<OutputReceiver>,
    stopped: CancellationToken,
}

impl StreamEntry {
    pub(super) fn new(stdout: OutputReceiver, stderr: OutputReceiver) -> Self {
        Self {
            stdout: Mutex::new(stdout),
            stderr: Mutex::new(stderr),
            stopped: CancellationToken::new(),
        }
    }

    pub(super) fn output(&self, kind: OutputKind) -> &Mutex<OutputReceiver> {
        match kind {
            OutputKind::Stdout => &self.stdout,
            OutputKind::Stderr => &self.stderr,
        }
    }

    pub(super) fn stopped(&self) -> &CancellationToken {
        &self.stopped
    }

    pub(super) fn is_stopped(&self) -> bool {
        self.stopped.is_cancelled()
    }

    /// Fire the stop signal. Returns `false` if it had already fired.
    ///
    /// Callers must hold the registry lock so that two concurrent stops
    /// cannot both observe the signal as unset.
    pub(super) fn stop(&self) -> bool {
        if self.stopped.is_cancelled() {
            return false;
        }
        self.stopped.cancel();
        true
    }
}
