//! Process execution.
//!
//! Spawns a program, feeds its stdout/stderr into the stream registry, and
//! stops the stream once the process has exited and both pipes are drained.
//!
//! ```text
//! child stdout ──pump──► channel ──► Streamer ◄── HTTP consumers
//! child stderr ──pump──► channel ──┘
//! ```

mod output;

use crate::streamer::{StreamId, Streamer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use tether_shared::errors::{TetherError, TetherResult};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// What to run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSpec {
    /// Program to execute, resolved through `PATH` when not absolute.
    pub path: String,

    #[serde(default)]
    pub args: Vec<String>,

    /// Extra environment variables, added to the server's environment.
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Working directory. Defaults to the server's.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl ProcessSpec {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

/// A started process and the stream carrying its output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnedProcess {
    pub stream_id: StreamId,
    pub pid: u32,
}

/// Starts processes whose output is attachable through a [`Streamer`].
#[derive(Clone, Debug)]
pub struct ProcessRunner {
    streamer: Streamer,
    channel_capacity: usize,
}

impl ProcessRunner {
    /// `channel_capacity` is the number of chunks buffered per output
    /// channel before reading from the process pauses.
    pub fn new(streamer: Streamer, channel_capacity: usize) -> Self {
        Self {
            streamer,
            channel_capacity: channel_capacity.max(1),
        }
    }

    pub fn streamer(&self) -> &Streamer {
        &self.streamer
    }

    /// Spawn `spec` and register its output.
    ///
    /// The returned stream stays live until the process exits and both of
    /// its pipes reach EOF, then is stopped exactly once.
    ///
    /// # Errors
    ///
    /// - [`TetherError::InvalidArgument`] if `spec.path` is empty
    /// - [`TetherError::Execution`] if the program cannot be started
    /// - [`TetherError::ResourceExhausted`] if the registry has no free ids;
    ///   the process is killed in that case
    pub async fn spawn(&self, spec: &ProcessSpec) -> TetherResult<SpawnedProcess> {
        if spec.path.is_empty() {
            return Err(TetherError::InvalidArgument(
                "process path is required".to_string(),
            ));
        }

        let mut command = Command::new(&spec.path);
        command
            .args(&spec.args)
            .envs(&spec.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &spec.dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|e| {
            TetherError::Execution(format!("failed to spawn '{}': {}", spec.path, e))
        })?;
        let pid = child.id().unwrap_or_default();

        let (stdout, stderr) = match (child.stdout.take(), child.stderr.take()) {
            (Some(stdout), Some(stderr)) => (stdout, stderr),
            _ => {
                let _ = child.start_kill();
                return Err(TetherError::Execution(format!(
                    "process '{}' has no output pipes",
                    spec.path
                )));
            }
        };

        let (stdout_tx, stdout_rx) = mpsc::channel(self.channel_capacity);
        let (stderr_tx, stderr_rx) = mpsc::channel(self.channel_capacity);

        let stream_id = match self.streamer.stream(stdout_rx, stderr_rx) {
            Ok(id) => id,
            Err(e) => {
                let _ = child.start_kill();
                return Err(e.into());
            }
        };

        let pumps = [
            tokio::spawn(output::pump(output::output_chunks(stdout), stdout_tx)),
            tokio::spawn(output::pump(output::output_chunks(stderr), stderr_tx)),
        ];
        tokio::spawn(supervise(self.streamer.clone(), stream_id, child, pumps));

        info!(
            stream_id = %stream_id,
            pid,
            program = %spec.path,
            "process started"
        );

        Ok(SpawnedProcess { stream_id, pid })
    }
}

/// Wait for the process and its pumps, then stop the stream.
async fn supervise(
    streamer: Streamer,
    stream_id: StreamId,
    mut child: Child,
    pumps: [JoinHandle<usize>; 2],
) {
    match child.wait().await {
        Ok(status) => debug!(stream_id = %stream_id, %status, "process exited"),
        Err(e) => warn!(stream_id = %stream_id, error = %e, "failed to wait for process"),
    }

    let [stdout, stderr] = pumps;
    let stdout_bytes = stdout.await.unwrap_or_default();
    let stderr_bytes = stderr.await.unwrap_or_default();
    debug!(
        stream_id = %stream_id,
        stdout_bytes,
        stderr_bytes,
        "process output complete"
    );

    if let Err(e) = streamer.stop(stream_id) {
        error!(stream_id = %stream_id, error = %e, "stream lifecycle out of sync");
    }
}
