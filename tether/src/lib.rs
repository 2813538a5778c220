//! Tether - attachable output streams for running processes.
//!
//! A process runner registers each spawned process's stdout/stderr with a
//! [`Streamer`] and gets back a [`StreamId`]. HTTP clients later attach to
//! `GET /streams/{id}/stdout` or `/stderr`; the connection is hijacked and
//! receives raw output until the process is done.
//!
//! ```no_run
//! use std::time::Duration;
//! use tether::Streamer;
//! use tokio::sync::mpsc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let streamer = Streamer::new(Duration::from_secs(10));
//! let (stdout_tx, stdout_rx) = mpsc::channel(16);
//! let (_stderr_tx, stderr_rx) = mpsc::channel(16);
//!
//! let id = streamer.stream(stdout_rx, stderr_rx)?;
//! stdout_tx.send(b"hello\n".to_vec()).await?;
//! streamer.stop(id)?;
//!
//! let mut out = Vec::new();
//! streamer.stream_stdout(id, Some(&mut out)).await;
//! assert_eq!(out, b"hello\n");
//! # Ok(())
//! # }
//! ```

pub mod exec;
pub mod runtime;
pub mod server;
pub mod streamer;

pub use exec::{ProcessRunner, ProcessSpec, SpawnedProcess};
pub use runtime::options::{ServerOptions, StreamerOptions};
pub use server::StreamServer;
pub use streamer::{ForwardOutcome, OutputKind, StreamId, Streamer, StreamerError};
pub use tether_shared::{TetherError, TetherResult, Transport};
