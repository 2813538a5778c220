//! Contract violations reported by the stream registry.
//!
//! Every variant means the caller's own bookkeeping is broken: a process
//! runner that stops a stream twice, stops an id it never received, or
//! leaks so many streams that the id space is full. None of them are
//! transient; retrying will not help.

use super::id::StreamId;
use tether_shared::errors::TetherError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamerError {
    /// `stop` was called for an id that is not registered.
    #[error("invalid stream ID {0}")]
    UnknownStream(StreamId),

    /// `stop` was called a second time for the same stream.
    #[error("stream {0} was already stopped")]
    AlreadyStopped(StreamId),

    /// Every id in the configured space belongs to a registered stream.
    #[error("number of streams cannot exceed the maximum allowed ({max_streams})")]
    CapacityExhausted { max_streams: u32 },
}

impl From<StreamerError> for TetherError {
    fn from(err: StreamerError) -> Self {
        match err {
            StreamerError::CapacityExhausted { .. } => {
                TetherError::ResourceExhausted(err.to_string())
            }
            StreamerError::UnknownStream(_) | StreamerError::AlreadyStopped(_) => {
                TetherError::InvalidArgument(err.to_string())
            }
        }
    }
}
