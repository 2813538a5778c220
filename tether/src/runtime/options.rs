//! Configuration for tether.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tether_shared::constants::{network, streaming};
use tether_shared::errors::{TetherError, TetherResult};
use tether_shared::Transport;

// ============================================================================
// Streamer Options
// ============================================================================

/// Stream registry settings. Fixed for the lifetime of a [`crate::Streamer`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamerOptions {
    /// How long a stopped stream stays registered so late consumers can drain it.
    ///
    /// Serialized as milliseconds.
    #[serde(default = "default_grace_time", with = "duration_ms")]
    pub grace_time: Duration,

    /// Size of the stream id space, and so the maximum number of registered streams.
    ///
    /// Ids are drawn from `0..max_streams`. Must be at least 1.
    #[serde(default = "default_max_streams")]
    pub max_streams: u32,
}

fn default_grace_time() -> Duration {
    Duration::from_millis(streaming::DEFAULT_GRACE_TIME_MS)
}

fn default_max_streams() -> u32 {
    u32::MAX
}

impl Default for StreamerOptions {
    fn default() -> Self {
        Self {
            grace_time: default_grace_time(),
            max_streams: default_max_streams(),
        }
    }
}

impl StreamerOptions {
    /// Unbounded id space with the given grace time.
    pub fn with_grace_time(grace_time: Duration) -> Self {
        Self {
            grace_time,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> TetherResult<()> {
        if self.max_streams == 0 {
            return Err(TetherError::Config(
                "max_streams must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Server Options
// ============================================================================

/// Settings for the HTTP server and the process runner behind it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerOptions {
    /// Where to listen.
    #[serde(default = "default_listen")]
    pub listen: Transport,

    #[serde(default)]
    pub streamer: StreamerOptions,

    /// Chunks buffered per output channel of a spawned process.
    ///
    /// A full channel pauses reading from the process pipe until a consumer
    /// catches up.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_listen() -> Transport {
    Transport::from_uri(network::DEFAULT_LISTEN)
        .unwrap_or_else(|_| Transport::tcp(([127, 0, 0, 1], 7777).into()))
}

fn default_channel_capacity() -> usize {
    streaming::DEFAULT_CHANNEL_CAPACITY
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            streamer: StreamerOptions::default(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl ServerOptions {
    pub fn validate(&self) -> TetherResult<()> {
        self.streamer.validate()?;
        if self.channel_capacity == 0 {
            return Err(TetherError::Config(
                "channel_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
