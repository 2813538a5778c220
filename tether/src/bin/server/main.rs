//! Entry point for the tether server.

use clap::Parser;
use std::time::Duration;
use tether::{ServerOptions, StreamServer, StreamerOptions, TetherResult, Transport};
use tether_shared::constants::{network, streaming};
use tracing::info;

/// Tether Server - attachable stdout/stderr streams for spawned processes
#[derive(Parser, Debug)]
#[command(author, version, about = "Tether Server - attachable process output streams")]
struct ServerArgs {
    /// Listen URI
    ///
    /// Examples:
    ///   --listen tcp://127.0.0.1:7777
    ///   --listen unix:///run/tether.sock
    #[arg(short, long, env = "TETHER_LISTEN", default_value = network::DEFAULT_LISTEN)]
    listen: Transport,

    /// How long a finished process's output stays attachable, in milliseconds
    #[arg(long, env = "TETHER_GRACE_TIME_MS", default_value_t = streaming::DEFAULT_GRACE_TIME_MS)]
    grace_time_ms: u64,

    /// Maximum number of streams registered at once
    #[arg(long, env = "TETHER_MAX_STREAMS", default_value_t = u32::MAX)]
    max_streams: u32,

    /// Output chunks buffered per channel before reading from a process pauses
    #[arg(long, env = "TETHER_CHANNEL_CAPACITY", default_value_t = streaming::DEFAULT_CHANNEL_CAPACITY)]
    channel_capacity: usize,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl ServerArgs {
    fn options(&self) -> ServerOptions {
        ServerOptions {
            listen: self.listen.clone(),
            streamer: StreamerOptions {
                grace_time: Duration::from_millis(self.grace_time_ms),
                max_streams: self.max_streams,
            },
            channel_capacity: self.channel_capacity,
        }
    }
}

#[tokio::main]
async fn main() -> TetherResult<()> {
    let args = ServerArgs::parse();

    // Initialize tracing subscriber - respects RUST_LOG env var
    if let Err(e) = tracing_subscriber::fmt()
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level)),
        )
        .try_init()
    {
        eprintln!("[ERROR] Failed to initialize tracing: {}", e);
    }

    info!("Tether server starting");

    let options = args.options();
    info!(
        listen = %options.listen,
        grace_time = ?options.streamer.grace_time,
        max_streams = options.streamer.max_streams,
        "Configuration loaded"
    );

    let server = StreamServer::new(options)?;
    server.run().await
}
