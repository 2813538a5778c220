//! HTTP server.
//!
//! Routes:
//! - `GET /ping`: liveness
//! - `POST /processes`: start a process, returns its stream id
//! - `GET /streams/{streamid}/stdout`, `GET /streams/{streamid}/stderr`:
//!   hijack the connection and forward raw output

mod process;
mod stream;

use crate::exec::ProcessRunner;
use crate::runtime::options::ServerOptions;
use crate::streamer::Streamer;
use axum::routing::{get, post};
use axum::Router;
use std::future::Future;
use tether_shared::constants::routes;
use tether_shared::errors::{TetherError, TetherResult};
use tether_shared::Transport;
use tracing::{info, warn};

/// State shared by all handlers.
#[derive(Clone)]
pub(crate) struct AppState {
    pub streamer: Streamer,
    pub runner: ProcessRunner,
}

/// The tether HTTP server.
///
/// Owns the stream registry for its lifetime and hands clones of it to the
/// process runner and the request handlers.
pub struct StreamServer {
    options: ServerOptions,
    streamer: Streamer,
    runner: ProcessRunner,
}

impl StreamServer {
    pub fn new(options: ServerOptions) -> TetherResult<Self> {
        options.validate()?;
        let streamer = Streamer::with_options(options.streamer.clone())?;
        let runner = ProcessRunner::new(streamer.clone(), options.channel_capacity);

        Ok(Self {
            options,
            streamer,
            runner,
        })
    }

    pub fn options(&self) -> &ServerOptions {
        &self.options
    }

    pub fn streamer(&self) -> &Streamer {
        &self.streamer
    }

    pub fn runner(&self) -> &ProcessRunner {
        &self.runner
    }

    /// Build the router. Can be served on any listener, or driven directly in tests.
    pub fn router(&self) -> Router {
        Router::new()
            .route(routes::PING, get(process::ping))
            .route(routes::PROCESSES, post(process::create_process))
            .route(routes::STREAM_STDOUT, get(stream::handle_stdout))
            .route(routes::STREAM_STDERR, get(stream::handle_stderr))
            .with_state(AppState {
                streamer: self.streamer.clone(),
                runner: self.runner.clone(),
            })
    }

    /// Serve on the configured transport until Ctrl-C.
    pub async fn run(self) -> TetherResult<()> {
        self.run_until(shutdown_signal()).await
    }

    /// Serve on the configured transport until `shutdown` resolves.
    ///
    /// Connections already hijacked keep forwarding after shutdown; they end
    /// with their streams.
    pub async fn run_until<F>(self, shutdown: F) -> TetherResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();

        match &self.options.listen {
            Transport::Tcp { addr } => {
                info!("Binding to TCP address: {}", addr);
                let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
                    TetherError::Network(format!("failed to bind {}: {}", addr, e))
                })?;
                info!("Listening on tcp://{}", listener.local_addr()?);

                axum::serve(listener, app)
                    .with_graceful_shutdown(shutdown)
                    .await
                    .map_err(|e| TetherError::Network(format!("server error: {}", e)))?;
            }

            Transport::Unix { socket_path } => {
                // Remove a stale socket from a previous run
                if socket_path.exists() {
                    std::fs::remove_file(socket_path)?;
                }
                if let Some(parent) = socket_path.parent() {
                    std::fs::create_dir_all(parent)?;
                }

                info!("Binding to Unix socket: {}", socket_path.display());
                let listener = tokio::net::UnixListener::bind(socket_path).map_err(|e| {
                    TetherError::Network(format!(
                        "failed to bind {}: {}",
                        socket_path.display(),
                        e
                    ))
                })?;
                info!("Listening on unix://{}", socket_path.display());

                axum::serve(listener, app)
                    .with_graceful_shutdown(shutdown)
                    .await
                    .map_err(|e| TetherError::Network(format!("server error: {}", e)))?;
            }
        }

        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
