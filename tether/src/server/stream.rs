//! Raw output attach endpoints.
//!
//! `GET /streams/{streamid}/stdout` and `GET /streams/{streamid}/stderr`
//! take over the HTTP/1.1 connection: after `101 Switching Protocols` the
//! connection carries nothing but output bytes and is closed when the
//! stream ends. A client must send `Connection: Upgrade` and an `Upgrade`
//! header; the protocol name is echoed back.

use super::AppState;
use crate::streamer::{OutputKind, StreamId, Streamer};
use axum::extract::{Path, Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use hyper::upgrade::OnUpgrade;
use hyper_util::rt::TokioIo;
use tether_shared::constants::upgrade;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

pub(super) async fn handle_stdout(
    State(state): State<AppState>,
    Path(id): Path<StreamId>,
    request: Request,
) -> Response {
    hijack(state.streamer, id, OutputKind::Stdout, request)
}

pub(super) async fn handle_stderr(
    State(state): State<AppState>,
    Path(id): Path<StreamId>,
    request: Request,
) -> Response {
    hijack(state.streamer, id, OutputKind::Stderr, request)
}

/// Answer with 101 and forward `kind` of `id` over the upgraded connection.
///
/// The registry is only consulted once the connection is upgraded.
fn hijack(streamer: Streamer, id: StreamId, kind: OutputKind, mut request: Request) -> Response {
    let Some(on_upgrade) = request.extensions_mut().remove::<OnUpgrade>() else {
        warn!(stream_id = %id, channel = %kind, "connection cannot be hijacked");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "connection cannot be hijacked",
        )
            .into_response();
    };

    let protocol = request
        .headers()
        .get(header::UPGRADE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(upgrade::PROTOCOL));

    tokio::spawn(async move {
        let upgraded = match on_upgrade.await {
            Ok(upgraded) => upgraded,
            Err(e) => {
                warn!(stream_id = %id, channel = %kind, error = %e, "hijack failed");
                return;
            }
        };

        let mut conn = TokioIo::new(upgraded);
        let outcome = streamer.stream_output(id, kind, Some(&mut conn)).await;
        if let Err(e) = conn.shutdown().await {
            debug!(stream_id = %id, channel = %kind, error = %e, "close after forwarding failed");
        }
        debug!(stream_id = %id, channel = %kind, ?outcome, "hijacked connection closed");
    });

    (
        StatusCode::SWITCHING_PROTOCOLS,
        [
            (header::CONNECTION, HeaderValue::from_static("upgrade")),
            (header::UPGRADE, protocol),
        ],
    )
        .into_response()
}
