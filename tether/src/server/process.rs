//! Process creation and liveness endpoints.

use super::AppState;
use crate::exec::{ProcessSpec, SpawnedProcess};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tether_shared::errors::TetherError;
use tracing::warn;

pub(super) async fn ping() -> StatusCode {
    StatusCode::OK
}

/// `POST /processes`: start a process and return the stream id for its output.
pub(super) async fn create_process(
    State(state): State<AppState>,
    Json(spec): Json<ProcessSpec>,
) -> Result<Json<SpawnedProcess>, ApiError> {
    let spawned = state.runner.spawn(&spec).await.map_err(|e| {
        warn!(program = %spec.path, error = %e, "process creation failed");
        ApiError(e)
    })?;
    Ok(Json(spawned))
}

/// [`TetherError`] rendered as a JSON error body.
pub(crate) struct ApiError(pub TetherError);

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            TetherError::InvalidArgument(_) | TetherError::Json(_) => StatusCode::BAD_REQUEST,
            TetherError::NotFound(_) => StatusCode::NOT_FOUND,
            TetherError::ResourceExhausted(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.0.to_string() });
        (self.status(), Json(body)).into_response()
    }
}
