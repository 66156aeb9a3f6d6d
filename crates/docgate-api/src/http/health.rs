//! Liveness and diagnostics endpoints.

use std::sync::Arc;

use axum::{Json, body::Body, extract::State, http::StatusCode, response::Response};
use serde::Serialize;
use tracing::error;

use crate::http::errors::ApiError;
use crate::models::WelcomeResponse;
use crate::state::ApiState;

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) status: &'static str,
    pub(crate) scratch: ScratchHealth,
}

#[derive(Serialize)]
pub(crate) struct ScratchHealth {
    pub(crate) status: &'static str,
    pub(crate) tracked_files: i64,
}

/// Liveness payload at the API root.
pub(crate) async fn root() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Welcome to the Docgate conversion API".to_string(),
    })
}

pub(crate) async fn health(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<HealthResponse>, ApiError> {
    let scratch_usable = state.store.root().is_dir();
    if !scratch_usable {
        error!(root = %state.store.root().display(), "scratch root missing");
        return Err(ApiError::service_unavailable(
            "scratch storage is currently unavailable",
        ));
    }
    let snapshot = state.metrics.snapshot();
    Ok(Json(HealthResponse {
        status: "ok",
        scratch: ScratchHealth {
            status: "ok",
            tracked_files: snapshot.scratch_files,
        },
    }))
}

pub(crate) async fn metrics(State(state): State<Arc<ApiState>>) -> Result<Response, ApiError> {
    match state.metrics.render() {
        Ok(body) => Response::builder()
            .status(StatusCode::OK)
            .header(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4",
            )
            .body(Body::from(body))
            .map_err(|err| {
                error!(error = %err, "failed to build metrics response");
                ApiError::internal("failed to build metrics response")
            }),
        Err(err) => {
            error!(error = %err, "failed to render metrics");
            Err(ApiError::internal("failed to render metrics"))
        }
    }
}
