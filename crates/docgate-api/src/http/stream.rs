//! Response construction for the final deliverable.

use axum::body::Body;
use axum::http::{StatusCode, header};
use axum::response::Response;
use docgate_scratch::{StreamedResource, TemporaryResource};
use docgate_telemetry::Metrics;

use crate::http::errors::ApiError;

/// Build the attachment response whose body streams the detached artifact.
/// The file is deleted when the body stream drops, after full delivery or
/// on client disconnect.
pub(crate) async fn attachment(
    deliverable: TemporaryResource,
    metrics: Metrics,
    content_type: &'static str,
    download_name: &str,
) -> Result<Response, ApiError> {
    let stream = StreamedResource::open(deliverable, metrics)
        .await
        .map_err(|err| ApiError::from_scratch(&err))?;
    let length = stream.len();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, length)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{download_name}\""),
        )
        .body(Body::from_stream(stream))
        .map_err(|err| ApiError::internal(format!("failed to build response: {err}")))
}
