//! RFC9457-style API error wrapper and transform-error mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use docgate_scratch::ScratchError;
use docgate_transform::TransformError;

use crate::models::ProblemDetails;

const PROBLEM_BAD_REQUEST: &str = "about:blank#bad-request";
const PROBLEM_UNPROCESSABLE: &str = "about:blank#unprocessable";
const PROBLEM_TOO_LARGE: &str = "about:blank#payload-too-large";
const PROBLEM_INTERNAL: &str = "about:blank#internal";
const PROBLEM_SERVICE_UNAVAILABLE: &str = "about:blank#service-unavailable";

/// Structured API error mapped onto a problem document.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    title: &'static str,
    detail: Option<String>,
}

impl ApiError {
    const fn new(status: StatusCode, kind: &'static str, title: &'static str) -> Self {
        Self {
            status,
            kind,
            title,
            detail: None,
        }
    }

    #[must_use]
    pub(crate) fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// 400 for invalid uploads and parameters.
    pub(crate) fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, PROBLEM_BAD_REQUEST, "bad request")
            .with_detail(detail)
    }

    /// 422 for structurally malformed parameter payloads.
    pub(crate) fn unprocessable(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            PROBLEM_UNPROCESSABLE,
            "unprocessable content",
        )
        .with_detail(detail)
    }

    /// 413 for uploads beyond the configured cap.
    pub(crate) fn payload_too_large(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            PROBLEM_TOO_LARGE,
            "payload too large",
        )
        .with_detail(detail)
    }

    /// 500 for unexpected processing failures.
    pub(crate) fn internal(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            PROBLEM_INTERNAL,
            "internal server error",
        )
        .with_detail(detail)
    }

    /// 503 when a dependency (scratch storage) is unusable.
    pub(crate) fn service_unavailable(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            PROBLEM_SERVICE_UNAVAILABLE,
            "service unavailable",
        )
        .with_detail(detail)
    }

    /// Status code carried by this error; used by the pipeline metrics.
    #[must_use]
    pub(crate) const fn status(&self) -> StatusCode {
        self.status
    }

    /// Map a transform failure onto the HTTP taxonomy: validation errors
    /// become 400s with client-actionable messages, collaborator failures
    /// become 500s.
    pub(crate) fn from_transform(error: TransformError) -> Self {
        if error.is_validation() {
            return Self::bad_request(validation_message(&error));
        }
        tracing::error!(error = %error, "transform failed");
        Self::internal(failure_message(&error))
    }

    pub(crate) fn from_scratch(error: &ScratchError) -> Self {
        tracing::error!(error = %error, "scratch storage failed");
        Self::internal("scratch storage failure")
    }
}

fn validation_message(error: &TransformError) -> String {
    match error {
        TransformError::NoPagesSelected => "No valid pages selected.".to_string(),
        TransformError::InvalidParameter { field, reason, value } => match (*field, *reason) {
            ("password", "too_short") => {
                "Password must be at least 4 characters long.".to_string()
            }
            ("password", "missing") => "Password is required.".to_string(),
            ("pages", "missing") => "Page range is required.".to_string(),
            ("pages", "page_out_of_range") => value.as_ref().map_or_else(
                || "Page range references pages outside the document.".to_string(),
                |v| format!("Page range '{v}' references pages outside the document."),
            ),
            ("pages", _) => value.as_ref().map_or_else(
                || "Invalid page range format.".to_string(),
                |v| format!("Invalid page range format: '{v}'."),
            ),
            ("edits", _) => "Edit instructions reference content outside the document.".to_string(),
            ("file" | "files", "missing") => "No file uploaded.".to_string(),
            _ => format!("Invalid parameter: {field}."),
        },
        other => other.to_string(),
    }
}

fn failure_message(error: &TransformError) -> String {
    match error {
        TransformError::Pdf { operation, source } => {
            format!("Processing failed during {operation}: {source}")
        }
        TransformError::Raster { operation, detail } => {
            format!("Processing failed during {operation}: {detail}")
        }
        TransformError::Extract { operation, detail }
        | TransformError::Workbook { operation, detail } => {
            format!("Processing failed during {operation}: {detail}")
        }
        TransformError::OutputNotProduced { operation, .. } => {
            format!("The {operation} step reported success but produced no output file.")
        }
        TransformError::EmptyResult { operation } => {
            format!("The {operation} step produced no artifacts.")
        }
        other => format!("Processing failed: {other}"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ProblemDetails {
            kind: self.kind.to_string(),
            title: self.title.to_string(),
            status: self.status.as_u16(),
            detail: self.detail,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_map_to_bad_request() {
        let error = TransformError::NoPagesSelected;
        let api = ApiError::from_transform(error);
        assert_eq!(api.status(), StatusCode::BAD_REQUEST);
        assert_eq!(api.detail.as_deref(), Some("No valid pages selected."));
    }

    #[test]
    fn collaborator_errors_map_to_internal() {
        let error = TransformError::EmptyResult { operation: "compress" };
        let api = ApiError::from_transform(error);
        assert_eq!(api.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
