//! The generic conversion pipeline.
//!
//! One request walks Received → Validated → Processing → Packaged →
//! Streaming → Cleaned, with a terminal Failed reachable from any step.
//! Failure runs exactly the same drain obligations as success: the scope is
//! drained on both paths, and only the detached deliverable survives into
//! the response stream, guarded by its own drop-time deletion.

use std::sync::Arc;

use axum::extract::Multipart;
use axum::response::Response;
use docgate_scratch::TemporaryResource;
use docgate_telemetry::Metrics;
use docgate_transform::{
    EditInstructionSet, OperationKind, OperationParams, OperationRequest, TransformError, package,
};
use tracing::{debug, info};

use crate::http::errors::ApiError;
use crate::http::ingest::{self, IngestedForm, UploadPolicy};
use crate::http::stream;
use crate::state::ApiState;

/// Per-operation pipeline configuration; handlers reduce to one of these.
#[derive(Debug, Clone, Copy)]
pub(crate) struct OperationDescriptor {
    pub(crate) kind: OperationKind,
    pub(crate) upload: UploadPolicy,
}

/// Upload policy for each operation of the closed set.
pub(crate) const fn descriptor(kind: OperationKind) -> OperationDescriptor {
    let upload = match kind {
        OperationKind::Merge => UploadPolicy {
            primary_field: "files",
            allowed_extensions: &["pdf"],
            allow_multiple: true,
            accepts_images: false,
        },
        OperationKind::Edit => UploadPolicy {
            primary_field: "file",
            allowed_extensions: &["pdf"],
            allow_multiple: false,
            accepts_images: true,
        },
        OperationKind::WordToPdf => UploadPolicy {
            primary_field: "file",
            allowed_extensions: &["docx"],
            allow_multiple: false,
            accepts_images: false,
        },
        OperationKind::ExcelToPdf => UploadPolicy {
            primary_field: "file",
            allowed_extensions: &["xlsx", "xls"],
            allow_multiple: false,
            accepts_images: false,
        },
        OperationKind::PptxToPdf => UploadPolicy {
            primary_field: "file",
            allowed_extensions: &["pptx"],
            allow_multiple: false,
            accepts_images: false,
        },
        _ => UploadPolicy {
            primary_field: "file",
            allowed_extensions: &["pdf"],
            allow_multiple: false,
            accepts_images: false,
        },
    };
    OperationDescriptor { kind, upload }
}

/// Run the full pipeline for one request.
pub(crate) async fn run(
    state: &Arc<ApiState>,
    kind: OperationKind,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let scope = state.store.begin_scope();
    info!(
        operation = kind.as_str(),
        request_id = %scope.request_id(),
        "pipeline started"
    );

    let outcome = execute(state, &scope, kind, multipart).await;

    // Inputs and surviving intermediates are released here on every exit
    // path; the deliverable was detached and is owned by the response body.
    scope.drain();

    match &outcome {
        Ok(_) => {
            state.metrics.inc_pipeline_step("cleaned", "completed");
            state.metrics.inc_operation(kind.as_str(), "success");
        }
        Err(error) => {
            state.metrics.inc_pipeline_step("cleaned", "completed");
            let outcome_label = if error.status().is_client_error() {
                "rejected"
            } else {
                "failed"
            };
            state.metrics.inc_operation(kind.as_str(), outcome_label);
        }
    }
    outcome
}

async fn execute(
    state: &Arc<ApiState>,
    scope: &docgate_scratch::ScratchScope,
    kind: OperationKind,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let OperationDescriptor { kind, upload } = descriptor(kind);
    let metrics = &state.metrics;

    let form = step(
        metrics,
        "ingest",
        ingest::collect(
            multipart,
            scope,
            upload,
            state.config.scratch.max_upload_bytes,
        )
        .await,
    )?;

    let params = step(metrics, "validate", parse_params(kind, &form))?;
    let primary_stem = form.files[0].stem().to_string();

    let request = OperationRequest {
        kind,
        inputs: form.files,
        image_inputs: form.images,
        params,
    };

    let dispatcher = state.dispatcher.clone();
    let blocking_scope = scope.clone();
    let blocking_metrics = state.metrics.clone();
    let bundle_stem = archive_stem(kind, &primary_stem);
    // Document work is CPU-bound and synchronous; keep it off the async
    // workers.
    let processed = tokio::task::spawn_blocking(
        move || -> Result<TemporaryResource, TransformError> {
            let artifacts = dispatcher.dispatch(&blocking_scope, request)?;
            let deliverable = package(&blocking_scope, artifacts, &bundle_stem)?;
            blocking_metrics.inc_pipeline_step("package", "completed");
            Ok(deliverable)
        },
    )
    .await
    .map_err(|err| ApiError::internal(format!("transform task failed: {err}")));

    let deliverable = step(
        metrics,
        "process",
        processed.and_then(|inner| inner.map_err(ApiError::from_transform)),
    )?;

    let deliverable = scope.detach(deliverable);
    let download_name = download_file_name(&deliverable);
    let content_type = content_type_for(&deliverable);
    debug!(
        artifact = %deliverable.path().display(),
        download_name,
        "streaming deliverable"
    );

    step(
        metrics,
        "stream",
        stream::attachment(
            deliverable,
            state.metrics.clone(),
            content_type,
            &download_name,
        )
        .await,
    )
}

fn step<T>(metrics: &Metrics, name: &'static str, result: Result<T, ApiError>) -> Result<T, ApiError> {
    match &result {
        Ok(_) => metrics.inc_pipeline_step(name, "completed"),
        Err(_) => metrics.inc_pipeline_step(name, "failed"),
    }
    result
}

fn parse_params(kind: OperationKind, form: &IngestedForm) -> Result<OperationParams, ApiError> {
    match kind {
        OperationKind::Split => {
            let pages = form
                .fields
                .get("pages")
                .ok_or_else(|| ApiError::bad_request("Page range is required."))?
                .clone();
            let merge = match form.fields.get("merge").map(String::as_str) {
                None => true,
                Some(value) => parse_bool(value)
                    .ok_or_else(|| ApiError::bad_request("Invalid value for 'merge'."))?,
            };
            Ok(OperationParams::Split { pages, merge })
        }
        OperationKind::Protect => {
            let password = form
                .fields
                .get("password")
                .ok_or_else(|| ApiError::bad_request("Password is required."))?
                .clone();
            Ok(OperationParams::Protect { password })
        }
        OperationKind::Edit => {
            let raw = form
                .fields
                .get("edits")
                .ok_or_else(|| ApiError::unprocessable("Missing 'edits' field."))?;
            let edits: EditInstructionSet = serde_json::from_str(raw)
                .map_err(|err| ApiError::unprocessable(format!("Invalid JSON in 'edits' field: {err}")))?;
            Ok(OperationParams::Edit { edits })
        }
        _ => Ok(OperationParams::None),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Stem of the ZIP bundle when an operation yields several artifacts.
fn archive_stem(kind: OperationKind, primary_stem: &str) -> String {
    match kind {
        OperationKind::Split => format!("split_{primary_stem}"),
        OperationKind::PdfToJpg => format!("{primary_stem}_images"),
        _ => format!("{primary_stem}_bundle"),
    }
}

fn download_file_name(deliverable: &TemporaryResource) -> String {
    deliverable
        .path()
        .extension()
        .and_then(|ext| ext.to_str())
        .map_or_else(
            || deliverable.stem().to_string(),
            |ext| format!("{}.{ext}", deliverable.stem()),
        )
}

fn content_type_for(deliverable: &TemporaryResource) -> &'static str {
    match deliverable
        .path()
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
    {
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "jpg" | "jpeg" => "image/jpeg",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        _ => "application/octet-stream",
    }
}
