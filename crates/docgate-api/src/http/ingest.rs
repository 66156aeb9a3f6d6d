//! Multipart ingestion with pre-write validation.
//!
//! The extension gate runs before any bytes touch scratch storage: a
//! rejected filename leaves nothing behind. Accepted files stream to disk
//! chunk by chunk under the configured size cap; text fields are collected
//! for operation-specific parameter parsing.

use std::collections::HashMap;

use axum::extract::Multipart;
use docgate_scratch::{ResourceRole, ScratchScope, TemporaryResource, split_file_name};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::http::errors::ApiError;

/// Image extensions accepted for edit-operation stamps.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Which multipart fields carry files and what they may contain.
#[derive(Debug, Clone, Copy)]
pub(crate) struct UploadPolicy {
    /// Field name of the primary upload(s) (`file` or `files`).
    pub(crate) primary_field: &'static str,
    /// Extensions accepted for the primary upload(s), lowercase.
    pub(crate) allowed_extensions: &'static [&'static str],
    /// Whether more than one primary upload is accepted.
    pub(crate) allow_multiple: bool,
    /// Whether `image_files` parts are accepted (edit operation).
    pub(crate) accepts_images: bool,
}

/// Everything extracted from one multipart body.
pub(crate) struct IngestedForm {
    /// Primary uploads, in arrival order.
    pub(crate) files: Vec<TemporaryResource>,
    /// Image uploads for the edit operation, in arrival order.
    pub(crate) images: Vec<TemporaryResource>,
    /// Text fields by name.
    pub(crate) fields: HashMap<String, String>,
}

/// Drain the multipart body, materialising uploads through the scope.
///
/// # Errors
///
/// Returns 400 for malformed multipart content, missing filenames, and
/// disallowed extensions; 413 when a file exceeds `max_upload_bytes`.
pub(crate) async fn collect(
    mut multipart: Multipart,
    scope: &ScratchScope,
    policy: UploadPolicy,
    max_upload_bytes: u64,
) -> Result<IngestedForm, ApiError> {
    let mut form = IngestedForm {
        files: Vec::new(),
        images: Vec::new(),
        fields: HashMap::new(),
    };

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::bad_request(format!("Malformed multipart body: {err}")))?
    {
        let Some(name) = field.name().map(ToString::to_string) else {
            continue;
        };

        if name == policy.primary_field || trims_to(&name, policy.primary_field) {
            if !policy.allow_multiple && !form.files.is_empty() {
                return Err(ApiError::bad_request(
                    "Only one file may be uploaded for this operation.",
                ));
            }
            let resource = receive_file(
                &mut field,
                scope,
                policy.allowed_extensions,
                max_upload_bytes,
            )
            .await?;
            form.files.push(resource);
        } else if policy.accepts_images && (name == "image_files" || trims_to(&name, "image_files"))
        {
            let resource =
                receive_file(&mut field, scope, IMAGE_EXTENSIONS, max_upload_bytes).await?;
            form.images.push(resource);
        } else {
            let value = field
                .text()
                .await
                .map_err(|err| ApiError::bad_request(format!("Malformed form field: {err}")))?;
            form.fields.insert(name, value);
        }
    }

    if form.files.is_empty() {
        return Err(ApiError::bad_request("No file uploaded."));
    }

    debug!(
        files = form.files.len(),
        images = form.images.len(),
        fields = form.fields.len(),
        "multipart body ingested"
    );
    Ok(form)
}

/// Clients commonly suffix array fields (`files[]`); accept both spellings.
fn trims_to(name: &str, expected: &str) -> bool {
    name.strip_suffix("[]") == Some(expected)
}

async fn receive_file(
    field: &mut axum::extract::multipart::Field<'_>,
    scope: &ScratchScope,
    allowed_extensions: &[&str],
    max_upload_bytes: u64,
) -> Result<TemporaryResource, ApiError> {
    let file_name = field
        .file_name()
        .map(ToString::to_string)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ApiError::bad_request("Uploaded file is missing a filename."))?;

    // Validate before materialising anything on scratch storage.
    let (stem, extension) = split_file_name(&file_name);
    if !allowed_extensions.contains(&extension.as_str()) {
        return Err(ApiError::bad_request(format!(
            "Invalid file type: '{file_name}'. Allowed: {}.",
            allowed_extensions.join(", ")
        )));
    }

    let resource = scope.create(ResourceRole::Input, &stem, &extension);
    let mut file = tokio::fs::File::create(resource.path())
        .await
        .map_err(|err| {
            tracing::error!(error = %err, "failed to create scratch file");
            ApiError::internal("Failed to persist upload.")
        })?;

    let mut written: u64 = 0;
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|err| ApiError::bad_request(format!("Upload interrupted: {err}")))?
    {
        written += chunk.len() as u64;
        if written > max_upload_bytes {
            return Err(ApiError::payload_too_large(format!(
                "File '{file_name}' exceeds the {max_upload_bytes} byte upload limit."
            )));
        }
        file.write_all(&chunk).await.map_err(|err| {
            tracing::error!(error = %err, "failed to write scratch file");
            ApiError::internal("Failed to persist upload.")
        })?;
    }
    file.flush().await.map_err(|err| {
        tracing::error!(error = %err, "failed to flush scratch file");
        ApiError::internal("Failed to persist upload.")
    })?;

    Ok(resource)
}
