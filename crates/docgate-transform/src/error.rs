//! # Design
//!
//! - Structured, constant-message errors for every transform capability.
//! - Capture the operation identifier so a failure names the collaborator
//!   call that produced it.
//! - Preserve source errors where the collaborator exposes a typed error;
//!   collaborators with unwieldy error types surface a rendered detail
//!   string instead.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for transform operations.
pub type TransformResult<T> = Result<T, TransformError>;

/// Errors produced by the transform layer.
#[derive(Debug, Error)]
pub enum TransformError {
    /// An operation-specific parameter failed validation.
    #[error("invalid parameter")]
    InvalidParameter {
        /// Parameter that failed validation.
        field: &'static str,
        /// Static reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
    /// A page-range expression selected no pages after bounds filtering.
    #[error("no pages selected")]
    NoPagesSelected,
    /// A transform completed without yielding any artifact.
    #[error("transform produced no artifacts")]
    EmptyResult {
        /// Operation that produced nothing.
        operation: &'static str,
    },
    /// A transform reported success but its output is missing on scratch storage.
    #[error("transform output missing on scratch storage")]
    OutputNotProduced {
        /// Operation that claimed success.
        operation: &'static str,
        /// Path that should have existed.
        path: PathBuf,
    },
    /// PDF document manipulation failed.
    #[error("pdf operation failed")]
    Pdf {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// Underlying lopdf error.
        source: lopdf::Error,
    },
    /// Page rasterisation failed.
    #[error("rasterisation failed")]
    Raster {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// Rendered failure detail from the rasteriser.
        detail: String,
    },
    /// Image decoding or encoding failed.
    #[error("image operation failed")]
    Image {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// Underlying image error.
        source: image::ImageError,
    },
    /// PDF text extraction failed.
    #[error("text extraction failed")]
    Extract {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// Rendered failure detail from the extractor.
        detail: String,
    },
    /// Workbook parsing failed.
    #[error("workbook parsing failed")]
    Workbook {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// Rendered failure detail from the reader.
        detail: String,
    },
    /// OOXML parsing failed.
    #[error("document xml parsing failed")]
    Xml {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// Underlying XML error.
        source: quick_xml::Error,
    },
    /// Archive reading or writing failed.
    #[error("archive operation failed")]
    Zip {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// Underlying zip error.
        source: zip::result::ZipError,
    },
    /// IO failure while reading inputs or writing artifacts.
    #[error("transform io failure")]
    Io {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Scratch-storage failure while materialising artifacts.
    #[error("scratch storage failure")]
    Scratch {
        /// Underlying scratch error.
        #[from]
        source: docgate_scratch::ScratchError,
    },
}

impl TransformError {
    pub(crate) const fn parameter(field: &'static str, reason: &'static str) -> Self {
        Self::InvalidParameter {
            field,
            reason,
            value: None,
        }
    }

    pub(crate) fn parameter_value(
        field: &'static str,
        reason: &'static str,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            field,
            reason,
            value: Some(value.into()),
        }
    }

    pub(crate) fn pdf(operation: &'static str, source: lopdf::Error) -> Self {
        Self::Pdf { operation, source }
    }

    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn raster(operation: &'static str, detail: impl Into<String>) -> Self {
        Self::Raster {
            operation,
            detail: detail.into(),
        }
    }

    pub(crate) fn image(operation: &'static str, source: image::ImageError) -> Self {
        Self::Image { operation, source }
    }

    pub(crate) fn zip(operation: &'static str, source: zip::result::ZipError) -> Self {
        Self::Zip { operation, source }
    }

    pub(crate) fn xml(operation: &'static str, source: quick_xml::Error) -> Self {
        Self::Xml { operation, source }
    }

    /// Whether the error stems from request validation rather than a failed
    /// collaborator. The HTTP layer maps validation errors to 4xx statuses.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidParameter { .. } | Self::NoPagesSelected
        )
    }
}
