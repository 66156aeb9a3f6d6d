//! Typed configuration models.
//!
//! # Design
//! - Pure data carriers; environment parsing lives in `loader.rs`.
//! - Every profile carries its defaults so partial environments stay valid.

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Complete configuration assembled at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Listener settings for the HTTP API.
    pub app: AppProfile,
    /// Scratch-storage settings.
    pub scratch: ScratchPolicy,
    /// Pipeline behavior knobs.
    pub pipeline: PipelinePolicy,
    /// Logging/telemetry settings.
    pub telemetry: TelemetryProfile,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app: AppProfile::default(),
            scratch: ScratchPolicy::default(),
            pipeline: PipelinePolicy::default(),
            telemetry: TelemetryProfile::default(),
        }
    }
}

/// Listener settings for the HTTP API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppProfile {
    /// IP address (and interface) the API server should bind to.
    pub bind_addr: IpAddr,
    /// HTTP port the API server should bind to.
    pub http_port: u16,
    /// Origin allowed by the CORS layer.
    pub cors_origin: String,
}

impl Default for AppProfile {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
            http_port: 8000,
            cors_origin: "http://localhost:3000".to_string(),
        }
    }
}

/// Scratch-storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScratchPolicy {
    /// Directory that holds every temporary file the gateway materialises.
    pub root: PathBuf,
    /// Upper bound on a single uploaded file, in bytes.
    pub max_upload_bytes: u64,
}

impl Default for ScratchPolicy {
    fn default() -> Self {
        Self {
            root: PathBuf::from("scratch"),
            max_upload_bytes: 100 * 1024 * 1024,
        }
    }
}

/// Pipeline behavior knobs shared by every operation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PipelinePolicy {
    /// When set, out-of-range split tokens and edit page indices become
    /// validation errors instead of silent no-ops.
    pub strict_bounds: bool,
    /// Raster scale applied when recompressing a PDF (1.0 = 72 dpi).
    pub compress_scale: f32,
    /// JPEG quality used when recompressing a PDF (0-100).
    pub compress_jpeg_quality: u8,
    /// Raster scale applied when exporting pages as images.
    pub export_scale: f32,
    /// JPEG quality used when exporting pages as images (0-100).
    pub export_jpeg_quality: u8,
}

impl Default for PipelinePolicy {
    fn default() -> Self {
        Self {
            strict_bounds: false,
            compress_scale: 1.0,
            compress_jpeg_quality: 70,
            export_scale: 3.0,
            export_jpeg_quality: 95,
        }
    }
}

/// Logging/telemetry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryProfile {
    /// Log level used when `RUST_LOG` is absent.
    pub log_level: String,
    /// Output style for the tracing subscriber.
    pub log_style: LogStyle,
}

impl Default for TelemetryProfile {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_style: LogStyle::Infer,
        }
    }
}

/// Output style for the tracing subscriber.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogStyle {
    /// Structured JSON objects.
    Json,
    /// Human-readable output.
    Pretty,
    /// Pretty in debug builds, JSON otherwise.
    Infer,
}

impl LogStyle {
    /// Render the style as its lowercase string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
            Self::Infer => "infer",
        }
    }
}
