//! Shared HTTP DTOs for the public API.

use serde::{Deserialize, Serialize};

/// RFC9457-compatible problem document surfaced on validation/runtime
/// errors. The `detail` member carries the human-readable message clients
/// display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProblemDetails {
    /// Problem type identifier.
    #[serde(rename = "type")]
    pub kind: String,
    /// Short, human-readable summary of the problem type.
    pub title: String,
    /// HTTP status code.
    pub status: u16,
    /// Occurrence-specific explanation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Liveness payload served at the API root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeResponse {
    /// Greeting message.
    pub message: String,
}
