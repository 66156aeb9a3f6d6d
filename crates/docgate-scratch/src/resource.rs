//! The tracked scratch-file handle.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Logical role of a scratch file within one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceRole {
    /// An uploaded file persisted for the transform to read.
    Input,
    /// A transform by-product superseded before the response (e.g. a
    /// per-page file folded into an archive).
    Intermediate,
    /// The final deliverable streamed back to the caller.
    Output,
}

impl ResourceRole {
    /// Render the role as its lowercase string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Intermediate => "intermediate",
            Self::Output => "output",
        }
    }
}

/// One file materialised on scratch storage for the duration of a request.
///
/// Resources are created only through a [`crate::ScratchScope`], which owns
/// the release obligation; this type is deliberately not `Clone` so a file
/// cannot be released twice through two handles.
#[derive(Debug)]
pub struct TemporaryResource {
    id: Uuid,
    path: PathBuf,
    role: ResourceRole,
    stem: String,
    created_at: DateTime<Utc>,
}

impl TemporaryResource {
    pub(crate) fn new(id: Uuid, path: PathBuf, role: ResourceRole, stem: String) -> Self {
        Self {
            id,
            path,
            role,
            stem,
            created_at: Utc::now(),
        }
    }

    /// Unique identifier for this resource within the scratch namespace.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Absolute scratch path of the file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Logical role of the file.
    #[must_use]
    pub const fn role(&self) -> ResourceRole {
        self.role
    }

    /// Sanitized stem derived from the client-supplied name.
    #[must_use]
    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// Creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Base filename of the scratch file (unique component included).
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub(crate) fn into_parts(self) -> (Uuid, PathBuf) {
        (self.id, self.path)
    }
}
