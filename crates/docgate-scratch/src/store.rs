//! Injected scratch-storage root.
//!
//! The store is constructed once per process and passed explicitly to the
//! pipelines; there is no global directory state. Unique paths always carry
//! a per-resource UUID component so concurrent requests uploading files with
//! identical names can never collide.

use std::fs;
use std::path::{Path, PathBuf};

use docgate_telemetry::Metrics;
use uuid::Uuid;

use crate::error::{ScratchError, ScratchResult};
use crate::scope::ScratchScope;

/// Process-wide handle to the scratch directory.
#[derive(Clone)]
pub struct ScratchStore {
    root: PathBuf,
    metrics: Metrics,
}

impl ScratchStore {
    /// Open (creating if necessary) the scratch directory at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or is shadowed by
    /// a non-directory entry.
    pub fn open(root: impl Into<PathBuf>, metrics: Metrics) -> ScratchResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .map_err(|source| ScratchError::io("store.create_root", &root, source))?;
        if !root.is_dir() {
            return Err(ScratchError::RootUnusable {
                path: root,
                reason: "not_a_directory",
            });
        }
        Ok(Self { root, metrics })
    }

    /// The scratch directory this store writes into.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Begin a request-scoped resource tracker.
    #[must_use]
    pub fn begin_scope(&self) -> ScratchScope {
        ScratchScope::new(self.clone(), Uuid::new_v4())
    }

    /// Allocate a unique scratch path for a resource with the given stem and
    /// extension. The UUID component guarantees uniqueness regardless of the
    /// client-supplied name.
    #[must_use]
    pub(crate) fn unique_path(&self, id: Uuid, stem: &str, extension: &str) -> PathBuf {
        let file_name = if extension.is_empty() {
            format!("{id}_{stem}")
        } else {
            format!("{id}_{stem}.{extension}")
        };
        self.root.join(file_name)
    }

    pub(crate) fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::TempDir;

    #[test]
    fn open_creates_missing_root() -> Result<()> {
        let dir = TempDir::new()?;
        let root = dir.path().join("nested").join("scratch");
        let store = ScratchStore::open(&root, Metrics::new()?)?;
        assert!(store.root().is_dir());
        Ok(())
    }

    #[test]
    fn unique_paths_differ_for_identical_stems() -> Result<()> {
        let dir = TempDir::new()?;
        let store = ScratchStore::open(dir.path(), Metrics::new()?)?;
        let first = store.unique_path(Uuid::new_v4(), "input", "pdf");
        let second = store.unique_path(Uuid::new_v4(), "input", "pdf");
        assert_ne!(first, second);
        Ok(())
    }
}
