//! Request-scoped resource tracking.
//!
//! Every resource created during a request registers here at creation time.
//! The scope is drained (all remaining files deleted) on every exit path:
//! explicitly by the pipeline once the deliverable is detached, and as a
//! backstop when the last handle drops, so validation failures, transform
//! errors, and panics all leave the scratch directory clean.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::warn;
use uuid::Uuid;

use crate::error::{ScratchError, ScratchResult};
use crate::resource::{ResourceRole, TemporaryResource};
use crate::store::ScratchStore;

/// Per-request tracker for scratch resources.
///
/// Cloning shares the same tracked set, so a scope handle can cross into a
/// blocking task; the drain backstop fires when the last clone drops.
#[derive(Clone)]
pub struct ScratchScope {
    inner: Arc<ScopeInner>,
}

struct ScopeInner {
    store: ScratchStore,
    request_id: Uuid,
    tracked: Mutex<Vec<TrackedFile>>,
}

struct TrackedFile {
    id: Uuid,
    path: PathBuf,
}

impl ScratchScope {
    pub(crate) fn new(store: ScratchStore, request_id: Uuid) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                store,
                request_id,
                tracked: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Identifier of the request this scope belongs to.
    #[must_use]
    pub fn request_id(&self) -> Uuid {
        self.inner.request_id
    }

    /// Allocate and register a scratch resource. The file itself comes into
    /// existence when the caller writes bytes to [`TemporaryResource::path`].
    #[must_use]
    pub fn create(&self, role: ResourceRole, stem: &str, extension: &str) -> TemporaryResource {
        let id = Uuid::new_v4();
        let path = self.inner.store.unique_path(id, stem, extension);
        self.inner.lock_tracked().push(TrackedFile {
            id,
            path: path.clone(),
        });
        self.inner.store.metrics().inc_scratch_files();
        TemporaryResource::new(id, path, role, stem.to_string())
    }

    /// Register and write a resource in one step.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes cannot be written; the resource stays
    /// tracked so the drain still removes any partial file.
    pub fn create_with_bytes(
        &self,
        role: ResourceRole,
        stem: &str,
        extension: &str,
        bytes: &[u8],
    ) -> ScratchResult<TemporaryResource> {
        let resource = self.create(role, stem, extension);
        std::fs::write(resource.path(), bytes)
            .map_err(|source| ScratchError::io("scope.write", resource.path(), source))?;
        Ok(resource)
    }

    /// Release one resource immediately, deleting its file.
    ///
    /// Used for superseded intermediates (e.g. per-page files already folded
    /// into an archive); missing files are tolerated.
    pub fn release(&self, resource: TemporaryResource) {
        let (id, path) = resource.into_parts();
        self.forget(id);
        delete_file(&path, self.inner.store.metrics());
    }

    /// Detach the final deliverable from the scope without deleting it.
    ///
    /// The caller takes over the release obligation, normally by wrapping the
    /// resource in a [`crate::StreamedResource`] whose drop deletes the file
    /// after the response body has been sent.
    #[must_use]
    pub fn detach(&self, resource: TemporaryResource) -> TemporaryResource {
        self.forget(resource.id());
        resource
    }

    /// Delete every still-tracked file. Invoked on all exit paths; calling it
    /// more than once is harmless.
    pub fn drain(&self) {
        self.inner.drain();
    }

    /// Number of resources currently tracked. Exposed for tests and health
    /// reporting.
    #[must_use]
    pub fn tracked_len(&self) -> usize {
        self.inner.lock_tracked().len()
    }

    fn forget(&self, id: Uuid) {
        self.inner.lock_tracked().retain(|entry| entry.id != id);
    }
}

impl ScopeInner {
    fn drain(&self) {
        let drained: Vec<TrackedFile> = std::mem::take(&mut *self.lock_tracked());
        for entry in drained {
            delete_file(&entry.path, self.store.metrics());
        }
    }

    fn lock_tracked(&self) -> MutexGuard<'_, Vec<TrackedFile>> {
        match self.tracked.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("scratch scope mutex poisoned; continuing with recovered guard");
                poisoned.into_inner()
            }
        }
    }
}

impl Drop for ScopeInner {
    fn drop(&mut self) {
        self.drain();
    }
}

fn delete_file(path: &Path, metrics: &docgate_telemetry::Metrics) {
    match std::fs::remove_file(path) {
        Ok(()) => metrics.dec_scratch_files(),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            // Allocated but never written, or already released.
            metrics.dec_scratch_files();
        }
        Err(err) => {
            warn!(error = %err, path = %path.display(), "failed to remove scratch file");
        }
    }
}
