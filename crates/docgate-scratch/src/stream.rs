//! Drop-guarded response body for the final deliverable.
//!
//! The streamed artifact cannot be deleted with the rest of the scope: the
//! transport still needs to read it while the response body goes out. The
//! guard here ties deletion to the stream's lifetime instead: the file is
//! removed when the stream is dropped, which happens after the last chunk is
//! delivered and equally when the client disconnects mid-transfer.

use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use docgate_telemetry::Metrics;
use futures_core::Stream;
use tokio::fs::File;
use tokio::io::{AsyncRead, ReadBuf};
use tracing::warn;

use crate::error::{ScratchError, ScratchResult};
use crate::resource::TemporaryResource;

const CHUNK_SIZE: usize = 64 * 1024;

/// Chunked byte stream over a detached scratch resource.
///
/// Dropping the stream deletes the underlying file.
pub struct StreamedResource {
    file: Option<File>,
    buf: Vec<u8>,
    _guard: CleanupGuard,
    len: u64,
}

impl StreamedResource {
    /// Open the detached resource for streaming.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or its metadata read;
    /// the file is deleted on that path too (the guard is constructed first).
    pub async fn open(resource: TemporaryResource, metrics: Metrics) -> ScratchResult<Self> {
        let (_, path) = resource.into_parts();
        let guard = CleanupGuard {
            path: path.clone(),
            metrics,
        };
        let file = File::open(&path)
            .await
            .map_err(|source| ScratchError::io("stream.open", &path, source))?;
        let len = file
            .metadata()
            .await
            .map_err(|source| ScratchError::io("stream.metadata", &path, source))?
            .len();
        Ok(Self {
            file: Some(file),
            buf: vec![0; CHUNK_SIZE],
            _guard: guard,
            len,
        })
    }

    /// Total size of the artifact in bytes, for the `Content-Length` header.
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.len
    }

    /// Whether the artifact is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Stream for StreamedResource {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let Some(file) = this.file.as_mut() else {
            return Poll::Ready(None);
        };

        let mut read_buf = ReadBuf::new(&mut this.buf);
        match Pin::new(file).poll_read(cx, &mut read_buf) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Err(err)) => {
                this.file = None;
                Poll::Ready(Some(Err(err)))
            }
            Poll::Ready(Ok(())) => {
                let filled = read_buf.filled();
                if filled.is_empty() {
                    this.file = None;
                    return Poll::Ready(None);
                }
                Poll::Ready(Some(Ok(Bytes::copy_from_slice(filled))))
            }
        }
    }
}

struct CleanupGuard {
    path: PathBuf,
    metrics: Metrics,
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => self.metrics.dec_scratch_files(),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                self.metrics.dec_scratch_files();
            }
            Err(err) => {
                warn!(
                    error = %err,
                    path = %self.path.display(),
                    "failed to remove streamed scratch file"
                );
            }
        }
    }
}
