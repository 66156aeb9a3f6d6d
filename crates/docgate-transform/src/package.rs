//! Result packaging: normalise a transform's artifacts to one deliverable.
//!
//! A single artifact passes through untouched. Multiple artifacts are folded
//! into one deflate ZIP and the individual files are released immediately;
//! they are superseded intermediates and must not wait for the deferred
//! post-response cleanup.

use std::io::Write;
use std::path::Path;

use docgate_scratch::{ResourceRole, ScratchScope, TemporaryResource};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{TransformError, TransformResult};

/// Reduce the artifact list to exactly one deliverable.
///
/// # Errors
///
/// Returns [`TransformError::EmptyResult`] for an empty list,
/// [`TransformError::OutputNotProduced`] when an artifact is missing on
/// disk, and archive errors when the ZIP cannot be written.
pub fn package(
    scope: &ScratchScope,
    mut artifacts: Vec<TemporaryResource>,
    archive_stem: &str,
) -> TransformResult<TemporaryResource> {
    for artifact in &artifacts {
        if !artifact.path().exists() {
            return Err(TransformError::OutputNotProduced {
                operation: "package",
                path: artifact.path().to_path_buf(),
            });
        }
    }

    match artifacts.len() {
        0 => Err(TransformError::EmptyResult {
            operation: "package",
        }),
        1 => Ok(artifacts.remove(0)),
        count => {
            let archive = scope.create(ResourceRole::Output, archive_stem, "zip");
            write_archive(&artifacts, archive.path())?;

            for artifact in artifacts {
                scope.release(artifact);
            }
            debug!(entries = count, archive = %archive.path().display(), "bundled artifacts");
            Ok(archive)
        }
    }
}

/// Client-facing entry name for an artifact: its sanitized stem plus the
/// scratch file's extension, without the unique path component.
fn entry_name(artifact: &TemporaryResource) -> String {
    match artifact.path().extension().and_then(|ext| ext.to_str()) {
        Some(extension) => format!("{}.{extension}", artifact.stem()),
        None => artifact.stem().to_string(),
    }
}

fn write_archive(artifacts: &[TemporaryResource], output: &Path) -> TransformResult<()> {
    let file = std::fs::File::create(output)
        .map_err(|source| TransformError::io("package.create", output, source))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for artifact in artifacts {
        let bytes = std::fs::read(artifact.path())
            .map_err(|source| TransformError::io("package.read_artifact", artifact.path(), source))?;
        zip.start_file(entry_name(artifact), options)
            .map_err(|source| TransformError::zip("package.start_entry", source))?;
        zip.write_all(&bytes)
            .map_err(|source| TransformError::io("package.write_entry", output, source))?;
    }
    zip.finish()
        .map(|_| ())
        .map_err(|source| TransformError::zip("package.finish", source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use docgate_scratch::ScratchStore;
    use docgate_telemetry::Metrics;
    use tempfile::TempDir;

    fn scope(dir: &TempDir) -> Result<ScratchScope> {
        Ok(ScratchStore::open(dir.path(), Metrics::new()?)?.begin_scope())
    }

    #[test]
    fn single_artifact_passes_through_unchanged() -> Result<()> {
        let dir = TempDir::new()?;
        let scope = scope(&dir)?;
        let artifact =
            scope.create_with_bytes(ResourceRole::Output, "compressed_report", "pdf", b"%PDF")?;
        let path = artifact.path().to_path_buf();

        let deliverable = package(&scope, vec![artifact], "report")?;
        assert_eq!(deliverable.path(), path);
        assert_eq!(std::fs::read(deliverable.path())?, b"%PDF");
        Ok(())
    }

    #[test]
    fn multiple_artifacts_fold_into_one_archive() -> Result<()> {
        let dir = TempDir::new()?;
        let scope = scope(&dir)?;
        let first = scope.create_with_bytes(ResourceRole::Output, "report_page_1", "pdf", b"one")?;
        let second =
            scope.create_with_bytes(ResourceRole::Output, "report_page_2", "pdf", b"two")?;
        let first_path = first.path().to_path_buf();
        let second_path = second.path().to_path_buf();

        let archive = package(&scope, vec![first, second], "report")?;

        assert!(!first_path.exists(), "individual artifacts released");
        assert!(!second_path.exists());

        let reader = std::fs::File::open(archive.path())?;
        let mut zip = zip::ZipArchive::new(reader)?;
        assert_eq!(zip.len(), 2);
        assert!(zip.by_name("report_page_1.pdf").is_ok());
        assert!(zip.by_name("report_page_2.pdf").is_ok());
        Ok(())
    }

    #[test]
    fn empty_artifact_list_is_rejected() -> Result<()> {
        let dir = TempDir::new()?;
        let scope = scope(&dir)?;
        assert!(matches!(
            package(&scope, Vec::new(), "report"),
            Err(TransformError::EmptyResult { .. })
        ));
        Ok(())
    }

    #[test]
    fn missing_artifact_file_is_flagged() -> Result<()> {
        let dir = TempDir::new()?;
        let scope = scope(&dir)?;
        // Allocated but never written: the transform lied about its output.
        let ghost = scope.create(ResourceRole::Output, "ghost", "pdf");
        assert!(matches!(
            package(&scope, vec![ghost], "report"),
            Err(TransformError::OutputNotProduced { .. })
        ));
        Ok(())
    }
}
