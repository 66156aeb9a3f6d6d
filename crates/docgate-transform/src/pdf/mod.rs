//! PDF-native capabilities.
//!
//! Layout: `assemble.rs` (merge and page selection), `stamp.rs` (rectangle/
//! text/image stamping), `encrypt.rs` (AES-256 standard security handler),
//! `raster.rs` (page rasterisation seam), `rebuild.rs` (image-only page
//! reconstruction used by the recompression path).

pub mod assemble;
pub mod encrypt;
pub mod raster;
pub mod rebuild;
pub mod stamp;

use std::path::Path;

use lopdf::{Document, Object, ObjectId};

use crate::error::{TransformError, TransformResult};

/// Default letter-size page used when a document carries no `MediaBox`.
pub(crate) const DEFAULT_PAGE_SIZE: (f32, f32) = (612.0, 792.0);

pub(crate) fn load_document(operation: &'static str, path: &Path) -> TransformResult<Document> {
    Document::load(path).map_err(|source| TransformError::pdf(operation, source))
}

pub(crate) fn save_document(
    operation: &'static str,
    document: &mut Document,
    path: &Path,
) -> TransformResult<()> {
    let mut file = std::fs::File::create(path)
        .map_err(|source| TransformError::io(operation, path, source))?;
    document
        .save_to(&mut file)
        .map_err(|source| TransformError::pdf(operation, lopdf::Error::IO(source)))
}

/// Number of pages in the document at `path`.
///
/// # Errors
///
/// Returns an error when the document cannot be parsed.
pub fn page_count(path: &Path) -> TransformResult<usize> {
    Ok(load_document("page_count.load", path)?.get_pages().len())
}

/// Resolve the effective `MediaBox` of a page, walking the page-tree
/// inheritance chain; falls back to US Letter when absent.
pub(crate) fn page_size(document: &Document, page_id: ObjectId) -> (f32, f32) {
    let mut current = Some(page_id);
    let mut hops = 0;
    while let Some(id) = current {
        // Bounded walk; malformed parent chains must not loop forever.
        if hops > 32 {
            break;
        }
        hops += 1;
        let Ok(dict) = document.get_object(id).and_then(Object::as_dict) else {
            break;
        };
        if let Ok(media_box) = dict.get(b"MediaBox").and_then(resolve_array(document)) {
            if let Some(size) = media_box_size(&media_box) {
                return size;
            }
        }
        current = dict
            .get(b"Parent")
            .ok()
            .and_then(|parent| parent.as_reference().ok());
    }
    DEFAULT_PAGE_SIZE
}

fn resolve_array(document: &Document) -> impl Fn(&Object) -> lopdf::Result<Vec<Object>> + '_ {
    move |object| match object {
        Object::Reference(id) => document.get_object(*id).and_then(|o| o.as_array().cloned()),
        other => other.as_array().cloned(),
    }
}

fn media_box_size(values: &[Object]) -> Option<(f32, f32)> {
    if values.len() != 4 {
        return None;
    }
    // `as_float` accepts both Integer and Real coordinates.
    let coord = |object: &Object| -> Option<f32> { object.as_float().ok() };
    let x0 = coord(&values[0])?;
    let y0 = coord(&values[1])?;
    let x1 = coord(&values[2])?;
    let y1 = coord(&values[3])?;
    let width = (x1 - x0).abs();
    let height = (y1 - y0).abs();
    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    Some((width, height))
}
