//! Document assembly: merging whole documents and selecting page subsets.
//!
//! Both operations rebuild a fresh document and deep-clone the wanted pages
//! into it. Cloning duplicates resources shared between pages, which costs
//! output size but keeps the page graph self-contained regardless of how the
//! source structured its page tree. Annotations are dropped during cloning;
//! their back-references into the page tree would otherwise recurse.

use std::path::{Path, PathBuf};

use lopdf::{Dictionary, Document, Object, ObjectId, dictionary};

use crate::error::{TransformError, TransformResult};
use crate::pdf::{load_document, save_document};

/// Merge the given documents, in order, into a single PDF at `output`.
///
/// # Errors
///
/// Returns an error when any input cannot be parsed or the result cannot be
/// written.
pub fn merge(inputs: &[PathBuf], output: &Path) -> TransformResult<()> {
    let (mut merged, pages_id) = empty_document();

    for path in inputs {
        let source = load_document("merge.load", path)?;
        append_pages(&source, &mut merged, pages_id, None)?;
    }

    finish_document(&mut merged)?;
    save_document("merge.save", &mut merged, output)
}

/// Copy the selected 0-based pages of `input`, in ascending order, into a new
/// PDF at `output`.
///
/// # Errors
///
/// Returns an error when the input cannot be parsed, a selected page is
/// missing from the page tree, or the result cannot be written.
pub fn select_pages(input: &Path, indices: &[usize], output: &Path) -> TransformResult<()> {
    let source = load_document("select_pages.load", input)?;
    let (mut selected, pages_id) = empty_document();
    append_pages(&source, &mut selected, pages_id, Some(indices))?;
    finish_document(&mut selected)?;
    save_document("select_pages.save", &mut selected, output)
}

fn empty_document() -> (Document, ObjectId) {
    let mut document = Document::with_version("1.5");
    let pages_id = document.add_object(dictionary! {
        "Type" => "Pages",
        "Count" => 0,
        "Kids" => Object::Array(Vec::new()),
    });
    let catalog_id = document.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    document.trailer.set("Root", Object::Reference(catalog_id));
    (document, pages_id)
}

fn finish_document(document: &mut Document) -> TransformResult<()> {
    document.prune_objects();
    document.renumber_objects();
    document.compress();
    Ok(())
}

/// Append pages of `source` to `target`'s page tree. `indices` restricts the
/// copy to the given 0-based pages; `None` copies every page in order.
fn append_pages(
    source: &Document,
    target: &mut Document,
    pages_id: ObjectId,
    indices: Option<&[usize]>,
) -> TransformResult<()> {
    let source_pages = source.get_pages();
    let ordered: Vec<ObjectId> = match indices {
        None => source_pages.values().copied().collect(),
        Some(indices) => {
            let mut ids = Vec::with_capacity(indices.len());
            for &index in indices {
                // lopdf keys pages by 1-based page number.
                let number = u32::try_from(index + 1).map_err(|_| {
                    TransformError::parameter_value("pages", "page_out_of_range", index.to_string())
                })?;
                let id = source_pages.get(&number).ok_or_else(|| {
                    TransformError::parameter_value(
                        "pages",
                        "page_out_of_range",
                        number.to_string(),
                    )
                })?;
                ids.push(*id);
            }
            ids
        }
    };

    for page_id in ordered {
        let page_object = source
            .get_object(page_id)
            .map_err(|source| TransformError::pdf("append_pages.read", source))?;
        let cloned = deep_clone_object(source, target, page_object)?;
        let cloned_id = target.add_object(cloned);
        attach_page(target, pages_id, cloned_id);
    }
    Ok(())
}

fn attach_page(target: &mut Document, pages_id: ObjectId, page_id: ObjectId) {
    if let Ok(Object::Dictionary(pages_dict)) = target.get_object_mut(pages_id) {
        if let Ok(Object::Array(kids)) = pages_dict.get_mut(b"Kids") {
            kids.push(Object::Reference(page_id));
        }
        if let Ok(Object::Integer(count)) = pages_dict.get_mut(b"Count") {
            *count += 1;
        }
    }
    if let Ok(Object::Dictionary(page_dict)) = target.get_object_mut(page_id) {
        page_dict.set("Parent", Object::Reference(pages_id));
    }
}

/// Deep-clone a single object, recursively resolving references.
///
/// `/Parent` is skipped (patched by the caller) and `/Annots` is dropped:
/// annotation dictionaries point back into the page tree.
fn deep_clone_object(
    source: &Document,
    target: &mut Document,
    object: &Object,
) -> TransformResult<Object> {
    match object {
        Object::Dictionary(dict) => Ok(Object::Dictionary(clone_dictionary(source, target, dict)?)),
        Object::Array(items) => {
            let mut cloned = Vec::with_capacity(items.len());
            for item in items {
                cloned.push(deep_clone_object(source, target, item)?);
            }
            Ok(Object::Array(cloned))
        }
        Object::Reference(id) => match source.get_object(*id) {
            Ok(referenced) => {
                let cloned = deep_clone_object(source, target, referenced)?;
                let new_id = target.add_object(cloned);
                Ok(Object::Reference(new_id))
            }
            // Dangling references degrade to Null rather than failing the copy.
            Err(_) => Ok(Object::Null),
        },
        Object::Stream(stream) => {
            let dict = clone_dictionary(source, target, &stream.dict)?;
            let mut cloned = lopdf::Stream::new(dict, stream.content.clone());
            if !stream.allows_compression {
                cloned = cloned.with_compression(false);
            }
            Ok(Object::Stream(cloned))
        }
        other => Ok(other.clone()),
    }
}

fn clone_dictionary(
    source: &Document,
    target: &mut Document,
    dict: &Dictionary,
) -> TransformResult<Dictionary> {
    let mut cloned = Dictionary::new();
    for (key, value) in dict.iter() {
        if key == b"Parent" || key == b"Annots" {
            continue;
        }
        cloned.set(key.clone(), deep_clone_object(source, target, value)?);
    }
    Ok(cloned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::page_count;
    use anyhow::Result;
    use tempfile::TempDir;

    fn fixture(dir: &TempDir, name: &str, pages: usize) -> Result<PathBuf> {
        let path = dir.path().join(name);
        let bytes = crate::pdf::rebuild::tests_support::blank_document(pages);
        std::fs::write(&path, bytes)?;
        Ok(path)
    }

    #[test]
    fn merge_concatenates_page_counts() -> Result<()> {
        let dir = TempDir::new()?;
        let first = fixture(&dir, "a.pdf", 2)?;
        let second = fixture(&dir, "b.pdf", 3)?;
        let output = dir.path().join("merged.pdf");

        merge(&[first, second], &output)?;
        assert_eq!(page_count(&output)?, 5);
        Ok(())
    }

    #[test]
    fn select_pages_keeps_only_requested_pages() -> Result<()> {
        let dir = TempDir::new()?;
        let input = fixture(&dir, "in.pdf", 5)?;
        let output = dir.path().join("out.pdf");

        select_pages(&input, &[0, 2, 4], &output)?;
        assert_eq!(page_count(&output)?, 3);
        Ok(())
    }

    #[test]
    fn select_pages_rejects_missing_page() -> Result<()> {
        let dir = TempDir::new()?;
        let input = fixture(&dir, "in.pdf", 2)?;
        let output = dir.path().join("out.pdf");
        assert!(select_pages(&input, &[7], &output).is_err());
        Ok(())
    }
}
