//! Image-only page reconstruction.
//!
//! The recompression path rasterises every page and rebuilds the document as
//! one full-bleed JPEG per page, preserving the original page sizes in
//! points. JPEG bytes are embedded verbatim as `DCTDecode` image XObjects so
//! the size win from recompression survives serialisation.

use std::path::Path;

use lopdf::{Document, Object, Stream, dictionary};

use crate::error::TransformResult;
use crate::pdf::save_document;

/// One rebuilt page: encoded JPEG plus pixel and point geometry.
pub(crate) struct JpegPage {
    /// Encoded JPEG bytes.
    pub(crate) jpeg: Vec<u8>,
    /// Raster width in pixels.
    pub(crate) pixel_width: u32,
    /// Raster height in pixels.
    pub(crate) pixel_height: u32,
    /// Page width in PDF points.
    pub(crate) width_pt: f32,
    /// Page height in PDF points.
    pub(crate) height_pt: f32,
}

/// Build a PDF whose pages each contain a single full-bleed JPEG, and write
/// it to `output`.
///
/// # Errors
///
/// Returns an error when content encoding or the final write fails.
pub(crate) fn write_jpeg_document(pages: &[JpegPage], output: &Path) -> TransformResult<()> {
    let mut document = Document::with_version("1.5");
    let pages_id = document.add_object(dictionary! {
        "Type" => "Pages",
        "Count" => 0,
        "Kids" => Object::Array(Vec::new()),
    });

    let mut kids = Vec::with_capacity(pages.len());
    for page in pages {
        let image_id = document.add_object(Object::Stream(
            Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => i64::from(page.pixel_width),
                    "Height" => i64::from(page.pixel_height),
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8,
                    "Filter" => "DCTDecode",
                },
                page.jpeg.clone(),
            )
            .with_compression(false),
        ));

        // Scale the unit image square across the whole page.
        let content = format!(
            "q\n{:.2} 0 0 {:.2} 0 0 cm\n/Im0 Do\nQ",
            page.width_pt, page.height_pt
        );
        let content_id = document.add_object(Object::Stream(Stream::new(
            dictionary! {},
            content.into_bytes(),
        )));

        let page_id = document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(page.width_pt),
                Object::Real(page.height_pt),
            ],
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => Object::Reference(image_id) },
            },
            "Contents" => Object::Reference(content_id),
        });
        kids.push(Object::Reference(page_id));
    }

    let count = i64::try_from(kids.len()).unwrap_or(i64::MAX);
    if let Ok(Object::Dictionary(pages_dict)) = document.get_object_mut(pages_id) {
        pages_dict.set("Kids", Object::Array(kids));
        pages_dict.set("Count", Object::Integer(count));
    }

    let catalog_id = document.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    document.trailer.set("Root", Object::Reference(catalog_id));
    document.compress();

    save_document("rebuild.save", &mut document, output)
}

#[cfg(test)]
pub(crate) mod tests_support {
    use lopdf::{Document, Object, dictionary};

    /// Serialise a minimal blank document with the given number of pages.
    /// Shared by crate tests that need real parseable PDF inputs.
    pub(crate) fn blank_document(pages: usize) -> Vec<u8> {
        let mut document = Document::with_version("1.5");
        let pages_id = document.add_object(dictionary! {
            "Type" => "Pages",
            "Count" => 0,
            "Kids" => Object::Array(Vec::new()),
        });

        let mut kids = Vec::with_capacity(pages);
        for _ in 0..pages {
            let content_id = document.add_object(Object::Stream(lopdf::Stream::new(
                dictionary! {},
                Vec::new(),
            )));
            let page_id = document.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => Object::Reference(pages_id),
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(612),
                    Object::Integer(792),
                ],
                "Resources" => dictionary! {},
                "Contents" => Object::Reference(content_id),
            });
            kids.push(Object::Reference(page_id));
        }

        let count = i64::try_from(kids.len()).unwrap_or(0);
        if let Ok(Object::Dictionary(pages_dict)) = document.get_object_mut(pages_id) {
            pages_dict.set("Kids", Object::Array(kids));
            pages_dict.set("Count", Object::Integer(count));
        }
        let catalog_id = document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        document.trailer.set("Root", Object::Reference(catalog_id));

        let mut bytes = Vec::new();
        document
            .save_to(&mut bytes)
            .expect("in-memory save cannot fail");
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::page_count;
    use anyhow::Result;
    use tempfile::TempDir;

    #[test]
    fn rebuilt_document_has_one_page_per_image() -> Result<()> {
        let dir = TempDir::new()?;
        let output = dir.path().join("rebuilt.pdf");
        let pages = vec![
            JpegPage {
                jpeg: vec![0xFF, 0xD8, 0xFF, 0xD9],
                pixel_width: 10,
                pixel_height: 14,
                width_pt: 612.0,
                height_pt: 792.0,
            },
            JpegPage {
                jpeg: vec![0xFF, 0xD8, 0xFF, 0xD9],
                pixel_width: 10,
                pixel_height: 14,
                width_pt: 595.0,
                height_pt: 842.0,
            },
        ];
        write_jpeg_document(&pages, &output)?;
        assert_eq!(page_count(&output)?, 2);
        Ok(())
    }
}
