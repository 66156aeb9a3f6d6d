//! Page rasterisation seam.
//!
//! Rasterisation is the one capability delegated to a native library, so it
//! sits behind a trait: the production implementation binds pdfium, and
//! tests substitute a stub that needs no native code. Callers run the
//! rasteriser on the blocking pool, since pdfium keeps thread-local state and
//! must not run on async worker threads.

use std::path::Path;

use image::RgbImage;
use pdfium_render::prelude::*;

use crate::error::{TransformError, TransformResult};

/// One rasterised page with its source geometry in points.
pub struct RasterPage {
    /// 0-based page index.
    pub index: usize,
    /// Rendered page pixels.
    pub image: RgbImage,
    /// Source page width in PDF points.
    pub width_pt: f32,
    /// Source page height in PDF points.
    pub height_pt: f32,
}

/// Renders every page of a PDF document at a scale factor (1.0 = 72 dpi).
pub trait PageRasterizer: Send + Sync {
    /// Rasterise all pages of `document`.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::Raster`] when the document cannot be opened
    /// or a page fails to render.
    fn rasterize(&self, document: &Path, scale: f32) -> TransformResult<Vec<RasterPage>>;
}

/// Production rasteriser backed by the pdfium library.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfiumRasterizer;

impl PdfiumRasterizer {
    /// Construct the pdfium-backed rasteriser.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl PageRasterizer for PdfiumRasterizer {
    fn rasterize(&self, document: &Path, scale: f32) -> TransformResult<Vec<RasterPage>> {
        let pdfium = Pdfium::default();
        let document = pdfium
            .load_pdf_from_file(document, None)
            .map_err(|err| TransformError::raster("raster.open", format!("{err:?}")))?;

        let config = PdfRenderConfig::new().scale_page_by_factor(scale);
        let pages = document.pages();
        let mut rendered = Vec::with_capacity(pages.len() as usize);

        for (index, page) in pages.iter().enumerate() {
            let bitmap = page
                .render_with_config(&config)
                .map_err(|err| TransformError::raster("raster.render", format!("{err:?}")))?;
            rendered.push(RasterPage {
                index,
                image: bitmap.as_image().to_rgb8(),
                width_pt: page.width().value,
                height_pt: page.height().value,
            });
        }

        Ok(rendered)
    }
}

/// Encode a rasterised page as JPEG at the given quality.
///
/// # Errors
///
/// Returns [`TransformError::Image`] when encoding fails.
pub(crate) fn encode_jpeg(page: &RasterPage, quality: u8) -> TransformResult<Vec<u8>> {
    let mut jpeg = Vec::new();
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, quality);
    encoder
        .encode(
            page.image.as_raw(),
            page.image.width(),
            page.image.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|source| TransformError::image("raster.jpeg_encode", source))?;
    Ok(jpeg)
}
