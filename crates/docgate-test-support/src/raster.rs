//! Rasteriser stub for tests.

use std::path::Path;

use docgate_transform::{PageRasterizer, RasterPage, TransformResult};
use docgate_transform::pdf::page_count;

/// Produces one solid light-grey page image per document page, sized from
/// the requested scale. No native rendering library is involved, so
/// raster-backed operations stay testable everywhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubRasterizer;

impl PageRasterizer for StubRasterizer {
    fn rasterize(&self, document: &Path, scale: f32) -> TransformResult<Vec<RasterPage>> {
        let count = page_count(document)?;
        let side = ((72.0 * scale) as u32).max(1);
        Ok((0..count)
            .map(|index| RasterPage {
                index,
                image: image::RgbImage::from_pixel(side, side, image::Rgb([235, 235, 235])),
                width_pt: 612.0,
                height_pt: 792.0,
            })
            .collect())
    }
}
