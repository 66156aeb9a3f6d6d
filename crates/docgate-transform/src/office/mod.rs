//! Office document capabilities.
//!
//! OOXML containers are ZIP archives of XML parts; reading walks the part
//! XML with `quick-xml`, writing emits minimal conformant packages.
//! Workbook reading goes through `calamine`, which also covers legacy `.xls`.
//!
//! Layout: `docx.rs` (word-processing), `sheet.rs` (workbooks), `slides.rs`
//! (presentations).

pub mod docx;
pub mod sheet;
pub mod slides;

use std::io::Write;
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{TransformError, TransformResult};

/// Write one part into an OOXML package under construction.
pub(crate) fn write_part(
    zip: &mut ZipWriter<std::fs::File>,
    name: &str,
    content: &str,
) -> TransformResult<()> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    zip.start_file(name, options)
        .map_err(|source| TransformError::zip("office.start_part", source))?;
    zip.write_all(content.as_bytes())
        .map_err(|source| TransformError::io("office.write_part", name, source))?;
    Ok(())
}

pub(crate) fn create_package(path: &Path) -> TransformResult<ZipWriter<std::fs::File>> {
    let file = std::fs::File::create(path)
        .map_err(|source| TransformError::io("office.create_package", path, source))?;
    Ok(ZipWriter::new(file))
}

pub(crate) fn finish_package(zip: ZipWriter<std::fs::File>) -> TransformResult<()> {
    zip.finish()
        .map(|_| ())
        .map_err(|source| TransformError::zip("office.finish_package", source))
}

/// Escape text for inclusion in an XML element body.
pub(crate) fn xml_escape(text: &str) -> String {
    quick_xml::escape::escape(text).into_owned()
}
