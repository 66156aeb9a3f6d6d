//! Word-processing documents: OOXML paragraph extraction and generation.
//!
//! A `.docx` is a ZIP archive whose main content lives in
//! `word/document.xml`; paragraphs are `<w:p>` elements and text runs carry
//! `<w:t>` leaves. Reading collects run text per paragraph; writing emits a
//! minimal package with one `<w:p>` per input paragraph.

use std::io::Read;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::Event;
use zip::ZipArchive;

use crate::error::{TransformError, TransformResult};
use crate::office::{create_package, finish_package, write_part, xml_escape};

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

/// Read the paragraphs of a `.docx` file.
///
/// # Errors
///
/// Returns an error when the archive or its main document part cannot be
/// parsed.
pub fn read_paragraphs(path: &Path) -> TransformResult<Vec<String>> {
    let file = std::fs::File::open(path)
        .map_err(|source| TransformError::io("docx.open", path, source))?;
    let mut archive =
        ZipArchive::new(file).map_err(|source| TransformError::zip("docx.archive", source))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|source| TransformError::zip("docx.document_part", source))?
        .read_to_string(&mut xml)
        .map_err(|source| TransformError::io("docx.read_part", path, source))?;

    parse_paragraphs(&xml)
}

fn parse_paragraphs(xml: &str) -> TransformResult<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_paragraph = false;
    let mut in_text = false;

    loop {
        match reader
            .read_event()
            .map_err(|source| TransformError::xml("docx.parse", source))?
        {
            Event::Start(element) => match element.name().as_ref() {
                b"w:p" => {
                    in_paragraph = true;
                    current.clear();
                }
                b"w:t" => in_text = true,
                _ => {}
            },
            Event::End(element) => match element.name().as_ref() {
                b"w:p" => {
                    in_paragraph = false;
                    paragraphs.push(std::mem::take(&mut current));
                }
                b"w:t" => in_text = false,
                _ => {}
            },
            // Self-closing <w:br/> inside a run becomes a space.
            Event::Empty(element) => {
                if in_paragraph && element.name().as_ref() == b"w:br" {
                    current.push(' ');
                }
            }
            Event::Text(text) => {
                if in_text {
                    let value = text
                        .unescape()
                        .map_err(|source| TransformError::xml("docx.unescape", source))?;
                    current.push_str(&value);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

/// Write a minimal `.docx` containing the given paragraphs.
///
/// # Errors
///
/// Returns an error when the package cannot be written.
pub fn write_document(paragraphs: &[String], output: &Path) -> TransformResult<()> {
    let mut body = String::new();
    for paragraph in paragraphs {
        body.push_str("<w:p><w:r><w:t xml:space=\"preserve\">");
        body.push_str(&xml_escape(paragraph));
        body.push_str("</w:t></w:r></w:p>");
    }
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:body>{body}<w:sectPr/></w:body>
</w:document>"#
    );

    let mut package = create_package(output)?;
    write_part(&mut package, "[Content_Types].xml", CONTENT_TYPES)?;
    write_part(&mut package, "_rels/.rels", ROOT_RELS)?;
    write_part(&mut package, "word/document.xml", &document)?;
    finish_package(package)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::TempDir;

    #[test]
    fn roundtrip_preserves_paragraph_text() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("doc.docx");
        let paragraphs = vec![
            "First paragraph".to_string(),
            String::new(),
            "Symbols <&> survive".to_string(),
        ];

        write_document(&paragraphs, &path)?;
        let read_back = read_paragraphs(&path)?;
        assert_eq!(read_back, paragraphs);
        Ok(())
    }

    #[test]
    fn parse_collects_runs_within_one_paragraph() -> TransformResult<()> {
        let xml = r#"<w:document xmlns:w="ns"><w:body>
            <w:p><w:r><w:t>Hello </w:t></w:r><w:r><w:t>world</w:t></w:r></w:p>
        </w:body></w:document>"#;
        assert_eq!(parse_paragraphs(xml)?, vec!["Hello world".to_string()]);
        Ok(())
    }
}
