//! Presentations: slide text extraction and minimal PresentationML output.
//!
//! Slide text lives in `ppt/slides/slideN.xml` as `<a:t>` leaves inside
//! `<a:p>` paragraphs. Generation emits the smallest conformant package a
//! consumer will open: one master, one layout, one slide per input entry
//! with a single text body.

use std::io::Read;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::Event;
use zip::ZipArchive;

use crate::error::{TransformError, TransformResult};
use crate::office::{create_package, finish_package, write_part, xml_escape};

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/>
</Relationships>"#;

const SLIDE_MASTER: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldMaster xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
<p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/></p:spTree></p:cSld>
<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>
<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>
</p:sldMaster>"#;

const SLIDE_MASTER_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>
</Relationships>"#;

const SLIDE_LAYOUT: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldLayout xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" type="blank">
<p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/></p:spTree></p:cSld>
<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>
</p:sldLayout>"#;

const SLIDE_LAYOUT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="../slideMasters/slideMaster1.xml"/>
</Relationships>"#;

const SLIDE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>
</Relationships>"#;

/// Read the text of every slide, in slide order; paragraphs are joined with
/// newlines.
///
/// # Errors
///
/// Returns an error when the archive or a slide part cannot be parsed.
pub fn read_slide_texts(path: &Path) -> TransformResult<Vec<String>> {
    let file = std::fs::File::open(path)
        .map_err(|source| TransformError::io("slides.open", path, source))?;
    let mut archive =
        ZipArchive::new(file).map_err(|source| TransformError::zip("slides.archive", source))?;

    let mut slide_parts: Vec<(usize, String)> = archive
        .file_names()
        .filter_map(|name| {
            let number = name
                .strip_prefix("ppt/slides/slide")?
                .strip_suffix(".xml")?
                .parse::<usize>()
                .ok()?;
            Some((number, name.to_string()))
        })
        .collect();
    slide_parts.sort_unstable();

    let mut slides = Vec::with_capacity(slide_parts.len());
    for (_, part_name) in slide_parts {
        let mut xml = String::new();
        archive
            .by_name(&part_name)
            .map_err(|source| TransformError::zip("slides.slide_part", source))?
            .read_to_string(&mut xml)
            .map_err(|source| TransformError::io("slides.read_part", path, source))?;
        slides.push(parse_slide_text(&xml)?);
    }
    Ok(slides)
}

fn parse_slide_text(xml: &str) -> TransformResult<String> {
    let mut reader = Reader::from_str(xml);
    let mut text = String::new();
    let mut in_text = false;

    loop {
        match reader
            .read_event()
            .map_err(|source| TransformError::xml("slides.parse", source))?
        {
            Event::Start(element) if element.name().as_ref() == b"a:t" => in_text = true,
            Event::End(element) => match element.name().as_ref() {
                b"a:t" => in_text = false,
                b"a:p" => {
                    if !text.is_empty() && !text.ends_with('\n') {
                        text.push('\n');
                    }
                }
                _ => {}
            },
            Event::Text(value) => {
                if in_text {
                    let unescaped = value
                        .unescape()
                        .map_err(|source| TransformError::xml("slides.unescape", source))?;
                    text.push_str(&unescaped);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(text.trim_end().to_string())
}

/// Write a minimal `.pptx` with one text-only slide per entry.
///
/// # Errors
///
/// Returns an error when the package cannot be written.
pub fn write_presentation(slides: &[String], output: &Path) -> TransformResult<()> {
    let slide_count = slides.len().max(1);

    let mut content_types = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>
<Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/>
<Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/>"#,
    );
    for index in 1..=slide_count {
        content_types.push_str(&format!(
            "\n<Override PartName=\"/ppt/slides/slide{index}.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.slide+xml\"/>"
        ));
    }
    content_types.push_str("\n</Types>");

    let mut slide_id_list = String::new();
    let mut presentation_rels = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="slideMasters/slideMaster1.xml"/>"#,
    );
    for index in 1..=slide_count {
        let rel_id = index + 1;
        slide_id_list.push_str(&format!(
            "<p:sldId id=\"{}\" r:id=\"rId{rel_id}\"/>",
            255 + index
        ));
        presentation_rels.push_str(&format!(
            "\n<Relationship Id=\"rId{rel_id}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide\" Target=\"slides/slide{index}.xml\"/>"
        ));
    }
    presentation_rels.push_str("\n</Relationships>");

    let presentation = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>
<p:sldIdLst>{slide_id_list}</p:sldIdLst>
<p:sldSz cx="9144000" cy="6858000"/>
<p:notesSz cx="6858000" cy="9144000"/>
</p:presentation>"#
    );

    let mut package = create_package(output)?;
    write_part(&mut package, "[Content_Types].xml", &content_types)?;
    write_part(&mut package, "_rels/.rels", ROOT_RELS)?;
    write_part(&mut package, "ppt/presentation.xml", &presentation)?;
    write_part(
        &mut package,
        "ppt/_rels/presentation.xml.rels",
        &presentation_rels,
    )?;
    write_part(&mut package, "ppt/slideMasters/slideMaster1.xml", SLIDE_MASTER)?;
    write_part(
        &mut package,
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        SLIDE_MASTER_RELS,
    )?;
    write_part(&mut package, "ppt/slideLayouts/slideLayout1.xml", SLIDE_LAYOUT)?;
    write_part(
        &mut package,
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        SLIDE_LAYOUT_RELS,
    )?;

    let empty = String::new();
    for index in 1..=slide_count {
        let text = slides.get(index - 1).unwrap_or(&empty);
        write_part(
            &mut package,
            &format!("ppt/slides/slide{index}.xml"),
            &slide_xml(text),
        )?;
        write_part(
            &mut package,
            &format!("ppt/slides/_rels/slide{index}.xml.rels"),
            SLIDE_RELS,
        )?;
    }
    finish_package(package)
}

fn slide_xml(text: &str) -> String {
    let mut paragraphs = String::new();
    for line in text.lines() {
        paragraphs.push_str(&format!(
            "<a:p><a:r><a:t>{}</a:t></a:r></a:p>",
            xml_escape(line)
        ));
    }
    if paragraphs.is_empty() {
        paragraphs.push_str("<a:p/>");
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
<p:cSld><p:spTree>
<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>
<p:sp>
<p:nvSpPr><p:cNvPr id="2" name="Content"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr>
<p:spPr><a:xfrm><a:off x="457200" y="457200"/><a:ext cx="8229600" cy="5943600"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr>
<p:txBody><a:bodyPr wrap="square"/><a:lstStyle/>{paragraphs}</p:txBody>
</p:sp>
</p:spTree></p:cSld>
<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>
</p:sld>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::TempDir;

    #[test]
    fn roundtrip_preserves_slide_text_in_order() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("deck.pptx");
        let slides = vec![
            "Title line\nSecond line".to_string(),
            "Closing & thanks".to_string(),
        ];

        write_presentation(&slides, &path)?;
        let read_back = read_slide_texts(&path)?;
        assert_eq!(read_back, slides);
        Ok(())
    }

    #[test]
    fn empty_deck_still_produces_one_slide() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("empty.pptx");
        write_presentation(&[], &path)?;
        assert_eq!(read_slide_texts(&path)?, vec![String::new()]);
        Ok(())
    }

    #[test]
    fn slide_numbers_above_nine_sort_numerically() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("big.pptx");
        let slides: Vec<String> = (1..=12).map(|i| format!("Slide {i}")).collect();
        write_presentation(&slides, &path)?;
        assert_eq!(read_slide_texts(&path)?, slides);
        Ok(())
    }
}
