//! Rectangle, text, and image stamping on existing pages.
//!
//! Stamps are appended as additional content streams so the original page
//! content is never rewritten. Instruction coordinates are normalized with a
//! top-left origin; they are converted to PDF point space (bottom-left
//! origin) against each page's effective `MediaBox`.
//!
//! Instructions whose page index (or image index) falls outside the document
//! are skipped under the lenient policy and rejected in strict mode.

use std::io::Cursor;
use std::path::Path;

use image::ImageReader;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use tracing::debug;

use crate::edits::{EditInstructionSet, parse_hex_color};
use crate::error::{TransformError, TransformResult};
use crate::pdf::{load_document, page_size, save_document};

const FONT_RESOURCE: &str = "Fdg";
const STAMP_JPEG_QUALITY: u8 = 90;

const WHITE: (f32, f32, f32) = (1.0, 1.0, 1.0);
const BLACK: (f32, f32, f32) = (0.0, 0.0, 0.0);

/// Apply the instruction set to `input`, writing the stamped document to
/// `output`. `images` holds the uploaded image payloads referenced by
/// `file_index`.
///
/// # Errors
///
/// Returns an error when the document cannot be parsed or written, when an
/// image payload cannot be decoded, or, in strict mode, when an
/// instruction references a page or image outside the request.
pub fn apply(
    input: &Path,
    output: &Path,
    edits: &EditInstructionSet,
    images: &[Vec<u8>],
    strict: bool,
) -> TransformResult<()> {
    let mut document = load_document("stamp.load", input)?;
    let pages = document.get_pages();
    let page_count = pages.len();

    if strict {
        if let Some(max_index) = edits.max_page_index() {
            if max_index >= page_count {
                return Err(TransformError::parameter_value(
                    "edits",
                    "page_out_of_range",
                    max_index.to_string(),
                ));
            }
        }
        if let Some(stamp) = edits.images.iter().find(|s| s.file_index >= images.len()) {
            return Err(TransformError::parameter_value(
                "edits",
                "image_index_out_of_range",
                stamp.file_index.to_string(),
            ));
        }
    }

    let page_for = |index: usize| -> Option<ObjectId> {
        u32::try_from(index + 1).ok().and_then(|n| pages.get(&n)).copied()
    };

    let mut skipped = 0usize;

    // Rectangles first: an eraser box must never cover content stamped by
    // the same request.
    for rect in &edits.rectangles {
        let Some(page_id) = page_for(rect.page_index) else {
            skipped += 1;
            continue;
        };
        let (width, height) = page_size(&document, page_id);
        let (r, g, b) = parse_hex_color(&rect.color, WHITE);
        let x = rect.x * width;
        let w = rect.width * width;
        let h = rect.height * height;
        let y = height - rect.y * height - h;

        let mut ops = vec![
            Operation::new("q", vec![]),
            Operation::new("rg", vec![r.into(), g.into(), b.into()]),
            Operation::new("RG", vec![r.into(), g.into(), b.into()]),
            Operation::new("re", vec![x.into(), y.into(), w.into(), h.into()]),
        ];
        ops.push(Operation::new(if rect.fill { "f" } else { "S" }, vec![]));
        ops.push(Operation::new("Q", vec![]));
        append_content(&mut document, page_id, ops)?;
    }

    for text in &edits.texts {
        let Some(page_id) = page_for(text.page_index) else {
            skipped += 1;
            continue;
        };
        ensure_helvetica(&mut document, page_id)?;
        let (width, height) = page_size(&document, page_id);
        let (r, g, b) = parse_hex_color(&text.color, BLACK);
        let size = text.font_size as f32;
        let x = text.x * width;
        // The client anchors text at its top edge; Td addresses the baseline.
        let y = height - text.y * height - size;

        let ops = vec![
            Operation::new("q", vec![]),
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![Object::Name(FONT_RESOURCE.into()), size.into()],
            ),
            Operation::new("rg", vec![r.into(), g.into(), b.into()]),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new("Tj", vec![Object::string_literal(text.text.as_str())]),
            Operation::new("ET", vec![]),
            Operation::new("Q", vec![]),
        ];
        append_content(&mut document, page_id, ops)?;
    }

    for (ordinal, stamp) in edits.images.iter().enumerate() {
        let Some(page_id) = page_for(stamp.page_index) else {
            skipped += 1;
            continue;
        };
        let Some(payload) = images.get(stamp.file_index) else {
            skipped += 1;
            continue;
        };
        let (width, height) = page_size(&document, page_id);
        let resource = format!("Imdg{ordinal}");
        let image_id = add_jpeg_xobject(&mut document, payload)?;
        ensure_resource(&mut document, page_id, "XObject", resource.clone(), image_id)?;

        let w = stamp.width * width;
        let h = stamp.height * height;
        let x = stamp.x * width;
        let y = height - stamp.y * height - h;

        let ops = vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    w.into(),
                    0.0_f32.into(),
                    0.0_f32.into(),
                    h.into(),
                    x.into(),
                    y.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(resource.into())]),
            Operation::new("Q", vec![]),
        ];
        append_content(&mut document, page_id, ops)?;
    }

    if skipped > 0 {
        debug!(skipped, page_count, "skipped out-of-range edit instructions");
    }

    document.compress();
    save_document("stamp.save", &mut document, output)
}

fn append_content(
    document: &mut Document,
    page_id: ObjectId,
    operations: Vec<Operation>,
) -> TransformResult<()> {
    let encoded = Content { operations }
        .encode()
        .map_err(|source| TransformError::pdf("stamp.encode", source))?;
    let stream_id = document.add_object(Object::Stream(Stream::new(dictionary! {}, encoded)));

    let page = document
        .get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|source| TransformError::pdf("stamp.page_dict", source))?;
    let contents = match page.get(b"Contents") {
        Ok(Object::Array(existing)) => {
            let mut array = existing.clone();
            array.push(Object::Reference(stream_id));
            Object::Array(array)
        }
        Ok(reference @ Object::Reference(_)) => {
            Object::Array(vec![reference.clone(), Object::Reference(stream_id)])
        }
        _ => Object::Reference(stream_id),
    };
    page.set("Contents", contents);
    Ok(())
}

fn ensure_helvetica(document: &mut Document, page_id: ObjectId) -> TransformResult<()> {
    let font_id = document.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    ensure_resource(document, page_id, "Font", FONT_RESOURCE.to_string(), font_id)
}

/// Register `name -> target` under the given resource category of a page,
/// materialising the `Resources` dictionary (from the inheritance chain if
/// necessary) and flattening an indirect category dictionary inline.
fn ensure_resource(
    document: &mut Document,
    page_id: ObjectId,
    category: &'static str,
    name: String,
    target: ObjectId,
) -> TransformResult<()> {
    enum ResourcesAt {
        Inline,
        Referenced(ObjectId),
    }

    let location = {
        let page = document
            .get_object(page_id)
            .and_then(Object::as_dict)
            .map_err(|source| TransformError::pdf("stamp.page_dict", source))?;
        match page.get(b"Resources") {
            Ok(Object::Reference(id)) => Some(ResourcesAt::Referenced(*id)),
            Ok(Object::Dictionary(_)) => Some(ResourcesAt::Inline),
            _ => None,
        }
    };
    let location = if let Some(location) = location {
        location
    } else {
        let inherited = inherited_resources(document, page_id);
        let page = document
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|source| TransformError::pdf("stamp.page_dict", source))?;
        page.set("Resources", Object::Dictionary(inherited));
        ResourcesAt::Inline
    };

    // Snapshot the category dictionary, resolving an indirect entry.
    let mut category_dict = {
        let resources = match &location {
            ResourcesAt::Inline => document
                .get_object(page_id)
                .and_then(Object::as_dict)
                .map_err(|source| TransformError::pdf("stamp.page_dict", source))?
                .get(b"Resources")
                .and_then(Object::as_dict)
                .map_err(|source| TransformError::pdf("stamp.resources", source))?,
            ResourcesAt::Referenced(id) => document
                .get_object(*id)
                .and_then(Object::as_dict)
                .map_err(|source| TransformError::pdf("stamp.resources", source))?,
        };
        match resources.get(category.as_bytes()) {
            Ok(Object::Dictionary(existing)) => existing.clone(),
            Ok(Object::Reference(id)) => document
                .get_object(*id)
                .and_then(Object::as_dict)
                .map_or_else(|_| Dictionary::new(), Dictionary::clone),
            _ => Dictionary::new(),
        }
    };
    category_dict.set(name, Object::Reference(target));

    let resources = match location {
        ResourcesAt::Inline => document
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|source| TransformError::pdf("stamp.page_dict", source))?
            .get_mut(b"Resources")
            .and_then(Object::as_dict_mut)
            .map_err(|source| TransformError::pdf("stamp.resources", source))?,
        ResourcesAt::Referenced(id) => document
            .get_object_mut(id)
            .and_then(Object::as_dict_mut)
            .map_err(|source| TransformError::pdf("stamp.resources", source))?,
    };
    resources.set(category, Object::Dictionary(category_dict));
    Ok(())
}

fn inherited_resources(document: &Document, page_id: ObjectId) -> Dictionary {
    let mut current = document
        .get_object(page_id)
        .and_then(Object::as_dict)
        .ok()
        .and_then(|dict| dict.get(b"Parent").ok())
        .and_then(|parent| parent.as_reference().ok());
    let mut hops = 0;
    while let Some(id) = current {
        if hops > 32 {
            break;
        }
        hops += 1;
        let Ok(dict) = document.get_object(id).and_then(Object::as_dict) else {
            break;
        };
        match dict.get(b"Resources") {
            Ok(Object::Dictionary(resources)) => return resources.clone(),
            Ok(Object::Reference(resources_id)) => {
                if let Ok(resources) = document
                    .get_object(*resources_id)
                    .and_then(Object::as_dict)
                {
                    return resources.clone();
                }
            }
            _ => {}
        }
        current = dict
            .get(b"Parent")
            .ok()
            .and_then(|parent| parent.as_reference().ok());
    }
    Dictionary::new()
}

/// Decode an uploaded image payload and embed it as a `DCTDecode` XObject.
fn add_jpeg_xobject(document: &mut Document, payload: &[u8]) -> TransformResult<ObjectId> {
    let decoded = ImageReader::new(Cursor::new(payload))
        .with_guessed_format()
        .map_err(|source| TransformError::io("stamp.image_format", "<upload>", source))?
        .decode()
        .map_err(|source| TransformError::image("stamp.image_decode", source))?;
    let rgb = decoded.to_rgb8();
    let (width, height) = rgb.dimensions();

    let mut jpeg = Vec::new();
    let mut encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, STAMP_JPEG_QUALITY);
    encoder
        .encode(rgb.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .map_err(|source| TransformError::image("stamp.image_encode", source))?;

    Ok(document.add_object(Object::Stream(
        Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(width),
                "Height" => i64::from(height),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            jpeg,
        )
        .with_compression(false),
    )))
}
