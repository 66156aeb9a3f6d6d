//! Minimal document fixtures built in memory.

use std::io::Cursor;

use lopdf::{Document, Object, dictionary};

/// Serialise a minimal blank PDF with the given number of pages.
#[must_use]
pub fn pdf_bytes(pages: usize) -> Vec<u8> {
    let mut document = Document::with_version("1.5");
    let pages_id = document.add_object(dictionary! {
        "Type" => "Pages",
        "Count" => 0,
        "Kids" => Object::Array(Vec::new()),
    });

    let mut kids = Vec::with_capacity(pages);
    for _ in 0..pages {
        let content_id =
            document.add_object(Object::Stream(lopdf::Stream::new(dictionary! {}, Vec::new())));
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

/// Encode a small solid-colour PNG.
#[must_use]
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbImage::from_pixel(width, height, image::Rgb([200, 30, 30]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("in-memory PNG encode cannot fail");
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_fixture_parses_with_expected_page_count() {
        let bytes = pdf_bytes(3);
        let document = Document::load_mem(&bytes).expect("fixture must parse");
        assert_eq!(document.get_pages().len(), 3);
    }

    #[test]
    fn png_fixture_carries_signature() {
        let bytes = png_bytes(4, 4);
        assert_eq!(&bytes[1..4], b"PNG");
    }
}
