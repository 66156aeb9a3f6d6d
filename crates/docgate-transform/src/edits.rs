//! Stamp instructions for the edit operation.
//!
//! Instructions arrive as one JSON document with three ordered collections.
//! Application order is fixed: rectangles first, then text, then images, so
//! an eraser box can never cover content added by the same request.
//!
//! Positions and sizes are fractions of the page width/height in `[0, 1]`
//! with a top-left origin (the convention of the uploading client);
//! conversion to PDF's bottom-left point space happens at stamp time.

use serde::{Deserialize, Serialize};

/// The full instruction set for one edit request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditInstructionSet {
    /// Opaque or outlined boxes, drawn first.
    pub rectangles: Vec<RectangleStamp>,
    /// Text stamps, drawn after rectangles.
    pub texts: Vec<TextStamp>,
    /// Image stamps, drawn last.
    pub images: Vec<ImageStamp>,
}

impl EditInstructionSet {
    /// Total number of instructions across all three collections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rectangles.len() + self.texts.len() + self.images.len()
    }

    /// Whether the set contains no instructions at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Highest page index referenced by any instruction, if any.
    #[must_use]
    pub fn max_page_index(&self) -> Option<usize> {
        let rects = self.rectangles.iter().map(|r| r.page_index);
        let texts = self.texts.iter().map(|t| t.page_index);
        let images = self.images.iter().map(|i| i.page_index);
        rects.chain(texts).chain(images).max()
    }
}

/// A filled or outlined rectangle (the eraser primitive).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RectangleStamp {
    /// Client-side identifier, echoed for diagnostics only.
    #[serde(default)]
    pub id: String,
    /// 0-based page the rectangle applies to.
    pub page_index: usize,
    /// Left edge as a fraction of page width.
    pub x: f32,
    /// Top edge as a fraction of page height.
    pub y: f32,
    /// Width as a fraction of page width.
    pub width: f32,
    /// Height as a fraction of page height.
    pub height: f32,
    /// Fill/stroke color as a `#rrggbb` triplet.
    #[serde(default = "default_rectangle_color")]
    pub color: String,
    /// Whether the rectangle is filled; outlined otherwise.
    #[serde(default = "default_true")]
    pub fill: bool,
}

/// A text stamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStamp {
    /// Client-side identifier, echoed for diagnostics only.
    #[serde(default)]
    pub id: String,
    /// 0-based page the text applies to.
    pub page_index: usize,
    /// Text content.
    pub text: String,
    /// Left edge as a fraction of page width.
    pub x: f32,
    /// Top edge as a fraction of page height.
    pub y: f32,
    /// Font size in points.
    #[serde(default = "default_font_size")]
    pub font_size: u32,
    /// Text color as a `#rrggbb` triplet.
    #[serde(default = "default_text_color")]
    pub color: String,
}

/// An image stamp referencing one of the uploaded image files by position.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageStamp {
    /// Client-side identifier, echoed for diagnostics only.
    #[serde(default)]
    pub id: String,
    /// 0-based page the image applies to.
    pub page_index: usize,
    /// Left edge as a fraction of page width.
    pub x: f32,
    /// Top edge as a fraction of page height.
    pub y: f32,
    /// Width as a fraction of page width.
    pub width: f32,
    /// Height as a fraction of page height.
    pub height: f32,
    /// Index into the uploaded image files.
    pub file_index: usize,
}

fn default_rectangle_color() -> String {
    "#FFFFFF".to_string()
}

fn default_text_color() -> String {
    "#000000".to_string()
}

const fn default_font_size() -> u32 {
    12
}

const fn default_true() -> bool {
    true
}

/// Parse a `#rrggbb` triplet into normalized RGB components.
///
/// Unparseable values fall back to the supplied default, matching the
/// lenient treatment of style attributes.
#[must_use]
pub(crate) fn parse_hex_color(value: &str, fallback: (f32, f32, f32)) -> (f32, f32, f32) {
    let Some(hex) = value.strip_prefix('#') else {
        return fallback;
    };
    if hex.len() != 6 {
        return fallback;
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16)
            .ok()
            .map(|v| f32::from(v) / 255.0)
    };
    match (channel(0..2), channel(2..4), channel(4..6)) {
        (Some(r), Some(g), Some(b)) => (r, g, b),
        _ => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: (f32, f32, f32) = (0.0, 0.0, 0.0);

    #[test]
    fn deserializes_camel_case_payload() -> serde_json::Result<()> {
        let payload = r##"{
            "texts": [{"id": "t1", "pageIndex": 0, "text": "Hello", "x": 0.1, "y": 0.2, "fontSize": 14, "color": "#112233"}],
            "images": [{"id": "i1", "pageIndex": 1, "x": 0.0, "y": 0.0, "width": 0.5, "height": 0.25, "fileIndex": 0}],
            "rectangles": [{"id": "r1", "pageIndex": 0, "x": 0.0, "y": 0.0, "width": 1.0, "height": 0.1}]
        }"##;
        let edits: EditInstructionSet = serde_json::from_str(payload)?;
        assert_eq!(edits.len(), 3);
        assert_eq!(edits.texts[0].font_size, 14);
        assert_eq!(edits.images[0].file_index, 0);
        assert!(edits.rectangles[0].fill, "fill defaults to true");
        assert_eq!(edits.rectangles[0].color, "#FFFFFF");
        assert_eq!(edits.max_page_index(), Some(1));
        Ok(())
    }

    #[test]
    fn missing_collections_default_to_empty() -> serde_json::Result<()> {
        let edits: EditInstructionSet = serde_json::from_str("{}")?;
        assert!(edits.is_empty());
        assert_eq!(edits.max_page_index(), None);
        Ok(())
    }

    #[test]
    fn hex_colors_parse_with_fallback() {
        assert_eq!(parse_hex_color("#FF0000", BLACK), (1.0, 0.0, 0.0));
        let (r, g, b) = parse_hex_color("#336699", BLACK);
        assert!((r - 0.2).abs() < 0.01 && (g - 0.4).abs() < 0.01 && (b - 0.6).abs() < 0.01);
        assert_eq!(parse_hex_color("red", BLACK), BLACK);
        assert_eq!(parse_hex_color("#12345", BLACK), BLACK);
        assert_eq!(parse_hex_color("#xxyyzz", BLACK), BLACK);
    }
}
