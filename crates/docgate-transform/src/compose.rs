//! Fixed-page PDF composition from flowing text.
//!
//! Used by every to-PDF conversion that starts from extracted content:
//! OOXML paragraphs, workbook rows, and slide text all reduce to a block
//! sequence that is wrapped, paginated, and laid out with the built-in
//! Helvetica faces. printpdf 0.8 is data-oriented: pages are `Vec<Op>`
//! operation lists serialised through `PdfDocument::save`.

use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt, TextItem,
};

/// A4 page geometry.
const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;

const BODY_SIZE_PT: f32 = 11.0;
const BODY_LEADING_PT: f32 = 14.0;
const HEADING_SIZE_PT: f32 = 14.0;
const HEADING_LEADING_PT: f32 = 20.0;

/// One unit of flowing content.
#[derive(Debug, Clone)]
pub enum Block {
    /// Bold section heading.
    Heading(String),
    /// Body paragraph, word-wrapped to the page width.
    Paragraph(String),
    /// Hard page break.
    PageBreak,
}

/// Lay the blocks out on A4 pages and serialise the document.
#[must_use]
pub fn compose(title: &str, blocks: &[Block]) -> Vec<u8> {
    let mut document = PdfDocument::new(title);
    let mut sink = PageSink::new();

    for block in blocks {
        match block {
            Block::PageBreak => sink.page_break(),
            Block::Heading(text) => {
                for line in wrap_text(text, sink.chars_per_line(HEADING_SIZE_PT)) {
                    sink.push_line(&line, BuiltinFont::HelveticaBold, HEADING_SIZE_PT, HEADING_LEADING_PT);
                }
                sink.push_gap(BODY_LEADING_PT / 2.0);
            }
            Block::Paragraph(text) => {
                if text.is_empty() {
                    sink.push_gap(BODY_LEADING_PT);
                    continue;
                }
                for line in wrap_text(text, sink.chars_per_line(BODY_SIZE_PT)) {
                    sink.push_line(&line, BuiltinFont::Helvetica, BODY_SIZE_PT, BODY_LEADING_PT);
                }
            }
        }
    }

    document.with_pages(sink.finish());
    let mut warnings: Vec<PdfWarnMsg> = Vec::new();
    document.save(&PdfSaveOptions::default(), &mut warnings)
}

struct PageSink {
    pages: Vec<PdfPage>,
    ops: Vec<Op>,
    cursor_pt: f32,
}

impl PageSink {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            ops: Vec::new(),
            cursor_pt: Self::top_pt(),
        }
    }

    fn top_pt() -> f32 {
        Mm(PAGE_HEIGHT_MM - MARGIN_MM).into_pt().0
    }

    fn bottom_pt() -> f32 {
        Mm(MARGIN_MM).into_pt().0
    }

    /// Approximate characters per line for Helvetica at the given size
    /// (average glyph width is roughly half the font size).
    fn chars_per_line(&self, size_pt: f32) -> usize {
        let usable_mm = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
        let avg_char_mm = 0.5 * size_pt * 0.3528;
        ((usable_mm / avg_char_mm) as usize).max(8)
    }

    fn push_line(&mut self, line: &str, font: BuiltinFont, size_pt: f32, leading_pt: f32) {
        if self.cursor_pt - leading_pt < Self::bottom_pt() {
            self.page_break();
        }
        let y = self.cursor_pt - leading_pt;
        self.ops.push(Op::StartTextSection);
        self.ops.push(Op::SetTextCursor {
            pos: Point {
                x: Pt(Mm(MARGIN_MM).into_pt().0),
                y: Pt(y),
            },
        });
        self.ops.push(Op::SetFontSizeBuiltinFont {
            size: Pt(size_pt),
            font,
        });
        self.ops.push(Op::WriteTextBuiltinFont {
            items: vec![TextItem::Text(line.to_string())],
            font,
        });
        self.ops.push(Op::EndTextSection);
        self.cursor_pt = y;
    }

    fn push_gap(&mut self, gap_pt: f32) {
        self.cursor_pt -= gap_pt;
    }

    fn page_break(&mut self) {
        let ops = std::mem::take(&mut self.ops);
        self.pages.push(PdfPage::new(
            Mm(PAGE_WIDTH_MM),
            Mm(PAGE_HEIGHT_MM),
            ops,
        ));
        self.cursor_pt = Self::top_pt();
    }

    fn finish(mut self) -> Vec<PdfPage> {
        if !self.ops.is_empty() || self.pages.is_empty() {
            self.page_break();
        }
        self.pages
    }
}

/// Word-wrap a single paragraph to at most `max_width` characters per line.
/// Oversized words are force-broken.
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::with_capacity(max_width);

    for word in text.split_whitespace() {
        let mut word = word;
        while word.len() > max_width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let split_at = floor_char_boundary(word, max_width);
            if split_at == 0 {
                break;
            }
            let (head, tail) = word.split_at(split_at);
            lines.push(head.to_string());
            word = tail;
        }
        if current.is_empty() {
            current.push_str(word);
        } else if current.len() + 1 + word.len() <= max_width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn floor_char_boundary(text: &str, index: usize) -> usize {
    let mut boundary = index.min(text.len());
    while boundary > 0 && !text.is_char_boundary(boundary) {
        boundary -= 1;
    }
    boundary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composed_output_is_a_pdf() {
        let bytes = compose(
            "Test",
            &[
                Block::Heading("Sheet one".into()),
                Block::Paragraph("cell a | cell b".into()),
            ],
        );
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn empty_input_still_yields_one_page() {
        let bytes = compose("Empty", &[]);
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn wrap_respects_width_and_breaks_long_words() {
        let wrapped = wrap_text("alpha beta gamma", 10);
        assert!(wrapped.iter().all(|line| line.len() <= 10));
        assert_eq!(wrapped.join(" "), "alpha beta gamma");

        let forced = wrap_text(&"x".repeat(25), 10);
        assert_eq!(forced.len(), 3);
    }

    #[test]
    fn wrap_never_splits_multibyte_characters() {
        let wrapped = wrap_text(&"é".repeat(30), 10);
        assert!(!wrapped.is_empty());
        let total: String = wrapped.concat();
        assert_eq!(total.chars().count(), 30);
    }

    #[test]
    fn page_breaks_create_multiple_pages() {
        let many: Vec<Block> = (0..3)
            .flat_map(|i| {
                vec![
                    Block::Paragraph(format!("slide {i}")),
                    Block::PageBreak,
                ]
            })
            .collect();
        let bytes = compose("Slides", &many);
        assert!(bytes.starts_with(b"%PDF"));
    }
}
