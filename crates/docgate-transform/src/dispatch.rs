//! Operation routing.
//!
//! The dispatcher is pure routing: one [`OperationKind`] maps to exactly one
//! transform capability, parameters are validated before any collaborator
//! runs, and every artifact is materialised through the request's
//! [`ScratchScope`] so the cleanup obligation stays with the caller.

use std::path::PathBuf;
use std::sync::Arc;

use docgate_config::PipelinePolicy;
use docgate_scratch::{ResourceRole, ScratchScope, TemporaryResource};
use tracing::info;

use crate::compose::{self, Block};
use crate::edits::EditInstructionSet;
use crate::error::{TransformError, TransformResult};
use crate::extract;
use crate::office::{docx, sheet, slides};
use crate::pages::parse_page_range;
use crate::pdf::raster::{PageRasterizer, encode_jpeg};
use crate::pdf::rebuild::JpegPage;
use crate::pdf::{self, assemble, encrypt, rebuild, stamp};

/// The closed set of gateway operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Rasterise and JPEG-recompress a PDF.
    Compress,
    /// Concatenate several PDFs.
    Merge,
    /// Select pages out of a PDF.
    Split,
    /// Stamp rectangles, text, and images onto a PDF.
    Edit,
    /// Password-protect a PDF with AES-256.
    Protect,
    /// Export PDF pages as JPEG images.
    PdfToJpg,
    /// Convert a PDF to a word-processing document.
    PdfToWord,
    /// Convert a PDF to a workbook.
    PdfToExcel,
    /// Convert a PDF to a presentation.
    PdfToPptx,
    /// Convert a word-processing document to PDF.
    WordToPdf,
    /// Convert a workbook to PDF.
    ExcelToPdf,
    /// Convert a presentation to PDF.
    PptxToPdf,
}

impl OperationKind {
    /// Render the operation as its lowercase identifier (metrics labels,
    /// log fields).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Compress => "compress",
            Self::Merge => "merge",
            Self::Split => "split",
            Self::Edit => "edit",
            Self::Protect => "protect",
            Self::PdfToJpg => "pdf_to_jpg",
            Self::PdfToWord => "pdf_to_word",
            Self::PdfToExcel => "pdf_to_excel",
            Self::PdfToPptx => "pdf_to_pptx",
            Self::WordToPdf => "word_to_pdf",
            Self::ExcelToPdf => "excel_to_pdf",
            Self::PptxToPdf => "pptx_to_pdf",
        }
    }
}

/// Operation-specific parameters, validated before the transform runs.
#[derive(Debug, Clone, Default)]
pub enum OperationParams {
    /// No parameters beyond the uploaded file(s).
    #[default]
    None,
    /// Page selection for the split operation.
    Split {
        /// Page-range expression (1-based, e.g. `1-3,5`).
        pages: String,
        /// Produce one document (`true`) or one file per page (`false`).
        merge: bool,
    },
    /// Password for the protect operation.
    Protect {
        /// User/owner password, at least four characters.
        password: String,
    },
    /// Instruction set for the edit operation.
    Edit {
        /// Parsed stamp instructions.
        edits: EditInstructionSet,
    },
}

/// A validated unit of work handed to the dispatcher.
#[derive(Debug)]
pub struct OperationRequest {
    /// Which transform to run.
    pub kind: OperationKind,
    /// Primary uploaded files (one for every operation except merge).
    pub inputs: Vec<TemporaryResource>,
    /// Uploaded image payloads referenced by edit instructions.
    pub image_inputs: Vec<TemporaryResource>,
    /// Operation-specific parameters.
    pub params: OperationParams,
}

/// Routes operations to transform capabilities.
#[derive(Clone)]
pub struct Dispatcher {
    rasterizer: Arc<dyn PageRasterizer>,
    policy: PipelinePolicy,
}

impl Dispatcher {
    /// Construct a dispatcher with the given rasteriser and pipeline policy.
    #[must_use]
    pub fn new(rasterizer: Arc<dyn PageRasterizer>, policy: PipelinePolicy) -> Self {
        Self { rasterizer, policy }
    }

    /// Execute the request, producing one or more output artifacts.
    ///
    /// # Errors
    ///
    /// Returns a validation error before any collaborator runs when the
    /// parameters are invalid, and a structured transform error when a
    /// collaborator fails. Artifacts stay registered with `scope` on every
    /// path, so the caller's drain obligation covers partial failures.
    pub fn dispatch(
        &self,
        scope: &ScratchScope,
        request: OperationRequest,
    ) -> TransformResult<Vec<TemporaryResource>> {
        info!(
            operation = request.kind.as_str(),
            inputs = request.inputs.len(),
            "dispatching transform"
        );
        match request.kind {
            OperationKind::Compress => self.compress(scope, &request),
            OperationKind::Merge => Self::merge(scope, &request),
            OperationKind::Split => self.split(scope, &request),
            OperationKind::Edit => self.edit(scope, &request),
            OperationKind::Protect => Self::protect(scope, &request),
            OperationKind::PdfToJpg => self.pdf_to_jpg(scope, &request),
            OperationKind::PdfToWord => Self::pdf_to_word(scope, &request),
            OperationKind::PdfToExcel => Self::pdf_to_excel(scope, &request),
            OperationKind::PdfToPptx => Self::pdf_to_pptx(scope, &request),
            OperationKind::WordToPdf => Self::word_to_pdf(scope, &request),
            OperationKind::ExcelToPdf => Self::excel_to_pdf(scope, &request),
            OperationKind::PptxToPdf => Self::pptx_to_pdf(scope, &request),
        }
    }

    fn compress(
        &self,
        scope: &ScratchScope,
        request: &OperationRequest,
    ) -> TransformResult<Vec<TemporaryResource>> {
        let input = single_input(request)?;
        let pages = self
            .rasterizer
            .rasterize(input.path(), self.policy.compress_scale)?;
        if pages.is_empty() {
            return Err(TransformError::EmptyResult {
                operation: "compress",
            });
        }

        let mut rebuilt = Vec::with_capacity(pages.len());
        for page in &pages {
            rebuilt.push(JpegPage {
                jpeg: encode_jpeg(page, self.policy.compress_jpeg_quality)?,
                pixel_width: page.image.width(),
                pixel_height: page.image.height(),
                width_pt: page.width_pt,
                height_pt: page.height_pt,
            });
        }

        let output = scope.create(
            ResourceRole::Output,
            &format!("compressed_{}", input.stem()),
            "pdf",
        );
        rebuild::write_jpeg_document(&rebuilt, output.path())?;
        ensure_produced("compress", &output)?;
        Ok(vec![output])
    }

    fn merge(
        scope: &ScratchScope,
        request: &OperationRequest,
    ) -> TransformResult<Vec<TemporaryResource>> {
        if request.inputs.is_empty() {
            return Err(TransformError::parameter("files", "missing"));
        }
        let paths: Vec<PathBuf> = request
            .inputs
            .iter()
            .map(|input| input.path().to_path_buf())
            .collect();

        let output = scope.create(ResourceRole::Output, "merged_document", "pdf");
        assemble::merge(&paths, output.path())?;
        ensure_produced("merge", &output)?;
        Ok(vec![output])
    }

    fn split(
        &self,
        scope: &ScratchScope,
        request: &OperationRequest,
    ) -> TransformResult<Vec<TemporaryResource>> {
        let input = single_input(request)?;
        let OperationParams::Split { pages, merge } = &request.params else {
            return Err(TransformError::parameter("pages", "missing"));
        };

        let page_count = pdf::page_count(input.path())?;
        let indices = parse_page_range(pages, page_count, self.policy.strict_bounds)?;

        if *merge {
            let output = scope.create(
                ResourceRole::Output,
                &format!("split_{}", input.stem()),
                "pdf",
            );
            assemble::select_pages(input.path(), &indices, output.path())?;
            ensure_produced("split", &output)?;
            return Ok(vec![output]);
        }

        let mut outputs = Vec::with_capacity(indices.len());
        for index in indices {
            let output = scope.create(
                ResourceRole::Output,
                &format!("{}_page_{}", input.stem(), index + 1),
                "pdf",
            );
            assemble::select_pages(input.path(), &[index], output.path())?;
            ensure_produced("split", &output)?;
            outputs.push(output);
        }
        Ok(outputs)
    }

    fn edit(
        &self,
        scope: &ScratchScope,
        request: &OperationRequest,
    ) -> TransformResult<Vec<TemporaryResource>> {
        let input = single_input(request)?;
        let OperationParams::Edit { edits } = &request.params else {
            return Err(TransformError::parameter("edits", "missing"));
        };

        let mut images = Vec::with_capacity(request.image_inputs.len());
        for image in &request.image_inputs {
            let bytes = std::fs::read(image.path())
                .map_err(|source| TransformError::io("edit.read_image", image.path(), source))?;
            images.push(bytes);
        }

        let output = scope.create(
            ResourceRole::Output,
            &format!("edited_{}", input.stem()),
            "pdf",
        );
        stamp::apply(
            input.path(),
            output.path(),
            edits,
            &images,
            self.policy.strict_bounds,
        )?;
        ensure_produced("edit", &output)?;
        Ok(vec![output])
    }

    fn protect(
        scope: &ScratchScope,
        request: &OperationRequest,
    ) -> TransformResult<Vec<TemporaryResource>> {
        let input = single_input(request)?;
        let OperationParams::Protect { password } = &request.params else {
            return Err(TransformError::parameter("password", "missing"));
        };
        if password.chars().count() < 4 {
            return Err(TransformError::parameter("password", "too_short"));
        }

        let output = scope.create(
            ResourceRole::Output,
            &format!("{}_protected", input.stem()),
            "pdf",
        );
        encrypt::encrypt_aes256(input.path(), output.path(), password)?;
        ensure_produced("protect", &output)?;
        Ok(vec![output])
    }

    fn pdf_to_jpg(
        &self,
        scope: &ScratchScope,
        request: &OperationRequest,
    ) -> TransformResult<Vec<TemporaryResource>> {
        let input = single_input(request)?;
        let pages = self
            .rasterizer
            .rasterize(input.path(), self.policy.export_scale)?;
        if pages.is_empty() {
            return Err(TransformError::EmptyResult {
                operation: "pdf_to_jpg",
            });
        }

        let single_page = pages.len() == 1;
        let mut outputs = Vec::with_capacity(pages.len());
        for page in &pages {
            let stem = if single_page {
                input.stem().to_string()
            } else {
                format!("{}_page_{}", input.stem(), page.index + 1)
            };
            let output = scope.create(ResourceRole::Output, &stem, "jpg");
            let jpeg = encode_jpeg(page, self.policy.export_jpeg_quality)?;
            std::fs::write(output.path(), &jpeg)
                .map_err(|source| TransformError::io("pdf_to_jpg.write", output.path(), source))?;
            ensure_produced("pdf_to_jpg", &output)?;
            outputs.push(output);
        }
        Ok(outputs)
    }

    fn pdf_to_word(
        scope: &ScratchScope,
        request: &OperationRequest,
    ) -> TransformResult<Vec<TemporaryResource>> {
        let input = single_input(request)?;
        let pages = extract::text_by_pages(input.path())?;
        let paragraphs: Vec<String> = pages
            .iter()
            .flat_map(|page| page.lines())
            .map(|line| line.trim_end().to_string())
            .collect();

        let output = scope.create(ResourceRole::Output, input.stem(), "docx");
        docx::write_document(&paragraphs, output.path())?;
        ensure_produced("pdf_to_word", &output)?;
        Ok(vec![output])
    }

    fn pdf_to_excel(
        scope: &ScratchScope,
        request: &OperationRequest,
    ) -> TransformResult<Vec<TemporaryResource>> {
        let input = single_input(request)?;
        let rows: Vec<Vec<String>> = extract::text_lines(input.path())?
            .iter()
            .map(|line| extract::split_cells(line))
            .filter(|cells| !cells.is_empty())
            .collect();

        let output = scope.create(ResourceRole::Output, input.stem(), "xlsx");
        sheet::write_workbook(&rows, output.path())?;
        ensure_produced("pdf_to_excel", &output)?;
        Ok(vec![output])
    }

    fn pdf_to_pptx(
        scope: &ScratchScope,
        request: &OperationRequest,
    ) -> TransformResult<Vec<TemporaryResource>> {
        let input = single_input(request)?;
        let pages = extract::text_by_pages(input.path())?;
        let slides_text: Vec<String> = pages
            .iter()
            .map(|page| page.trim().to_string())
            .collect();

        let output = scope.create(ResourceRole::Output, input.stem(), "pptx");
        slides::write_presentation(&slides_text, output.path())?;
        ensure_produced("pdf_to_pptx", &output)?;
        Ok(vec![output])
    }

    fn word_to_pdf(
        scope: &ScratchScope,
        request: &OperationRequest,
    ) -> TransformResult<Vec<TemporaryResource>> {
        let input = single_input(request)?;
        let paragraphs = docx::read_paragraphs(input.path())?;
        let blocks: Vec<Block> = paragraphs.into_iter().map(Block::Paragraph).collect();

        let output = scope.create(ResourceRole::Output, input.stem(), "pdf");
        write_composed(input.stem(), &blocks, &output)?;
        ensure_produced("word_to_pdf", &output)?;
        Ok(vec![output])
    }

    fn excel_to_pdf(
        scope: &ScratchScope,
        request: &OperationRequest,
    ) -> TransformResult<Vec<TemporaryResource>> {
        let input = single_input(request)?;
        let sheets = sheet::read_workbook(input.path())?;

        let mut blocks = Vec::new();
        for (position, data) in sheets.iter().enumerate() {
            if position > 0 {
                blocks.push(Block::PageBreak);
            }
            blocks.push(Block::Heading(format!("Sheet: {}", data.name)));
            for row in &data.rows {
                blocks.push(Block::Paragraph(row.join("  |  ")));
            }
        }

        let output = scope.create(ResourceRole::Output, input.stem(), "pdf");
        write_composed(input.stem(), &blocks, &output)?;
        ensure_produced("excel_to_pdf", &output)?;
        Ok(vec![output])
    }

    fn pptx_to_pdf(
        scope: &ScratchScope,
        request: &OperationRequest,
    ) -> TransformResult<Vec<TemporaryResource>> {
        let input = single_input(request)?;
        let slide_texts = slides::read_slide_texts(input.path())?;

        let mut blocks = Vec::new();
        for (position, text) in slide_texts.iter().enumerate() {
            if position > 0 {
                blocks.push(Block::PageBreak);
            }
            for line in text.lines() {
                blocks.push(Block::Paragraph(line.to_string()));
            }
        }

        let output = scope.create(ResourceRole::Output, input.stem(), "pdf");
        write_composed(input.stem(), &blocks, &output)?;
        ensure_produced("pptx_to_pdf", &output)?;
        Ok(vec![output])
    }
}

fn write_composed(
    title: &str,
    blocks: &[Block],
    output: &TemporaryResource,
) -> TransformResult<()> {
    let bytes = compose::compose(title, blocks);
    std::fs::write(output.path(), bytes)
        .map_err(|source| TransformError::io("compose.write", output.path(), source))
}

fn single_input(request: &OperationRequest) -> TransformResult<&TemporaryResource> {
    match request.inputs.as_slice() {
        [input] => Ok(input),
        [] => Err(TransformError::parameter("file", "missing")),
        _ => Err(TransformError::parameter("file", "expected_exactly_one")),
    }
}

fn ensure_produced(operation: &'static str, output: &TemporaryResource) -> TransformResult<()> {
    if output.path().exists() {
        Ok(())
    } else {
        Err(TransformError::OutputNotProduced {
            operation,
            path: output.path().to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::raster::RasterPage;
    use crate::pdf::rebuild::tests_support::blank_document;
    use anyhow::Result;
    use docgate_scratch::ScratchStore;
    use docgate_telemetry::Metrics;
    use tempfile::TempDir;

    /// Rasteriser stub: solid pages sized from the real page count, no
    /// native library involved.
    struct FlatRasterizer;

    impl PageRasterizer for FlatRasterizer {
        fn rasterize(&self, document: &std::path::Path, scale: f32) -> TransformResult<Vec<RasterPage>> {
            let count = pdf::page_count(document)?;
            let side = (72.0 * scale) as u32;
            Ok((0..count)
                .map(|index| RasterPage {
                    index,
                    image: image::RgbImage::from_pixel(side.max(1), side.max(1), image::Rgb([240, 240, 240])),
                    width_pt: 612.0,
                    height_pt: 792.0,
                })
                .collect())
        }
    }

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(Arc::new(FlatRasterizer), PipelinePolicy::default())
    }

    fn scope(dir: &TempDir) -> Result<ScratchScope> {
        Ok(ScratchStore::open(dir.path(), Metrics::new()?)?.begin_scope())
    }

    fn pdf_input(scope: &ScratchScope, stem: &str, pages: usize) -> Result<TemporaryResource> {
        Ok(scope.create_with_bytes(ResourceRole::Input, stem, "pdf", &blank_document(pages))?)
    }

    #[test]
    fn split_with_merge_yields_one_document() -> Result<()> {
        let dir = TempDir::new()?;
        let scope = scope(&dir)?;
        let input = pdf_input(&scope, "report", 5)?;

        let outputs = dispatcher().dispatch(
            &scope,
            OperationRequest {
                kind: OperationKind::Split,
                inputs: vec![input],
                image_inputs: Vec::new(),
                params: OperationParams::Split {
                    pages: "1-3,5".to_string(),
                    merge: true,
                },
            },
        )?;

        assert_eq!(outputs.len(), 1);
        assert_eq!(pdf::page_count(outputs[0].path())?, 4);
        assert!(outputs[0].stem().starts_with("split_report"));
        Ok(())
    }

    #[test]
    fn split_without_merge_yields_one_file_per_page() -> Result<()> {
        let dir = TempDir::new()?;
        let scope = scope(&dir)?;
        let input = pdf_input(&scope, "report", 4)?;

        let outputs = dispatcher().dispatch(
            &scope,
            OperationRequest {
                kind: OperationKind::Split,
                inputs: vec![input],
                image_inputs: Vec::new(),
                params: OperationParams::Split {
                    pages: "2,4".to_string(),
                    merge: false,
                },
            },
        )?;

        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].stem(), "report_page_2");
        assert_eq!(outputs[1].stem(), "report_page_4");
        for output in &outputs {
            assert_eq!(pdf::page_count(output.path())?, 1);
        }
        Ok(())
    }

    #[test]
    fn split_outside_document_reports_no_pages() -> Result<()> {
        let dir = TempDir::new()?;
        let scope = scope(&dir)?;
        let input = pdf_input(&scope, "short", 2)?;

        let result = dispatcher().dispatch(
            &scope,
            OperationRequest {
                kind: OperationKind::Split,
                inputs: vec![input],
                image_inputs: Vec::new(),
                params: OperationParams::Split {
                    pages: "10".to_string(),
                    merge: true,
                },
            },
        );
        assert!(matches!(result, Err(TransformError::NoPagesSelected)));
        Ok(())
    }

    #[test]
    fn merge_concatenates_inputs() -> Result<()> {
        let dir = TempDir::new()?;
        let scope = scope(&dir)?;
        let first = pdf_input(&scope, "a", 2)?;
        let second = pdf_input(&scope, "b", 1)?;

        let outputs = dispatcher().dispatch(
            &scope,
            OperationRequest {
                kind: OperationKind::Merge,
                inputs: vec![first, second],
                image_inputs: Vec::new(),
                params: OperationParams::None,
            },
        )?;
        assert_eq!(outputs.len(), 1);
        assert_eq!(pdf::page_count(outputs[0].path())?, 3);
        assert_eq!(outputs[0].stem(), "merged_document");
        Ok(())
    }

    #[test]
    fn protect_rejects_short_password_before_any_work() -> Result<()> {
        let dir = TempDir::new()?;
        let scope = scope(&dir)?;
        let input = pdf_input(&scope, "secret", 1)?;

        let result = dispatcher().dispatch(
            &scope,
            OperationRequest {
                kind: OperationKind::Protect,
                inputs: vec![input],
                image_inputs: Vec::new(),
                params: OperationParams::Protect {
                    password: "abc".to_string(),
                },
            },
        );
        assert!(matches!(
            result,
            Err(TransformError::InvalidParameter { field: "password", .. })
        ));
        Ok(())
    }

    #[test]
    fn compress_rebuilds_every_page() -> Result<()> {
        let dir = TempDir::new()?;
        let scope = scope(&dir)?;
        let input = pdf_input(&scope, "big", 3)?;

        let outputs = dispatcher().dispatch(
            &scope,
            OperationRequest {
                kind: OperationKind::Compress,
                inputs: vec![input],
                image_inputs: Vec::new(),
                params: OperationParams::None,
            },
        )?;
        assert_eq!(outputs.len(), 1);
        assert_eq!(pdf::page_count(outputs[0].path())?, 3);
        Ok(())
    }

    #[test]
    fn pdf_to_jpg_names_single_page_after_the_input() -> Result<()> {
        let dir = TempDir::new()?;
        let scope = scope(&dir)?;
        let input = pdf_input(&scope, "poster", 1)?;

        let outputs = dispatcher().dispatch(
            &scope,
            OperationRequest {
                kind: OperationKind::PdfToJpg,
                inputs: vec![input],
                image_inputs: Vec::new(),
                params: OperationParams::None,
            },
        )?;
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].stem(), "poster");
        Ok(())
    }

    #[test]
    fn word_roundtrip_through_both_directions() -> Result<()> {
        let dir = TempDir::new()?;
        let scope = scope(&dir)?;

        let docx_path = dir.path().join("memo.docx");
        docx::write_document(&["One paragraph".to_string()], &docx_path)?;
        let input = scope.create_with_bytes(
            ResourceRole::Input,
            "memo",
            "docx",
            &std::fs::read(&docx_path)?,
        )?;

        let outputs = dispatcher().dispatch(
            &scope,
            OperationRequest {
                kind: OperationKind::WordToPdf,
                inputs: vec![input],
                image_inputs: Vec::new(),
                params: OperationParams::None,
            },
        )?;
        assert_eq!(outputs.len(), 1);
        assert!(std::fs::read(outputs[0].path())?.starts_with(b"%PDF"));
        Ok(())
    }

    #[test]
    fn pptx_to_pdf_renders_one_page_per_slide() -> Result<()> {
        let dir = TempDir::new()?;
        let scope = scope(&dir)?;

        let pptx_path = dir.path().join("deck.pptx");
        slides::write_presentation(
            &["Slide one".to_string(), "Slide two".to_string()],
            &pptx_path,
        )?;
        let input = scope.create_with_bytes(
            ResourceRole::Input,
            "deck",
            "pptx",
            &std::fs::read(&pptx_path)?,
        )?;

        let outputs = dispatcher().dispatch(
            &scope,
            OperationRequest {
                kind: OperationKind::PptxToPdf,
                inputs: vec![input],
                image_inputs: Vec::new(),
                params: OperationParams::None,
            },
        )?;
        assert_eq!(pdf::page_count(outputs[0].path())?, 2);
        Ok(())
    }

    #[test]
    fn excel_to_pdf_renders_sheet_rows() -> Result<()> {
        let dir = TempDir::new()?;
        let scope = scope(&dir)?;

        let xlsx_path = dir.path().join("table.xlsx");
        sheet::write_workbook(
            &[vec!["a".to_string(), "b".to_string()]],
            &xlsx_path,
        )?;
        let input = scope.create_with_bytes(
            ResourceRole::Input,
            "table",
            "xlsx",
            &std::fs::read(&xlsx_path)?,
        )?;

        let outputs = dispatcher().dispatch(
            &scope,
            OperationRequest {
                kind: OperationKind::ExcelToPdf,
                inputs: vec![input],
                image_inputs: Vec::new(),
                params: OperationParams::None,
            },
        )?;
        assert!(std::fs::read(outputs[0].path())?.starts_with(b"%PDF"));
        Ok(())
    }
}
