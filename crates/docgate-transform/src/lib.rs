#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Document transforms behind the conversion gateway.
//!
//! The [`dispatch::Dispatcher`] is the single entry point: it maps an
//! [`dispatch::OperationKind`] to exactly one transform capability and wraps
//! every external failure in a structured [`TransformError`]. The
//! capabilities themselves delegate the byte-level work to ecosystem crates:
//! `lopdf` for document assembly and stamping, `pdfium-render` (behind the
//! [`pdf::raster::PageRasterizer`] seam) for rasterisation, `printpdf` for
//! composing fixed-page output, `pdf-extract` for text, `calamine` and
//! `quick-xml`/`zip` for office formats.
//!
//! Layout: `pages.rs` (page-range expressions), `edits.rs` (stamp
//! instructions), `pdf/` (PDF-native capabilities), `office/` (OOXML and
//! workbook capabilities), `compose.rs` (text/table page composition),
//! `extract.rs` (PDF text extraction), `package.rs` (result packaging),
//! `dispatch.rs` (operation routing).

pub mod compose;
pub mod dispatch;
pub mod edits;
pub mod error;
pub mod extract;
pub mod office;
pub mod package;
pub mod pages;
pub mod pdf;

pub use dispatch::{Dispatcher, OperationKind, OperationParams, OperationRequest};
pub use edits::{EditInstructionSet, ImageStamp, RectangleStamp, TextStamp};
pub use error::{TransformError, TransformResult};
pub use package::package;
pub use pages::parse_page_range;
pub use pdf::raster::{PageRasterizer, PdfiumRasterizer, RasterPage};
