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

//! Test fixtures shared across the Docgate workspace: minimal document
//! builders, a multipart body encoder for router tests, and a rasteriser
//! stub that needs no native library.

pub mod fixtures;
pub mod multipart;
pub mod raster;

pub use fixtures::{pdf_bytes, png_bytes};
pub use multipart::MultipartBody;
pub use raster::StubRasterizer;
