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

//! Environment-backed configuration for the Docgate gateway.
//!
//! Layout: `model.rs` (typed configuration profiles), `loader.rs`
//! (environment parsing over validated defaults), `validate.rs`
//! (field-level parsing helpers).

pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::load_from_env;
pub use model::{AppConfig, AppProfile, LogStyle, PipelinePolicy, ScratchPolicy, TelemetryProfile};
