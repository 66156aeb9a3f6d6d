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

//! HTTP delivery surface for the Docgate conversion gateway.
//!
//! Every conversion endpoint is the same pipeline (ingest, validate,
//! dispatch, package, stream) instantiated with a per-operation descriptor;
//! the handlers reduce to configuration. Scratch cleanup is owned by the
//! pipeline runner and the streaming guard, never by individual handlers.
//!
//! Layout: `http/` (router, errors, ingestion, pipeline, streaming,
//! operation descriptors, health), `models.rs` (problem documents),
//! `state.rs` (shared dependencies).

pub mod http;
pub mod models;
pub mod state;

pub use http::router::ApiServer;
pub use state::ApiState;
