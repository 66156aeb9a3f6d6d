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

//! Request-scoped scratch storage for the conversion pipeline.
//!
//! Every uploaded file and every transform artifact is materialised on a
//! shared scratch directory for the duration of exactly one request. The
//! types here make the release obligation structural: resources are created
//! through a [`ScratchScope`] that tracks them, the scope is drained on every
//! exit path (with a drop backstop), and the one artifact still needed while
//! the response body streams is deleted by a guard when the stream goes away,
//! whether the transfer completed or the client disconnected.
//!
//! Layout: `store.rs` (injected storage root, unique path generation),
//! `resource.rs` (the tracked file handle), `scope.rs` (per-request tracker),
//! `stream.rs` (drop-guarded response body), `name.rs` (filename hygiene).

pub mod error;
pub mod name;
pub mod resource;
pub mod scope;
pub mod store;
pub mod stream;

pub use error::{ScratchError, ScratchResult};
pub use name::{sanitize_stem, split_file_name};
pub use resource::{ResourceRole, TemporaryResource};
pub use scope::ScratchScope;
pub use store::ScratchStore;
pub use stream::StreamedResource;
