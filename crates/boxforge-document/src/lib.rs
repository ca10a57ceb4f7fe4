#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls
)]
#![warn(missing_docs, unreachable_pub)]
#![allow(clippy::module_name_repetitions)]

//! The proxy configuration document and its projection from stored records.
//!
//! Layout: `model.rs` (document tree and field presence rules),
//! `projection.rs` (`RecordSource` and the flat-row reconstruction),
//! `render.rs` (serialization and atomic writes), `error.rs`.

pub mod error;
pub mod model;
pub mod projection;
pub mod render;

pub use error::{GenerateError, ProjectionError, RenderError};
pub use model::{
    Document, DocumentUser, Experimental, Handshake, Inbound, Log, Reality, Tls, Transport,
};
pub use projection::{
    OrphanedBlock, ProjectionOptions, RecordSource, assemble_inbound, document_users,
    orphaned_blocks, project,
};
pub use render::{generate_document, render_document, write_document};
