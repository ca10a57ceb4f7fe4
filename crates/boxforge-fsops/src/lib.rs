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

//! Filesystem outputs for boxforge: atomic writes, per-user client documents,
//! and subscription stubs.

pub mod atomic;
pub mod client;
pub mod error;
pub mod names;
pub mod report;
pub mod subscription;

pub use atomic::{holds_bytes, write_atomic};
pub use client::{ClientEmitter, render_client_document, rewrite_uuid};
pub use error::{FsOpsError, FsOpsResult};
pub use names::validate_file_stem;
pub use report::{EmitFailure, EmitReport};
pub use subscription::{StubEmitter, StubLayout};
