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

//! Shared test helpers used across integration suites.
//! Layout: fixtures.rs (temp directories and file helpers), sqlite.rs (in-memory database pools).

pub mod fixtures;
pub mod sqlite;
