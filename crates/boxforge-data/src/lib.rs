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

//! Record store for boxforge: migrations, row projections, and repositories.
//!
//! Layout: `store.rs` (`RecordStore` and its queries), `records.rs` (row and
//! payload types), `join.rs` (tri-state values for left-joined columns).

pub mod error;
pub mod join;
pub mod records;
pub mod store;

pub use error::{DataError, Result as DataResult};
pub use join::Joined;
pub use records::{
    HandshakeJoin, HandshakeRow, InboundColumns, InboundJoinRow, InboundRow, ListenOptions, LogRow,
    NewHandshake, NewInbound, NewLog, NewReality, NewTls, NewTransport, NewUser, RealityJoin,
    RealityRow, TlsJoin, TlsRow, TransportJoin, TransportRow, UserRow,
};
pub use store::RecordStore;
