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

//! Configuration for boxforge.
//!
//! Layout: `model.rs` (typed sections), `defaults.rs` (built-in values and
//! environment variable names), `loader.rs` (file and environment layering),
//! `validate.rs`.

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load, load_with};
pub use model::{
    AppConfig, LogFormatChoice, PathsConfig, RenderConfig, SubscriptionConfig, TelemetryConfig,
};
pub use validate::validate;
