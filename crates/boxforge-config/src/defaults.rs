//! Built-in configuration defaults.
//!
//! # Design
//! - Centralize the values used when neither a file nor the environment sets a field.
//! - Keep paths relative to the working directory, matching where operators run the tool.

/// Record store location.
pub(crate) const DATABASE_URL: &str = "sqlite://config.db";
/// Rendered proxy configuration.
pub(crate) const CONFIG_OUTPUT: &str = "./config.json";
/// Per-user client documents.
pub(crate) const USERS_DIR: &str = "./sing-box/users";
/// Per-user subscription stubs.
pub(crate) const SUB_DIR: &str = "./sing-box/sub";
/// Client document template.
pub(crate) const TEMPLATE: &str = "./template.json";
/// Route prefix of subscription locations.
pub(crate) const ROUTE_PREFIX: &str = "/sub";
/// Directory the web server serves client documents from.
pub(crate) const ALIAS_ROOT: &str = "/etc/sing-box/users";
/// Extension of client documents.
pub(crate) const DOCUMENT_EXT: &str = "json";
/// Log level used when `RUST_LOG` is unset.
pub(crate) const LOG_LEVEL: &str = "info";

/// Environment variable names read by the loader.
pub mod env {
    /// Overrides `database_url`.
    pub const DATABASE_URL: &str = "BOXFORGE_DATABASE_URL";
    /// Overrides `paths.config_output`.
    pub const OUTPUT: &str = "BOXFORGE_OUTPUT";
    /// Overrides `paths.users_dir`.
    pub const USERS_DIR: &str = "BOXFORGE_USERS_DIR";
    /// Overrides `paths.sub_dir`.
    pub const SUB_DIR: &str = "BOXFORGE_SUB_DIR";
    /// Overrides `paths.template`.
    pub const TEMPLATE: &str = "BOXFORGE_TEMPLATE";
    /// Overrides `telemetry.level`.
    pub const LOG_LEVEL: &str = "BOXFORGE_LOG_LEVEL";
    /// Overrides `telemetry.format`.
    pub const LOG_FORMAT: &str = "BOXFORGE_LOG_FORMAT";
}
