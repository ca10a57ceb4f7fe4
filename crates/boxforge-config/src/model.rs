//! Typed configuration model.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::ConfigError;

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Record store connection string.
    pub database_url: String,
    /// Output and input file locations.
    pub paths: PathsConfig,
    /// Subscription stub layout.
    pub subscription: SubscriptionConfig,
    /// Document rendering switches.
    pub render: RenderConfig,
    /// Logging settings.
    pub telemetry: TelemetryConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: defaults::DATABASE_URL.to_string(),
            paths: PathsConfig::default(),
            subscription: SubscriptionConfig::default(),
            render: RenderConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

/// File locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Rendered proxy configuration.
    pub config_output: PathBuf,
    /// Directory of per-user client documents.
    pub users_dir: PathBuf,
    /// Directory of per-user subscription stubs.
    pub sub_dir: PathBuf,
    /// Client document template.
    pub template: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            config_output: PathBuf::from(defaults::CONFIG_OUTPUT),
            users_dir: PathBuf::from(defaults::USERS_DIR),
            sub_dir: PathBuf::from(defaults::SUB_DIR),
            template: PathBuf::from(defaults::TEMPLATE),
        }
    }
}

/// Layout of the subscription stubs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SubscriptionConfig {
    /// URL prefix the subscription token is appended to.
    pub route_prefix: String,
    /// Directory the web server reads client documents from.
    pub alias_root: String,
    /// Extension of client documents, without a leading dot.
    pub document_ext: String,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            route_prefix: defaults::ROUTE_PREFIX.to_string(),
            alias_root: defaults::ALIAS_ROOT.to_string(),
            document_ext: defaults::DOCUMENT_EXT.to_string(),
        }
    }
}

/// Rendering switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Attach subscription tokens to inbound user entries.
    pub include_user_sub: bool,
}

/// Log output format choice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormatChoice {
    /// Pretty in debug builds, JSON otherwise.
    #[default]
    Auto,
    /// Structured JSON lines.
    Json,
    /// Human-readable output.
    Pretty,
}

impl LogFormatChoice {
    /// Lowercase name as accepted in files and the environment.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Json => "json",
            Self::Pretty => "pretty",
        }
    }
}

impl fmt::Display for LogFormatChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogFormatChoice {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            _ => Err(ConfigError::invalid(
                "telemetry",
                "format",
                Some(value.to_string()),
                "must be one of auto, json, pretty",
            )),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TelemetryConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    /// Output format.
    pub format: LogFormatChoice,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            format: LogFormatChoice::Auto,
        }
    }
}
