//! Validation of a resolved configuration.

use std::path::Path;

use crate::error::{ConfigError, ConfigResult};
use crate::model::AppConfig;

/// Check that every field of `config` is usable.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] for the first field that fails.
pub fn validate(config: &AppConfig) -> ConfigResult<()> {
    if config.database_url.trim().is_empty() {
        return Err(ConfigError::invalid(
            "root",
            "database_url",
            None,
            "must not be empty",
        ));
    }

    require_path("config_output", &config.paths.config_output)?;
    require_path("users_dir", &config.paths.users_dir)?;
    require_path("sub_dir", &config.paths.sub_dir)?;
    require_path("template", &config.paths.template)?;

    let subscription = &config.subscription;
    if !subscription.route_prefix.starts_with('/') {
        return Err(ConfigError::invalid(
            "subscription",
            "route_prefix",
            Some(subscription.route_prefix.clone()),
            "must start with '/'",
        ));
    }
    if subscription.alias_root.trim().is_empty() {
        return Err(ConfigError::invalid(
            "subscription",
            "alias_root",
            None,
            "must not be empty",
        ));
    }
    validate_extension(&subscription.document_ext)?;

    if config.telemetry.level.trim().is_empty() {
        return Err(ConfigError::invalid(
            "telemetry",
            "level",
            None,
            "must not be empty",
        ));
    }
    Ok(())
}

fn require_path(field: &'static str, path: &Path) -> ConfigResult<()> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::invalid("paths", field, None, "must not be empty"));
    }
    Ok(())
}

fn validate_extension(ext: &str) -> ConfigResult<()> {
    let reason = if ext.is_empty() {
        Some("must not be empty")
    } else if ext.contains(['.', '/', '\\']) {
        Some("must not contain dots or path separators")
    } else {
        None
    };
    reason.map_or(Ok(()), |reason| {
        Err(ConfigError::invalid(
            "subscription",
            "document_ext",
            Some(ext.to_string()),
            reason,
        ))
    })
}
