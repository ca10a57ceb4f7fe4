//! Layered resolution: defaults, then an optional JSON file, then the
//! environment, then validation.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::defaults::env;
use crate::error::{ConfigError, ConfigResult};
use crate::model::AppConfig;
use crate::validate::validate;

/// Resolve the configuration from `file` and the process environment.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if the merged
/// result fails validation.
pub fn load(file: Option<&Path>) -> ConfigResult<AppConfig> {
    load_with(file, |key| std::env::var(key).ok())
}

/// Resolve the configuration reading variables through `lookup`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, if an environment
/// value cannot be parsed, or if the merged result fails validation.
pub fn load_with<F>(file: Option<&Path>, lookup: F) -> ConfigResult<AppConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match file {
        Some(path) => read_file(path)?,
        None => AppConfig::default(),
    };
    apply_env(&mut config, lookup)?;
    validate(&config)?;
    Ok(config)
}

fn read_file(path: &Path) -> ConfigResult<AppConfig> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "loaded configuration file");
    Ok(config)
}

fn apply_env<F>(config: &mut AppConfig, lookup: F) -> ConfigResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(url) = read(env::DATABASE_URL) {
        config.database_url = url;
    }
    if let Some(path) = read(env::OUTPUT) {
        config.paths.config_output = PathBuf::from(path);
    }
    if let Some(path) = read(env::USERS_DIR) {
        config.paths.users_dir = PathBuf::from(path);
    }
    if let Some(path) = read(env::SUB_DIR) {
        config.paths.sub_dir = PathBuf::from(path);
    }
    if let Some(path) = read(env::TEMPLATE) {
        config.paths.template = PathBuf::from(path);
    }
    if let Some(level) = read(env::LOG_LEVEL) {
        config.telemetry.level = level;
    }
    if let Some(format) = read(env::LOG_FORMAT) {
        config.telemetry.format = format.parse()?;
    }
    Ok(())
}
