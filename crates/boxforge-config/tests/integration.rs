use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Result;
use boxforge_config::defaults::env;
use boxforge_config::{AppConfig, ConfigError, LogFormatChoice, load_with};
use boxforge_test_support::fixtures::{temp_dir, write_file};

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
        .collect();
    move |key: &str| vars.get(key).cloned()
}

#[test]
fn defaults_apply_without_file_or_environment() -> Result<()> {
    let config = load_with(None, lookup(&[]))?;
    assert_eq!(config, AppConfig::default());
    assert_eq!(config.paths.config_output, PathBuf::from("./config.json"));
    assert_eq!(config.subscription.route_prefix, "/sub");
    assert!(!config.render.include_user_sub);
    Ok(())
}

#[test]
fn file_values_override_defaults() -> Result<()> {
    let temp = temp_dir()?;
    let path = write_file(
        temp.path(),
        "boxforge.json",
        r#"{
            "database_url": "sqlite://records.db",
            "subscription": {"alias_root": "/srv/users"},
            "telemetry": {"format": "json"}
        }"#,
    )?;

    let config = load_with(Some(path.as_path()), lookup(&[]))?;

    assert_eq!(config.database_url, "sqlite://records.db");
    assert_eq!(config.subscription.alias_root, "/srv/users");
    assert_eq!(config.subscription.route_prefix, "/sub");
    assert_eq!(config.telemetry.format, LogFormatChoice::Json);
    Ok(())
}

#[test]
fn environment_overrides_file() -> Result<()> {
    let temp = temp_dir()?;
    let path = write_file(
        temp.path(),
        "boxforge.json",
        r#"{"paths": {"users_dir": "/from/file", "sub_dir": "/from/file/sub"}}"#,
    )?;

    let config = load_with(
        Some(path.as_path()),
        lookup(&[
            (env::USERS_DIR, "/from/env"),
            (env::SUB_DIR, "   "),
            (env::LOG_FORMAT, "pretty"),
            (env::LOG_LEVEL, "debug"),
        ]),
    )?;

    assert_eq!(config.paths.users_dir, PathBuf::from("/from/env"));
    assert_eq!(config.paths.sub_dir, PathBuf::from("/from/file/sub"));
    assert_eq!(config.telemetry.format, LogFormatChoice::Pretty);
    assert_eq!(config.telemetry.level, "debug");
    Ok(())
}

#[test]
fn missing_file_is_an_io_error() -> Result<()> {
    let temp = temp_dir()?;
    let missing = temp.path().join("absent.json");
    let err = load_with(Some(missing.as_path()), lookup(&[])).expect_err("file is missing");
    assert!(matches!(err, ConfigError::Io { .. }));
    Ok(())
}

#[test]
fn malformed_file_is_a_parse_error() -> Result<()> {
    let temp = temp_dir()?;
    let path = write_file(temp.path(), "bad.json", r#"{"paths": {"unknown": 1}}"#)?;
    let err = load_with(Some(path.as_path()), lookup(&[])).expect_err("unknown field");
    assert!(matches!(err, ConfigError::Parse { .. }));
    Ok(())
}

#[test]
fn invalid_environment_values_fail_validation() {
    let err = load_with(None, lookup(&[(env::LOG_FORMAT, "xml")])).expect_err("bad format");
    assert!(matches!(
        err,
        ConfigError::InvalidField {
            field: "format",
            ..
        }
    ));
}
