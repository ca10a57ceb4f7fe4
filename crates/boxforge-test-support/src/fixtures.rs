//! Filesystem fixtures and sample payloads.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

/// Client template with `uuid` keys at the top level, in a nested object, and
/// inside an array.
pub const CLIENT_TEMPLATE: &str = r#"{
  "log": { "level": "warn" },
  "outbounds": [
    {
      "type": "vless",
      "server": "proxy.example.com",
      "server_port": 443,
      "uuid": "PLACEHOLDER",
      "tls": { "enabled": true, "server_name": "proxy.example.com" }
    },
    { "type": "direct", "tag": "direct" }
  ]
}"#;

/// Create a scratch directory removed when the guard drops.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn temp_dir() -> Result<TempDir> {
    tempfile::Builder::new()
        .prefix("boxforge-")
        .tempdir()
        .context("failed to create temporary directory")
}

/// Write `contents` to `dir/name`, creating parent directories.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_file(dir: &Path, name: &str, contents: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(&path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

/// Sorted file names directly inside `dir`.
///
/// # Errors
///
/// Returns an error if the directory cannot be listed.
pub fn file_names(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))? {
        let entry = entry?;
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}
