//! Atomic replacement of files that other processes read.

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::Builder;

use crate::error::{FsOpsError, FsOpsResult};

#[cfg(unix)]
const FILE_MODE: u32 = 0o644;

/// Replace `path` with `contents` so readers never observe a partial file.
///
/// The bytes go to a temporary file in the destination directory which is then
/// renamed over the target. Missing parent directories are created.
///
/// # Errors
///
/// Returns [`FsOpsError::Io`] when the directory, the temporary file, or the
/// final rename cannot be produced.
pub fn write_atomic(path: &Path, contents: &[u8]) -> FsOpsResult<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)
        .map_err(|source| FsOpsError::io("atomic.create_dir", parent, source))?;

    let mut staged = Builder::new()
        .prefix(".boxforge-")
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(|source| FsOpsError::io("atomic.tempfile", parent, source))?;
    staged
        .write_all(contents)
        .and_then(|()| staged.as_file().sync_all())
        .map_err(|source| FsOpsError::io("atomic.write", staged.path(), source))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        staged
            .as_file()
            .set_permissions(fs::Permissions::from_mode(FILE_MODE))
            .map_err(|source| FsOpsError::io("atomic.permissions", staged.path(), source))?;
    }

    staged
        .persist(path)
        .map_err(|err| FsOpsError::io("atomic.persist", path, err.error))?;
    Ok(())
}

/// Whether `path` already holds exactly `contents`.
///
/// A missing or unreadable file counts as different.
#[must_use]
pub fn holds_bytes(path: &Path, contents: &[u8]) -> bool {
    fs::read(path).is_ok_and(|existing| existing == contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxforge_test_support::fixtures::{file_names, temp_dir};

    #[test]
    fn write_atomic_replaces_contents_without_leftovers() -> anyhow::Result<()> {
        let temp = temp_dir()?;
        let target = temp.path().join("nested").join("config.json");

        write_atomic(&target, b"first")?;
        write_atomic(&target, b"second")?;

        assert_eq!(fs::read_to_string(&target)?, "second");
        assert_eq!(file_names(&temp.path().join("nested"))?, ["config.json"]);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn write_atomic_leaves_world_readable_files() -> anyhow::Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let temp = temp_dir()?;
        let target = temp.path().join("stub");
        write_atomic(&target, b"x")?;
        let mode = fs::metadata(&target)?.permissions().mode() & 0o777;
        assert_eq!(mode, FILE_MODE);
        Ok(())
    }

    #[test]
    fn holds_bytes_compares_exact_contents() -> anyhow::Result<()> {
        let temp = temp_dir()?;
        let target = temp.path().join("file");
        assert!(!holds_bytes(&target, b"x"));
        write_atomic(&target, b"x")?;
        assert!(holds_bytes(&target, b"x"));
        assert!(!holds_bytes(&target, b"x\n"));
        Ok(())
    }
}
