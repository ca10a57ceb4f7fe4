//! Validation of user names that become file names.

use crate::error::{FsOpsError, FsOpsResult};

/// Reject names that would escape or alias the output directory.
///
/// # Errors
///
/// Returns [`FsOpsError::InvalidInput`] for empty names, `.` and `..`, and
/// names containing a path separator or a NUL byte.
pub fn validate_file_stem(name: &str) -> FsOpsResult<()> {
    let reason = if name.is_empty() {
        Some("must not be empty")
    } else if name == "." || name == ".." {
        Some("must not be a relative path component")
    } else if name.contains(['/', '\\']) {
        Some("must not contain a path separator")
    } else if name.contains('\0') {
        Some("must not contain NUL")
    } else {
        None
    };

    reason.map_or(Ok(()), |reason| {
        Err(FsOpsError::InvalidInput {
            field: "user.name",
            reason,
            value: Some(name.to_string()),
        })
    })
}
