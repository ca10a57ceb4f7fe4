//! Per-user subscription stubs for the fronting web server.
//!
//! Each active user gets a `location` block mapping their subscription route
//! onto their client document. Regeneration is a manifest diff: current stubs
//! are written (or left alone when already identical) before anything stale
//! is deleted, so a failed run never leaves the directory emptier than it was.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use boxforge_data::UserRow;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::atomic::{holds_bytes, write_atomic};
use crate::error::{FsOpsError, FsOpsResult};
use crate::names::validate_file_stem;
use crate::report::EmitReport;

/// Route and alias settings baked into every stub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubLayout {
    /// URL prefix the subscription token is appended to.
    pub route_prefix: String,
    /// Directory the web server reads client documents from.
    pub alias_root: String,
    /// Extension of the client documents.
    pub document_ext: String,
}

impl Default for StubLayout {
    fn default() -> Self {
        Self {
            route_prefix: "/sub".to_string(),
            alias_root: "/etc/sing-box/users".to_string(),
            document_ext: "json".to_string(),
        }
    }
}

impl StubLayout {
    /// Render the stub text for a user.
    #[must_use]
    pub fn render(&self, user: &UserRow) -> String {
        format!(
            "location {}/{} {{\n    alias {}/{}.{};\n}}",
            self.route_prefix.trim_end_matches('/'),
            user.sub,
            self.alias_root.trim_end_matches('/'),
            user.name,
            self.document_ext,
        )
    }
}

/// Keeps a directory of subscription stubs in sync with the active users.
#[derive(Debug, Clone)]
pub struct StubEmitter {
    sub_dir: PathBuf,
    layout: StubLayout,
}

impl StubEmitter {
    /// Emit stubs into `sub_dir` using `layout`.
    #[must_use]
    pub fn new(sub_dir: impl Into<PathBuf>, layout: StubLayout) -> Self {
        Self {
            sub_dir: sub_dir.into(),
            layout,
        }
    }

    /// Directory managed by this emitter.
    #[must_use]
    pub fn sub_dir(&self) -> &Path {
        &self.sub_dir
    }

    /// Regenerate stubs for the active users in `users`.
    ///
    /// # Errors
    ///
    /// Returns [`FsOpsError::Io`] when the stub directory cannot be created
    /// or listed, and [`FsOpsError::NothingWritten`] when users were eligible
    /// but none of their stubs could be produced. Stale files are left alone
    /// in both cases.
    pub fn emit(&self, users: &[UserRow]) -> FsOpsResult<EmitReport> {
        fs::create_dir_all(&self.sub_dir)
            .map_err(|source| FsOpsError::io("stubs.create_dir", &self.sub_dir, source))?;

        let mut report = EmitReport::default();
        let mut manifest = BTreeSet::new();
        let mut attempted = 0_usize;

        for user in users {
            if !user.active {
                debug!(user = %user.name, "skipping inactive user");
                continue;
            }
            attempted += 1;

            if let Err(err) = validate_file_stem(&user.name) {
                warn!(
                    user = %user.name,
                    error = %err,
                    "rejected user name for subscription stub"
                );
                report.fail(&user.name, "user name is not a valid file name");
                continue;
            }
            // A current user keeps its previous stub even if this write fails.
            manifest.insert(user.name.clone());

            let path = self.sub_dir.join(&user.name);
            let contents = self.layout.render(user);
            if holds_bytes(&path, contents.as_bytes()) {
                debug!(path = %path.display(), "subscription stub unchanged");
                report.unchanged.push(path);
                continue;
            }
            match write_atomic(&path, contents.as_bytes()) {
                Ok(()) => {
                    info!(path = %path.display(), "generated subscription stub");
                    report.written.push(path);
                }
                Err(err) => {
                    warn!(user = %user.name, error = ?err, "failed to write subscription stub");
                    report.fail(&user.name, "subscription stub could not be written");
                }
            }
        }

        if attempted > 0 && report.produced() == 0 {
            return Err(FsOpsError::NothingWritten {
                operation: "stubs.emit",
                attempted,
            });
        }

        for stale in self.stale_files(&manifest)? {
            match fs::remove_file(&stale) {
                Ok(()) => {
                    info!(path = %stale.display(), "removed stale subscription stub");
                    report.removed.push(stale);
                }
                Err(err) => {
                    warn!(
                        path = %stale.display(),
                        error = %err,
                        "failed to remove stale subscription stub"
                    );
                }
            }
        }
        Ok(report)
    }

    fn stale_files(&self, manifest: &BTreeSet<String>) -> FsOpsResult<Vec<PathBuf>> {
        let mut stale = Vec::new();
        for entry in WalkDir::new(&self.sub_dir).min_depth(1).max_depth(1) {
            let entry =
                entry.map_err(|source| FsOpsError::walkdir("stubs.list", &self.sub_dir, source))?;
            if !entry.file_type().is_file() {
                debug!(path = %entry.path().display(), "leaving non-file entry in stub directory");
                continue;
            }
            let keep = entry
                .file_name()
                .to_str()
                .is_some_and(|name| manifest.contains(name));
            if !keep {
                stale.push(entry.into_path());
            }
        }
        stale.sort();
        Ok(stale)
    }
}
