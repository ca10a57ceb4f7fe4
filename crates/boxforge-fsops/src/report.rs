//! Outcome summary shared by the per-user emitters.

use std::path::PathBuf;

use serde::Serialize;

/// A user whose file could not be produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmitFailure {
    /// Name of the user that was skipped.
    pub user: String,
    /// Human-readable cause.
    pub reason: String,
}

/// Files touched by one emitter run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EmitReport {
    /// Files whose contents were (re)written.
    pub written: Vec<PathBuf>,
    /// Files that already held the expected bytes.
    pub unchanged: Vec<PathBuf>,
    /// Stale files deleted after the run.
    pub removed: Vec<PathBuf>,
    /// Users that were skipped.
    pub failures: Vec<EmitFailure>,
}

impl EmitReport {
    /// Number of users that ended with a current file on disk.
    #[must_use]
    pub const fn produced(&self) -> usize {
        self.written.len() + self.unchanged.len()
    }

    pub(crate) fn fail(&mut self, user: &str, reason: impl ToString) {
        self.failures.push(EmitFailure {
            user: user.to_string(),
            reason: reason.to_string(),
        });
    }
}
