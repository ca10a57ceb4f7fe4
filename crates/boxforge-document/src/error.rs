//! Error types for projection and rendering.

use std::path::PathBuf;

use boxforge_data::DataError;
use boxforge_fsops::FsOpsError;
use thiserror::Error;

/// Failures while building the document from stored records.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// A table that must hold exactly one row is empty.
    #[error("required singleton row missing")]
    MissingSingleton {
        /// Table that was expected to hold the row.
        table: &'static str,
    },
    /// A stored row could not be read into the expected shape.
    #[error("failed to scan stored row")]
    Scan {
        /// Projection step that was reading.
        operation: &'static str,
        /// Underlying store error.
        source: DataError,
    },
    /// The store rejected a read.
    #[error("record store read failed")]
    Store {
        /// Projection step that was reading.
        operation: &'static str,
        /// Underlying store error.
        source: DataError,
    },
}

impl ProjectionError {
    pub(crate) fn from_store(operation: &'static str, source: DataError) -> Self {
        if source.is_row_shape() {
            Self::Scan { operation, source }
        } else {
            Self::Store { operation, source }
        }
    }
}

/// Failures while serializing or persisting the document.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The document tree could not be serialized.
    #[error("failed to serialize document")]
    Serialize {
        /// Underlying JSON error.
        source: serde_json::Error,
    },
    /// The serialized document could not be written.
    #[error("failed to write document")]
    Write {
        /// Destination path.
        path: PathBuf,
        /// Underlying filesystem error.
        source: FsOpsError,
    },
}

/// Failures of a full project-then-write run.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// Projection failed; nothing was written.
    #[error("document projection failed")]
    Projection(#[from] ProjectionError),
    /// Rendering failed; the previous file is intact.
    #[error("document render failed")]
    Render(#[from] RenderError),
}
