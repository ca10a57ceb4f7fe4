//! Error types for the record store.

use std::error::Error;
use std::fmt::{self, Display, Formatter};

/// Result alias for record store operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors raised by the record store.
#[derive(Debug)]
pub enum DataError {
    /// Migration execution failed.
    MigrationFailed {
        /// Underlying migration error.
        source: sqlx::migrate::MigrateError,
    },
    /// A database operation failed.
    QueryFailed {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying SQL error.
        source: sqlx::Error,
    },
    /// A column could not be decoded into the expected shape.
    RowDecode {
        /// Operation identifier.
        operation: &'static str,
        /// Column that failed to decode.
        column: &'static str,
        /// Underlying SQL error.
        source: sqlx::Error,
    },
    /// A numeric column held a value outside the range of its target type.
    ColumnOutOfRange {
        /// Column that held the value.
        column: &'static str,
        /// Stored value.
        value: i64,
    },
}

impl DataError {
    /// Whether the error describes a malformed row rather than a failed statement.
    #[must_use]
    pub const fn is_row_shape(&self) -> bool {
        matches!(self, Self::RowDecode { .. } | Self::ColumnOutOfRange { .. })
    }
}

impl Display for DataError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::MigrationFailed { .. } => formatter.write_str("migration failed"),
            Self::QueryFailed { .. } => formatter.write_str("database operation failed"),
            Self::RowDecode { .. } => formatter.write_str("failed to decode row column"),
            Self::ColumnOutOfRange { .. } => formatter.write_str("column value out of range"),
        }
    }
}

impl Error for DataError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MigrationFailed { source } => Some(source),
            Self::QueryFailed { source, .. } | Self::RowDecode { source, .. } => Some(source),
            Self::ColumnOutOfRange { .. } => None,
        }
    }
}

impl From<sqlx::Error> for DataError {
    fn from(source: sqlx::Error) -> Self {
        Self::QueryFailed {
            operation: "sqlx operation",
            source,
        }
    }
}
