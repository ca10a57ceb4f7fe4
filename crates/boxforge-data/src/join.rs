//! Tri-state values for columns reached through a left outer join.
//!
//! A left join collapses two different situations into SQL `NULL`: the
//! referenced row exists but the column is null, or no row was joined at all
//! (absent or dangling foreign key). [`Joined`] keeps them apart so callers
//! decide on defaults explicitly.

use serde::Serialize;

/// A column value read through an optional join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case", tag = "state", content = "value")]
pub enum Joined<T> {
    /// The row was joined and the column holds a value.
    Value(T),
    /// The row was joined and the column is null.
    Null,
    /// No row was joined for this reference.
    #[default]
    Unjoined,
}

impl<T> Joined<T> {
    /// Build a tri-state from the joined row's key presence and the column value.
    #[must_use]
    pub fn from_column(row_joined: bool, value: Option<T>) -> Self {
        match (row_joined, value) {
            (false, _) => Self::Unjoined,
            (true, Some(value)) => Self::Value(value),
            (true, None) => Self::Null,
        }
    }

    /// Whether a row was joined, regardless of the column value.
    #[must_use]
    pub const fn is_joined(&self) -> bool {
        !matches!(self, Self::Unjoined)
    }

    /// Borrow the inner value.
    #[must_use]
    pub const fn as_ref(&self) -> Joined<&T> {
        match self {
            Self::Value(value) => Joined::Value(value),
            Self::Null => Joined::Null,
            Self::Unjoined => Joined::Unjoined,
        }
    }

    /// The value when present; `None` for both null and unjoined.
    #[must_use]
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Value(value) => Some(value),
            Self::Null | Self::Unjoined => None,
        }
    }
}

impl Joined<bool> {
    /// True only when the row was joined and the column is `true`.
    #[must_use]
    pub const fn is_true(&self) -> bool {
        matches!(self, Self::Value(true))
    }
}
