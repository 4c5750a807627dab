//! Store error types.

use thiserror::Error;

/// Result type alias using [`StoreError`].
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by a record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique field already holds the submitted value.
    #[error("unique constraint violated on {field}")]
    UniqueViolation {
        /// The constrained field.
        field: &'static str,
    },

    /// A record references a parent that does not exist.
    #[error("{field} references a missing record: {value}")]
    ForeignKey {
        /// The referencing field.
        field: &'static str,
        /// The dangling value.
        value: String,
    },

    /// The backing storage failed.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Creates a unique violation error.
    #[must_use]
    pub const fn unique(field: &'static str) -> Self {
        Self::UniqueViolation { field }
    }

    /// Creates a foreign key error.
    #[must_use]
    pub fn foreign_key(field: &'static str, value: impl ToString) -> Self {
        Self::ForeignKey {
            field,
            value: value.to_string(),
        }
    }

    /// Returns `true` for a unique constraint violation.
    #[must_use]
    pub const fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation { .. })
    }
}
