//! Error types for the todo store.

use std::path::PathBuf;

/// Result type alias for todo operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input, such as an empty title.
    Validation,
    /// Uniqueness violation on user fields.
    Conflict,
    /// The database is unreachable, uninitialized or corrupt.
    Storage,
}

/// Main error enum for the todo store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input rejected before touching the database.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// A unique field is already taken, or a row is still referenced.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database error.
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    /// The file exists but its schema is missing or out of date.
    #[error("Database at {} is not initialized. Run `todo init` first", .0.display())]
    NotInitialized(PathBuf),

    /// The file was written by a newer version of this crate.
    #[error("Database schema version {found} is newer than supported version {supported}")]
    UnsupportedSchema { found: i32, supported: i32 },

    /// A stored timestamp could not be parsed.
    #[error("Cannot parse timestamp: {0}")]
    InvalidTimestamp(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::Conflict(_) => ErrorKind::Conflict,
            Error::Db(_)
            | Error::NotInitialized(_)
            | Error::UnsupportedSchema { .. }
            | Error::InvalidTimestamp(_)
            | Error::Json(_) => ErrorKind::Storage,
        }
    }

    #[cfg(test)]
    pub(crate) fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    #[cfg(test)]
    pub(crate) fn is_conflict(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }

    #[cfg(test)]
    pub(crate) fn is_storage(&self) -> bool {
        self.kind() == ErrorKind::Storage
    }
}

/// True when `err` is SQLite rejecting a row for violating a UNIQUE constraint.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
