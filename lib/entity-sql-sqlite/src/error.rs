//! Error type for SQLite execution.

use entity_sql::CommandError;
use thiserror::Error;

/// Errors raised while generating or running a command on SQLite.
#[derive(Debug, Error)]
pub enum SqliteError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    /// A result value that has no JSON counterpart.
    #[error("Conversion error: {0}")]
    Conversion(String),
}

/// Convenience alias for results with [`SqliteError`].
pub type Result<T> = std::result::Result<T, SqliteError>;
