//! Error types for the chat store

use thiserror::Error;

/// Result type alias using the chat store's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Chat store error types.
///
/// Constraint violations are detected by the storage engine at statement
/// time and classified here; the store performs no local recovery. The
/// caller decides whether to retry (`is_retryable`), pick a different
/// value, or surface the failure.
#[derive(Error, Debug)]
pub enum Error {
    /// A unique column already holds this value (e.g. a duplicate
    /// primary email). Retrying unchanged will fail again.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// An insert or update referenced a parent row that does not exist,
    /// or was removed by a concurrent delete.
    #[error("foreign key violated: {0}")]
    ForeignKeyViolation(String),

    /// A value fell outside a column's closed literal set. Extending the
    /// set is a schema migration, not a data operation.
    #[error("value outside allowed set: {0}")]
    EnumViolation(String),

    /// A required column with no default was omitted or set to NULL.
    #[error("missing required column: {0}")]
    NotNullViolation(String),

    /// The write lost a race with a concurrent transaction. Safe to
    /// retry once the other transaction resolves.
    #[error("transaction conflict: {0}")]
    TransactionConflict(String),

    /// Any other database error
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl Error {
    /// Whether the caller may retry the failed operation unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::TransactionConflict(_))
    }
}

/// SQLite primary and extended result codes for lock contention
/// (SQLITE_BUSY, SQLITE_LOCKED and their extended forms).
fn is_busy(code: Option<&str>) -> bool {
    matches!(code, Some("5" | "6" | "261" | "262" | "517"))
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        use sqlx::error::ErrorKind;

        let classified = match &err {
            sqlx::Error::Database(db) => {
                let message = db.message().to_string();
                match db.kind() {
                    ErrorKind::UniqueViolation => Some(Error::UniqueViolation(message)),
                    ErrorKind::ForeignKeyViolation => Some(Error::ForeignKeyViolation(message)),
                    // The only CHECK constraints in the schema guard enum columns
                    ErrorKind::CheckViolation => Some(Error::EnumViolation(message)),
                    ErrorKind::NotNullViolation => Some(Error::NotNullViolation(message)),
                    _ if is_busy(db.code().as_deref()) => {
                        Some(Error::TransactionConflict(message))
                    }
                    _ => None,
                }
            }
            _ => None,
        };

        classified.unwrap_or(Error::Database(err))
    }
}
