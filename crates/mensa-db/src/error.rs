use thiserror::Error;

/// Failure taxonomy for store operations. Uniqueness violations surface as
/// `Duplicate` so callers can translate them to wire-level conflicts without
/// inspecting SQLite error codes themselves.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("row violates a uniqueness constraint")]
    Duplicate,

    #[error("no matching row")]
    NotFound,

    #[error("rating must be between 1 and 5")]
    RatingOutOfRange,

    #[error("connection lock poisoned")]
    LockPoisoned,

    #[error("storage engine failure: {0}")]
    Sqlite(rusqlite::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(e, _) = &err {
            // Unique and primary-key violations both mean "this row already
            // exists"; FK and CHECK violations stay storage failures.
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
            {
                return StoreError::Duplicate;
            }
        }
        StoreError::Sqlite(err)
    }
}
