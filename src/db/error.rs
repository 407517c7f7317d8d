use anyhow::Error;
use rusqlite::{Error as SqlError, ErrorCode};
use thiserror::Error as ThisError;

/// Store failures with messages fit for the status footer. These sit at the
/// root of an `anyhow` chain so the UI can surface them directly instead of
/// showing raw SQLite chatter.
#[derive(Debug, ThisError)]
pub enum StoreError {
    /// A uniqueness rule was hit; the string names the offending record.
    #[error("{0} already exists.")]
    Duplicate(String),
    /// An update or delete touched zero rows.
    #[error("{0} not found")]
    NotFound(&'static str),
}

/// Coerce SQLite constraint violations into a [`StoreError::Duplicate`] that
/// names what collided. Anything else passes through untouched.
pub(super) fn map_duplicate(err: SqlError, what: String) -> Error {
    if matches!(
        err.sqlite_error_code(),
        Some(ErrorCode::ConstraintViolation)
    ) {
        StoreError::Duplicate(what).into()
    } else {
        err.into()
    }
}
