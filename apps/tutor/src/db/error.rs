//! Database error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("term not found: {0}")]
    TermNotFound(i64),

    #[error("invalid data: {0}")]
    InvalidData(String),
}
