//! Error types for Wallet

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Password hashing error: {0}")]
    Password(String),

    /// A name collision within the user's accounts, categories or logins
    #[error("{entity} '{name}' already exists")]
    AlreadyExists { entity: &'static str, name: String },

    #[error("Not found: {0}")]
    NotFound(String),

    /// Bulk import referenced an account or category keys the user does not own
    #[error(
        "Unprocessable operations for user {user_id}: unknown account {account:?}, unknown categories {category_keys:?}"
    )]
    UnprocessableOperations {
        user_id: i64,
        account: Option<i64>,
        category_keys: Vec<i64>,
    },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Authentication error: {0}")]
    Auth(String),
}

impl Error {
    /// Map a UNIQUE constraint violation to `AlreadyExists`, passing other errors through
    pub(crate) fn on_conflict(err: rusqlite::Error, entity: &'static str, name: &str) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(e, _)
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Error::AlreadyExists {
                    entity,
                    name: name.to_string(),
                }
            }
            other => Error::Database(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
