use thiserror::Error;

use tally_core::errors::StoreError;

pub mod member;

pub use member::SqlMemberRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for StoreError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Database(sqlx::Error::RowNotFound) => {
                StoreError::NotFound("row not found".to_string())
            }
            RepositoryError::Database(sqlx::Error::Database(db_error))
                if db_error.is_unique_violation() =>
            {
                StoreError::Conflict(db_error.message().to_string())
            }
            RepositoryError::Database(sqlx::Error::Database(db_error))
                if db_error.is_check_violation() =>
            {
                StoreError::Invalid(db_error.message().to_string())
            }
            RepositoryError::Database(other) => StoreError::Unavailable(other.to_string()),
            RepositoryError::Decode(message) => StoreError::Unavailable(message),
        }
    }
}
