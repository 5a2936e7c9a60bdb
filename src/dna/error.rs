use thiserror::Error;

use crate::validation::ValidationError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("bad auth")]
    BadAuth,
    #[error(transparent)]
    AuthUnavailable(#[from] ValidationError),
    #[error("invalid DNA sequence")]
    InvalidSequence,
    #[error("sequence already added")]
    DuplicateUser,
    #[error("invalid user")]
    InvalidUser,
    #[error("subsequence not found")]
    SubsequenceNotFound,
    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),
}
