use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Credential or session mismatch. Never says which check failed.
    #[error("bad auth")]
    BadAuth,
    #[error("user already exists")]
    DuplicateUser,
    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),
    #[error("deadline exceeded")]
    Cancelled,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_auth_message_is_generic() {
        assert_eq!(Error::BadAuth.to_string(), "bad auth");
    }
}
