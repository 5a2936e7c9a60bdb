//! Credential and session management.
//!
//! Flow overview:
//! - Signup stores an Argon2id hash of the password. No session is created.
//! - Login verifies the password and upserts the user's single session row
//!   with the SHA-256 digest of a fresh random token.
//! - Validate is a point read plus a constant-time digest comparison.
//! - Logout deletes the session row only if it still carries the presented
//!   token, so a stale token can never end a newer session.
//!
//! Each operation runs under [`AuthConfig::store_timeout`]. When it elapses
//! (or the caller drops the future) any open transaction rolls back.

mod credentials;
mod error;
mod password;
mod service;
mod sessions;
mod token;

pub use error::Error;
pub use service::{Auth, AuthConfig};
pub use token::SessionToken;


/// In-memory `Auth` with cheap Argon2 parameters.
#[cfg(test)]
pub(crate) async fn test_auth() -> anyhow::Result<Auth> {
    let store = crate::store::Store::in_memory(crate::store::AUTH_SCHEMA).await?;
    test_auth_with(store, std::time::Duration::from_secs(5))
}

#[cfg(test)]
pub(crate) fn test_auth_with(
    store: crate::store::Store,
    store_timeout: std::time::Duration,
) -> anyhow::Result<Auth> {
    let params = argon2::Params::new(8, 1, 1, None).map_err(|e| anyhow::anyhow!("{e}"))?;
    let config = AuthConfig::new()
        .with_store_timeout(store_timeout)
        .with_argon2_params(params);
    Auth::new(store, config)
}
