//! Session token generation and hashing.

use anyhow::{Context, Result};
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};
use std::fmt;

const TOKEN_BYTES: usize = 32;

/// Opaque bearer credential returned by a successful login.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    /// Draw a fresh token from the OS generator.
    pub(super) fn generate() -> Result<Self> {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng
            .try_fill_bytes(&mut bytes)
            .context("failed to generate session token")?;
        Ok(Self(Base64UrlUnpadded::encode_string(&bytes)))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for SessionToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(***)")
    }
}

/// Hash a session token so raw values never touch the database.
pub(super) fn hash_token(token: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().to_vec()
}

pub(super) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_token_carries_32_bytes() -> Result<()> {
        let token = SessionToken::generate()?;
        let decoded = Base64UrlUnpadded::decode_vec(token.as_str())
            .map_err(|e| anyhow::anyhow!("token is not base64url: {e}"))?;
        assert_eq!(decoded.len(), TOKEN_BYTES);
        Ok(())
    }

    #[test]
    fn generated_tokens_differ() -> Result<()> {
        let first = SessionToken::generate()?;
        let second = SessionToken::generate()?;
        assert_ne!(first, second);
        Ok(())
    }

    #[test]
    fn hash_token_stable() {
        assert_eq!(hash_token("token"), hash_token("token"));
        assert_ne!(hash_token("token"), hash_token("other"));
        assert_eq!(hash_token("token").len(), 32);
    }

    #[test]
    fn constant_time_eq_works() {
        assert!(constant_time_eq(b"hello", b"hello"));
        assert!(!constant_time_eq(b"hello", b"world"));
        assert!(!constant_time_eq(b"short", b"longer"));
    }

    #[test]
    fn debug_output_is_redacted() -> Result<()> {
        let token = SessionToken::generate()?;
        let debug = format!("{token:?}");
        assert_eq!(debug, "SessionToken(***)");
        assert!(!debug.contains(token.as_str()));
        Ok(())
    }
}
