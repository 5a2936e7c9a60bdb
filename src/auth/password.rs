//! Argon2id password hashing.
//!
//! Hashes are stored as PHC strings, so each one carries its own salt and
//! parameters; verification always uses the parameters recorded in the hash.

use anyhow::{Result, anyhow};
use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::{SaltString, rand_core::OsRng},
};

#[derive(Clone, Debug)]
pub(super) struct PasswordHashing {
    params: Params,
}

impl PasswordHashing {
    pub(super) const fn new(params: Params) -> Self {
        Self { params }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a password under a fresh random salt.
    pub(super) fn hash(&self, password: &[u8]) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(password, &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| anyhow!("failed to hash password: {e}"))
    }

    /// Constant-time check of `password` against a stored PHC string.
    pub(super) fn verify(&self, password: &[u8], stored: &str) -> Result<bool> {
        let parsed =
            PasswordHash::new(stored).map_err(|e| anyhow!("invalid stored password hash: {e}"))?;
        Ok(self.argon2().verify_password(password, &parsed).is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hashing() -> Result<PasswordHashing> {
        let params = Params::new(8, 1, 1, None).map_err(|e| anyhow!("{e}"))?;
        Ok(PasswordHashing::new(params))
    }

    #[test]
    fn hash_then_verify() -> Result<()> {
        let hashing = hashing()?;
        let stored = hashing.hash(b"hunter2")?;
        assert!(stored.starts_with("$argon2id$"));
        assert!(!stored.contains("hunter2"));
        assert!(hashing.verify(b"hunter2", &stored)?);
        assert!(!hashing.verify(b"hunter3", &stored)?);
        Ok(())
    }

    #[test]
    fn salts_differ_between_hashes() -> Result<()> {
        let hashing = hashing()?;
        assert_ne!(hashing.hash(b"qwerty")?, hashing.hash(b"qwerty")?);
        Ok(())
    }

    #[test]
    fn verify_rejects_malformed_hash() -> Result<()> {
        let hashing = hashing()?;
        assert!(hashing.verify(b"qwerty", "qwerty").is_err());
        Ok(())
    }
}
