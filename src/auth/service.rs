//! Signup, login, logout and validate against the auth store.

use anyhow::{Context, anyhow};
use argon2::Params;
use secrecy::{ExposeSecret, SecretString};
use std::{future::Future, time::Duration};
use tracing::{debug, instrument};

use super::{
    credentials::{self, CreateOutcome},
    error::Error,
    password::PasswordHashing,
    sessions,
    token::{SessionToken, constant_time_eq, hash_token},
};
use crate::store::Store;

const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

// Verified against when the user does not exist so both paths cost one Argon2 run.
const DUMMY_PASSWORD: &[u8] = b"helix-dummy-password";

#[derive(Clone, Debug)]
pub struct AuthConfig {
    store_timeout: Duration,
    argon2_params: Params,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            store_timeout: DEFAULT_STORE_TIMEOUT,
            argon2_params: Params::default(),
        }
    }

    /// Deadline for each operation, store round trips and hashing included.
    #[must_use]
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_argon2_params(mut self, params: Params) -> Self {
        self.argon2_params = params;
        self
    }

    #[must_use]
    pub fn store_timeout(&self) -> Duration {
        self.store_timeout
    }
}

/// The session authority. Sole writer of credential and session state.
#[derive(Debug)]
pub struct Auth {
    store: Store,
    config: AuthConfig,
    hashing: PasswordHashing,
    dummy_hash: String,
}

impl Auth {
    /// # Errors
    /// Returns an error if the dummy password hash cannot be computed.
    pub fn new(store: Store, config: AuthConfig) -> anyhow::Result<Self> {
        let hashing = PasswordHashing::new(config.argon2_params.clone());
        let dummy_hash = hashing
            .hash(DUMMY_PASSWORD)
            .context("failed to prepare dummy password hash")?;

        Ok(Self {
            store,
            config,
            hashing,
            dummy_hash,
        })
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Register a new credential. Does not log the user in.
    ///
    /// # Errors
    /// `DuplicateUser` if `user` already has a credential, `Store` on driver
    /// failures, `Cancelled` when the deadline elapses.
    #[instrument(skip(self, password))]
    pub async fn signup(&self, user: &str, password: &SecretString) -> Result<(), Error> {
        self.bounded(async {
            let hash = self.hash_password(password).await?;

            // Inside a transaction so a cancelled signup rolls the row back
            // instead of committing it once the write lock frees up.
            let mut tx = self.store.pool().begin().await?;
            match credentials::create(&mut *tx, user, &hash).await? {
                CreateOutcome::Created => {
                    tx.commit().await?;
                    debug!("credential created");
                    Ok(())
                }
                CreateOutcome::Duplicate => {
                    tx.rollback().await?;
                    Err(Error::DuplicateUser)
                }
            }
        })
        .await
    }

    /// Verify the password and issue a fresh token, replacing any previous one.
    ///
    /// # Errors
    /// `BadAuth` for an unknown user or a wrong password, `Store` on driver
    /// failures, `Cancelled` when the deadline elapses.
    #[instrument(skip(self, password))]
    pub async fn login(&self, user: &str, password: &SecretString) -> Result<SessionToken, Error> {
        self.bounded(async {
            let stored = credentials::lookup(self.store.pool(), user).await?;
            let verified = self.verify_password(password, stored.as_deref()).await?;
            let Some(stored) = stored.filter(|_| verified) else {
                return Err(Error::BadAuth);
            };

            let token = SessionToken::generate()?;

            // Write first so the transaction holds the write lock from its
            // first statement, then confirm the verified credential is still
            // the stored one.
            let mut tx = self.store.pool().begin().await?;
            sessions::put(&mut *tx, user, &hash_token(token.as_str())).await?;
            let current = credentials::lookup(&mut *tx, user).await?;
            if current.as_deref() != Some(stored.as_str()) {
                tx.rollback().await?;
                return Err(Error::BadAuth);
            }
            tx.commit().await?;

            debug!("session issued");
            Ok(token)
        })
        .await
    }

    /// End the session, but only if `token` is the current one.
    ///
    /// # Errors
    /// `BadAuth` when there is no session or the token is stale, `Store` on
    /// driver failures, `Cancelled` when the deadline elapses.
    #[instrument(skip(self, token))]
    pub async fn logout(&self, user: &str, token: &str) -> Result<(), Error> {
        self.bounded(async {
            let mut tx = self.store.pool().begin().await?;
            if !sessions::delete(&mut *tx, user, &hash_token(token)).await? {
                return Err(Error::BadAuth);
            }
            tx.commit().await?;

            debug!("session removed");
            Ok(())
        })
        .await
    }

    /// Check that `token` is the current session token for `user`. Read-only.
    ///
    /// # Errors
    /// `BadAuth` when there is no session or the token does not match,
    /// `Store` on driver failures, `Cancelled` when the deadline elapses.
    #[instrument(skip(self, token))]
    pub async fn validate(&self, user: &str, token: &str) -> Result<(), Error> {
        self.bounded(async {
            match sessions::get(self.store.pool(), user).await? {
                Some(stored) if constant_time_eq(&stored, &hash_token(token)) => Ok(()),
                _ => Err(Error::BadAuth),
            }
        })
        .await
    }

    async fn bounded<T, F>(&self, op: F) -> Result<T, Error>
    where
        F: Future<Output = Result<T, Error>>,
    {
        tokio::time::timeout(self.config.store_timeout, op)
            .await
            .map_err(|_| Error::Cancelled)?
    }

    async fn hash_password(&self, password: &SecretString) -> Result<String, Error> {
        let hashing = self.hashing.clone();
        let password = SecretString::from(password.expose_secret().to_owned());
        let hash = tokio::task::spawn_blocking(move || {
            hashing.hash(password.expose_secret().as_bytes())
        })
        .await
        .context("password hashing task failed")??;
        Ok(hash)
    }

    /// Returns `false` for an absent credential after verifying against the
    /// dummy hash, so unknown users take as long as wrong passwords.
    async fn verify_password(
        &self,
        password: &SecretString,
        stored: Option<&str>,
    ) -> Result<bool, Error> {
        let hashing = self.hashing.clone();
        let password = SecretString::from(password.expose_secret().to_owned());
        let (hash, known) = match stored {
            Some(hash) => (hash.to_owned(), true),
            None => (self.dummy_hash.clone(), false),
        };
        let matches = tokio::task::spawn_blocking(move || {
            hashing.verify(password.expose_secret().as_bytes(), &hash)
        })
        .await
        .map_err(|e| anyhow!("password verification task failed: {e}"))??;
        Ok(known && matches)
    }
}
