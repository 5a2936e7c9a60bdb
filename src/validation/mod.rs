//! The validation boundary between the auth subsystem and the services that
//! trust it.
//!
//! A [`Validator`] answers one question: is `(user, token)` the current
//! session right now? Callers must treat [`ValidationError::Unavailable`] as
//! "no answer", never as a denial.

mod breaker;
mod local;
mod remote;

pub use breaker::CircuitBreaker;
pub use remote::{RemoteConfig, RemoteValidator};

use async_trait::async_trait;
use thiserror::Error;

/// A definitive answer from the auth subsystem.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Validation {
    Allowed,
    Denied,
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("auth unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait Validator: Send + Sync {
    /// # Errors
    /// `Unavailable` when no definitive answer could be obtained.
    async fn validate(&self, user: &str, token: &str) -> Result<Validation, ValidationError>;
}
