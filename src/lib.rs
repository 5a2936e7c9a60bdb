//! # Helix (session tokens and the services that trust them)
//!
//! `helix` issues and validates opaque session tokens, and ships a DNA
//! sequence service that gates every request on that validation.
//!
//! ## Sessions
//!
//! A user has at most one valid token at any instant. Logging in again
//! replaces the previous token, logging out removes it. Tokens are 32 random
//! bytes from the OS generator; only their SHA-256 digest is stored.
//! Passwords are stored as Argon2id hashes.
//!
//! ## Validation boundary
//!
//! Dependent services ask a [`validation::Validator`] whether a `(user, token)`
//! pair is valid. The answer is `Allowed`, `Denied`, or an `Unavailable`
//! error when the auth subsystem cannot be reached. [`auth::Auth`] answers
//! in-process; [`validation::RemoteValidator`] asks an auth service over HTTP
//! with a deadline, bounded retries and a circuit breaker.

pub mod api;
pub mod auth;
pub mod cli;
pub mod dna;
pub mod store;
pub mod validation;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
