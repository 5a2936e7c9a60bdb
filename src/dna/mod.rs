//! DNA sequence service.
//!
//! Each user may store one sequence over the alphabet `a`, `c`, `g`, `t` and
//! later ask whether it contains a given subsequence. Both operations ask the
//! configured [`Validator`](crate::validation::Validator) first and touch the
//! store only when the session is allowed.

mod error;
mod sequences;
mod service;

pub use error::Error;
pub use service::Dna;
