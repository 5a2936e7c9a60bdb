use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::{debug, instrument};

use super::{
    error::Error,
    sequences::{self, InsertOutcome},
};
use crate::{
    store::Store,
    validation::{Validation, Validator},
};

/// Stores one DNA sequence per user. Every call is validated first.
pub struct Dna {
    store: Store,
    validator: Arc<dyn Validator>,
}

impl Dna {
    #[must_use]
    pub fn new(store: Store, validator: Arc<dyn Validator>) -> Self {
        Self { store, validator }
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Record `sequence` for `user`. Each user may add exactly one.
    ///
    /// # Errors
    /// `BadAuth`/`AuthUnavailable` from validation, `InvalidSequence` for
    /// anything outside `a`, `c`, `g`, `t`, `DuplicateUser` if the user
    /// already added one, `Store` on driver failures.
    #[instrument(skip(self, token, sequence))]
    pub async fn add(&self, user: &str, token: &str, sequence: &str) -> Result<(), Error> {
        self.authorize(user, token).await?;

        if !is_valid_sequence(sequence) {
            return Err(Error::InvalidSequence);
        }

        match sequences::insert(self.store.pool(), user, sequence).await? {
            InsertOutcome::Inserted => {
                debug!(len = sequence.len(), "sequence added");
                Ok(())
            }
            InsertOutcome::Duplicate => Err(Error::DuplicateUser),
        }
    }

    /// Succeeds iff the user's sequence contains `subsequence`.
    ///
    /// # Errors
    /// `BadAuth`/`AuthUnavailable` from validation, `InvalidUser` when the
    /// user has no sequence, `SubsequenceNotFound`, `Store` on driver
    /// failures.
    #[instrument(skip(self, token, subsequence))]
    pub async fn check(&self, user: &str, token: &str, subsequence: &str) -> Result<(), Error> {
        self.authorize(user, token).await?;

        let Some(sequence) = sequences::get(self.store.pool(), user).await? else {
            return Err(Error::InvalidUser);
        };

        if sequence.contains(subsequence) {
            Ok(())
        } else {
            Err(Error::SubsequenceNotFound)
        }
    }

    async fn authorize(&self, user: &str, token: &str) -> Result<(), Error> {
        match self.validator.validate(user, token).await? {
            Validation::Allowed => Ok(()),
            Validation::Denied => Err(Error::BadAuth),
        }
    }
}

static SEQUENCE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^[acgt]*$").ok());

fn is_valid_sequence(sequence: &str) -> bool {
    SEQUENCE.as_ref().is_some_and(|re| re.is_match(sequence))
}
