use async_trait::async_trait;

use super::{Validation, ValidationError, Validator};
use crate::auth::{Auth, Error};

/// In-process validation for services sharing a process with [`Auth`].
#[async_trait]
impl Validator for Auth {
    async fn validate(&self, user: &str, token: &str) -> Result<Validation, ValidationError> {
        match Auth::validate(self, user, token).await {
            Ok(()) => Ok(Validation::Allowed),
            Err(Error::BadAuth) => Ok(Validation::Denied),
            // The caller logs the mapped outcome.
            Err(err) => Err(ValidationError::Unavailable(err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::test_auth;
    use anyhow::Result;
    use secrecy::SecretString;
    use std::sync::Arc;

    #[tokio::test]
    async fn maps_auth_outcomes() -> Result<()> {
        let auth = Arc::new(test_auth().await?);
        let password = SecretString::from("p1".to_string());
        auth.signup("alice", &password).await?;
        let token = auth.login("alice", &password).await?;

        let validator: Arc<dyn Validator> = auth.clone();
        assert_eq!(
            validator.validate("alice", token.as_str()).await?,
            Validation::Allowed
        );
        assert_eq!(
            validator.validate("alice", "stale").await?,
            Validation::Denied
        );
        assert_eq!(validator.validate("nobody", "").await?, Validation::Denied);
        Ok(())
    }

    #[tokio::test]
    async fn store_failure_is_unavailable_not_denied() -> Result<()> {
        let auth = Arc::new(test_auth().await?);
        auth.store().close().await;

        let validator: Arc<dyn Validator> = auth;
        let result = validator.validate("alice", "token").await;
        let Err(ValidationError::Unavailable(reason)) = result else {
            panic!("expected unavailable, got {result:?}");
        };
        assert!(reason.starts_with("store error"), "{reason}");
        Ok(())
    }
}
