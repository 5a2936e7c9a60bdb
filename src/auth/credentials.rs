//! Credential persistence: `user → password hash`.
//!
//! Functions take any SQLite executor so they compose inside the caller's
//! transaction as well as directly against the pool.

use sqlx::{Executor, Sqlite};
use tracing::{Instrument, info_span};

use crate::store::is_unique_violation;

/// Outcome of inserting a credential row.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum CreateOutcome {
    Created,
    Duplicate,
}

pub(super) async fn create<'e, E>(
    executor: E,
    user: &str,
    password_hash: &str,
) -> Result<CreateOutcome, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let query = "INSERT INTO credentials (username, password_hash) VALUES (?1, ?2)";
    let span = info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "INSERT",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(user)
        .bind(password_hash)
        .execute(executor)
        .instrument(span)
        .await;

    match result {
        Ok(_) => Ok(CreateOutcome::Created),
        Err(err) if is_unique_violation(&err) => Ok(CreateOutcome::Duplicate),
        Err(err) => Err(err),
    }
}

pub(super) async fn lookup<'e, E>(executor: E, user: &str) -> Result<Option<String>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let query = "SELECT password_hash FROM credentials WHERE username = ?1";
    let span = info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "SELECT",
        db.statement = query
    );
    sqlx::query_scalar(query)
        .bind(user)
        .fetch_optional(executor)
        .instrument(span)
        .await
}
