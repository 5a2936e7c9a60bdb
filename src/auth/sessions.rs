//! Session persistence: `user → token hash`, at most one row per user.

use sqlx::{Executor, Sqlite};
use tracing::{Instrument, info_span};

/// Upsert the session for `user`, replacing any previous token.
pub(super) async fn put<'e, E>(executor: E, user: &str, token_hash: &[u8]) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let query = r"
        INSERT INTO sessions (username, token_hash)
        VALUES (?1, ?2)
        ON CONFLICT (username) DO UPDATE SET token_hash = excluded.token_hash
    ";
    let span = info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "UPSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user)
        .bind(token_hash)
        .execute(executor)
        .instrument(span)
        .await?;

    Ok(())
}

pub(super) async fn get<'e, E>(executor: E, user: &str) -> Result<Option<Vec<u8>>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let query = "SELECT token_hash FROM sessions WHERE username = ?1";
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

/// Remove the session for `user` only if it still carries `token_hash`.
///
/// Returns `false` when no matching row existed. Check and delete are one
/// statement, so a concurrent login cannot slip in between them.
pub(super) async fn delete<'e, E>(
    executor: E,
    user: &str,
    token_hash: &[u8],
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let query = "DELETE FROM sessions WHERE username = ?1 AND token_hash = ?2";
    let span = info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "DELETE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(user)
        .bind(token_hash)
        .execute(executor)
        .instrument(span)
        .await?;

    Ok(result.rows_affected() > 0)
}
