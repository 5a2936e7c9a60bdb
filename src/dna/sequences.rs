//! DNA persistence: `user → sequence`, inserted once.

use sqlx::SqlitePool;
use tracing::{Instrument, info_span};

use crate::store::is_unique_violation;

#[derive(Debug, PartialEq, Eq)]
pub(super) enum InsertOutcome {
    Inserted,
    Duplicate,
}

pub(super) async fn insert(
    pool: &SqlitePool,
    user: &str,
    sequence: &str,
) -> Result<InsertOutcome, sqlx::Error> {
    let query = "INSERT INTO dna (username, sequence) VALUES (?1, ?2)";
    let span = info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "INSERT",
        db.statement = query
    );
    match sqlx::query(query)
        .bind(user)
        .bind(sequence)
        .execute(pool)
        .instrument(span)
        .await
    {
        Ok(_) => Ok(InsertOutcome::Inserted),
        Err(err) if is_unique_violation(&err) => Ok(InsertOutcome::Duplicate),
        Err(err) => Err(err),
    }
}

pub(super) async fn get(pool: &SqlitePool, user: &str) -> Result<Option<String>, sqlx::Error> {
    let query = "SELECT sequence FROM dna WHERE username = ?1";
    let span = info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "SELECT",
        db.statement = query
    );
    sqlx::query_scalar(query)
        .bind(user)
        .fetch_optional(pool)
        .instrument(span)
        .await
}
