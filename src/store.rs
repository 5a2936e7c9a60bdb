//! Owned SQLite store handle.
//!
//! A [`Store`] is opened once at startup by the CLI action, handed to the
//! services that use it, and closed by the action after the server drains.

use anyhow::{Context, Result};
use sqlx::{
    Connection, SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
};
use std::{str::FromStr, time::Duration};
use tracing::{Instrument, debug, info_span};

pub const AUTH_SCHEMA: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/auth.sql"));
pub const DNA_SCHEMA: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/dna.sql"));

const MAX_CONNECTIONS: u32 = 5;

// Writers queue on the database lock for at most this long before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Debug)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (or create) the database behind `dsn` and apply `schema`.
    ///
    /// # Errors
    /// Returns an error if the DSN is invalid, the database cannot be opened,
    /// or the schema cannot be applied.
    pub async fn open(dsn: &str, schema: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(dsn)
            .with_context(|| format!("Invalid database DSN: {dsn}"))?;

        if is_memory_dsn(dsn) {
            return Self::memory(options, schema).await;
        }

        let options = options
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(MAX_CONNECTIONS)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        Self::with_schema(pool, schema).await
    }

    /// Open a private in-memory database.
    ///
    /// The pool holds a single connection that is never recycled: the
    /// database lives exactly as long as that connection.
    ///
    /// # Errors
    /// Returns an error if the connection cannot be established or the schema
    /// cannot be applied.
    pub async fn in_memory(schema: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .context("Invalid in-memory DSN")?;
        Self::memory(options, schema).await
    }

    // Memory DSNs keep their own options (shared cache, named database) but
    // always get a single long-lived connection.
    async fn memory(options: SqliteConnectOptions, schema: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .context("Failed to open in-memory database")?;

        Self::with_schema(pool, schema).await
    }

    async fn with_schema(pool: SqlitePool, schema: &str) -> Result<Self> {
        let span = info_span!(
            "db.query",
            db.system = "sqlite",
            db.operation = "MIGRATE"
        );
        sqlx::raw_sql(schema)
            .execute(&pool)
            .instrument(span)
            .await
            .context("Failed to apply database schema")?;

        debug!("database schema applied");

        Ok(Self { pool })
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Check that a connection can be acquired and answers a ping.
    ///
    /// # Errors
    /// Returns the underlying driver error.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        let span = info_span!("db.ping", db.system = "sqlite", db.operation = "PING");
        async {
            let mut conn = self.pool.acquire().await?;
            conn.ping().await
        }
        .instrument(span)
        .await
    }

    /// Close every pooled connection, waiting for checked-out ones to return.
    pub async fn close(&self) {
        self.pool.close().await;
        debug!("database pool closed");
    }
}

/// Whether a driver error is a primary-key or unique constraint collision.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

fn is_memory_dsn(dsn: &str) -> bool {
    dsn.contains(":memory:") || dsn.contains("mode=memory")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_dsn_detection() {
        assert!(is_memory_dsn("sqlite::memory:"));
        assert!(is_memory_dsn("sqlite://file:test?mode=memory"));
        assert!(!is_memory_dsn("sqlite://auth.db"));
    }

    #[tokio::test]
    async fn duplicate_primary_key_is_unique_violation() -> Result<()> {
        let store = Store::in_memory(DNA_SCHEMA).await?;
        let insert = "INSERT INTO dna (username, sequence) VALUES (?1, ?2)";
        sqlx::query(insert)
            .bind("vincent")
            .bind("gattaca")
            .execute(store.pool())
            .await?;
        let err = sqlx::query(insert)
            .bind("vincent")
            .bind("gattaca")
            .execute(store.pool())
            .await
            .err();
        assert!(err.as_ref().is_some_and(is_unique_violation));
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
        Ok(())
    }

    #[tokio::test]
    async fn in_memory_store_applies_schema_and_pings() -> Result<()> {
        let store = Store::in_memory(AUTH_SCHEMA).await?;
        store.ping().await?;

        let tables: Vec<(String,)> =
            sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
                .fetch_all(store.pool())
                .await?;
        let names: Vec<&str> = tables.iter().map(|(name,)| name.as_str()).collect();
        assert_eq!(names, vec!["credentials", "sessions"]);
        Ok(())
    }

    #[tokio::test]
    async fn memory_dsn_keeps_its_options() -> Result<()> {
        let store = Store::open("sqlite::memory:", AUTH_SCHEMA).await?;
        store.ping().await?;

        let dsn = format!("sqlite:file:helix-{}?mode=memory&cache=shared", ulid::Ulid::new());
        let store = Store::open(&dsn, DNA_SCHEMA).await?;
        sqlx::query("INSERT INTO dna (username, sequence) VALUES (?1, ?2)")
            .bind("vincent")
            .bind("gattaca")
            .execute(store.pool())
            .await?;

        // Options are parsed, not dropped in favor of a private database.
        assert!(Store::open("sqlite::memory:?mode=bogus", AUTH_SCHEMA)
            .await
            .is_err());
        Ok(())
    }

    #[tokio::test]
    async fn schema_is_idempotent() -> Result<()> {
        let store = Store::in_memory(DNA_SCHEMA).await?;
        sqlx::raw_sql(DNA_SCHEMA).execute(store.pool()).await?;
        Ok(())
    }

    #[tokio::test]
    async fn ping_fails_after_close() -> Result<()> {
        let store = Store::in_memory(AUTH_SCHEMA).await?;
        store.close().await;
        assert!(store.ping().await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn open_fails_when_directory_is_missing() {
        let path = std::env::temp_dir()
            .join(format!("helix-missing-{}", ulid::Ulid::new()))
            .join("auth.db");
        let dsn = format!("sqlite://{}", path.display());
        assert!(Store::open(&dsn, AUTH_SCHEMA).await.is_err());
    }
}
