use crate::{
    api,
    auth::{Auth, AuthConfig},
    cli::actions::server,
    dna::Dna,
    store::{AUTH_SCHEMA, DNA_SCHEMA, Store},
};
use anyhow::Result;
use std::{sync::Arc, time::Duration};
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub address: String,
    pub port: u16,
    pub auth_dsn: String,
    pub dna_dsn: String,
    pub store_timeout: Duration,
}

/// Run both services in one process until terminated. DNA validates
/// sessions in-process.
/// # Errors
/// Returns an error if either store cannot be opened or the server fails.
pub async fn execute(args: Args) -> Result<()> {
    info!(
        address = %args.address,
        port = args.port,
        auth_dsn = %server::redact_dsn(&args.auth_dsn),
        dna_dsn = %server::redact_dsn(&args.dna_dsn),
        store_timeout_ms = args.store_timeout.as_millis(),
        "Starting monolith"
    );

    let auth_store = Store::open(&args.auth_dsn, AUTH_SCHEMA).await?;
    let dna_store = match Store::open(&args.dna_dsn, DNA_SCHEMA).await {
        Ok(store) => store,
        Err(err) => {
            auth_store.close().await;
            return Err(err);
        }
    };

    let auth = Arc::new(Auth::new(
        auth_store.clone(),
        AuthConfig::new().with_store_timeout(args.store_timeout),
    )?);
    let dna = Arc::new(Dna::new(dna_store.clone(), auth.clone()));

    server::run(
        &args.address,
        args.port,
        api::monolith_router(auth, dna),
        &[&auth_store, &dna_store],
    )
    .await
}
