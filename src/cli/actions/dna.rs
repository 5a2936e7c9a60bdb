use crate::{
    api,
    cli::actions::server,
    dna::Dna,
    store::{DNA_SCHEMA, Store},
    validation::{RemoteConfig, RemoteValidator},
};
use anyhow::Result;
use std::{sync::Arc, time::Duration};
use tracing::info;
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub address: String,
    pub port: u16,
    pub dsn: String,
    pub auth_url: Url,
    pub auth_timeout: Duration,
    pub auth_retries: u32,
    pub breaker_threshold: usize,
    pub breaker_reset: Duration,
}

/// Run the DNA service against a remote auth service until terminated.
/// # Errors
/// Returns an error if the store or HTTP client cannot be set up, or the
/// server fails.
pub async fn execute(args: Args) -> Result<()> {
    info!(
        address = %args.address,
        port = args.port,
        dsn = %server::redact_dsn(&args.dsn),
        auth_url = %args.auth_url,
        auth_timeout_ms = args.auth_timeout.as_millis(),
        auth_retries = args.auth_retries,
        "Starting DNA service"
    );

    let validator = RemoteValidator::new(
        RemoteConfig::new(args.auth_url)
            .with_timeout(args.auth_timeout)
            .with_retries(args.auth_retries)
            .with_breaker(args.breaker_threshold, args.breaker_reset),
    )?;

    let store = Store::open(&args.dsn, DNA_SCHEMA).await?;
    let dna = Arc::new(Dna::new(store.clone(), Arc::new(validator)));

    server::run(&args.address, args.port, api::dna_router(dna), &[&store]).await
}
