use crate::{
    api,
    auth::{Auth, AuthConfig},
    cli::actions::server,
    store::{AUTH_SCHEMA, Store},
};
use anyhow::Result;
use std::{sync::Arc, time::Duration};
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub address: String,
    pub port: u16,
    pub dsn: String,
    pub store_timeout: Duration,
}

/// Run the auth service until terminated.
/// # Errors
/// Returns an error if the store cannot be opened or the server fails.
pub async fn execute(args: Args) -> Result<()> {
    info!(
        address = %args.address,
        port = args.port,
        dsn = %server::redact_dsn(&args.dsn),
        store_timeout_ms = args.store_timeout.as_millis(),
        "Starting auth service"
    );

    let store = Store::open(&args.dsn, AUTH_SCHEMA).await?;
    let auth = Arc::new(Auth::new(
        store.clone(),
        AuthConfig::new().with_store_timeout(args.store_timeout),
    )?);

    server::run(&args.address, args.port, api::auth_router(auth), &[&store]).await
}
