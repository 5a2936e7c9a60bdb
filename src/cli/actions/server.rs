//! Serving shared by every deployment shape.

use crate::{api, cli::telemetry, store::Store};
use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use url::Url;

/// Bind, serve until SIGINT/SIGTERM, then close `stores` and flush traces.
///
/// Stores are closed even when serving fails.
///
/// # Errors
/// Returns an error if the address cannot be bound or the server fails.
pub async fn run(address: &str, port: u16, router: Router, stores: &[&Store]) -> Result<()> {
    let served = async {
        let listener = TcpListener::bind((address, port))
            .await
            .with_context(|| format!("Failed to bind {address}:{port}"))?;
        let app = api::layered(router, api::DEFAULT_REQUEST_TIMEOUT);
        api::serve(listener, app, api::shutdown_signal()).await
    }
    .await;

    for store in stores {
        store.close().await;
    }
    telemetry::shutdown_tracer();

    served
}

/// DSN with any password replaced, safe to log.
#[must_use]
pub fn redact_dsn(dsn: &str) -> String {
    match Url::parse(dsn) {
        Ok(mut url) if url.password().is_some() => {
            if url.set_password(Some("****")).is_ok() {
                url.to_string()
            } else {
                "<redacted>".to_string()
            }
        }
        Ok(_) => dsn.to_string(),
        Err(_) => "<unparseable dsn>".to_string(),
    }
}
