//! HTTP surface for the auth and DNA services.
//!
//! [`auth_router`] and [`dna_router`] serve one service each at `/`;
//! [`monolith_router`] nests them under `/auth` and `/dna`. [`layered`] adds
//! the request id, tracing and request timeout layers shared by every shape.

use crate::{auth::Auth, dna::Dna};
use anyhow::Result;
use axum::{
    Extension, Router,
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    routing::{get, post},
};
use std::{future::Future, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer,
    timeout::TimeoutLayer, trace::TraceLayer,
};
use tracing::{Span, info, info_span};
use ulid::Ulid;
use utoipa::OpenApi;

pub mod handlers;


use handlers::{auth, dna, health};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup,
        auth::login,
        auth::validate,
        auth::logout,
        dna::add,
        dna::check,
        health::health
    ),
    components(schemas(health::Health)),
    tags(
        (name = "auth", description = "Session token authority. Mounted at `/auth` in monolith mode"),
        (name = "dna", description = "DNA sequence store. Mounted at `/dna` in monolith mode"),
        (name = "health", description = "Service health")
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

/// Routes of the auth service.
#[must_use]
pub fn auth_router(auth: Arc<Auth>) -> Router {
    let store = auth.store().clone();
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/validate", get(auth::validate))
        .route("/logout", post(auth::logout))
        .route("/health", get(health::health).options(health::health))
        .layer(Extension(auth))
        .layer(Extension(store))
}

/// Routes of the DNA service.
#[must_use]
pub fn dna_router(dna: Arc<Dna>) -> Router {
    let store = dna.store().clone();
    Router::new()
        .route("/add", post(dna::add))
        .route("/check", get(dna::check))
        .route("/health", get(health::health).options(health::health))
        .layer(Extension(dna))
        .layer(Extension(store))
}

/// Both services in one router.
#[must_use]
pub fn monolith_router(auth: Arc<Auth>, dna: Arc<Dna>) -> Router {
    Router::new()
        .nest("/auth", auth_router(auth))
        .nest("/dna", dna_router(dna))
}

/// Wrap `router` with request id propagation, tracing and a request timeout.
#[must_use]
pub fn layered(router: Router, request_timeout: Duration) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestHeaderLayer::if_not_present(
                HeaderName::from_static("x-request-id"),
                |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
            ))
            .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                "x-request-id",
            )))
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(TimeoutLayer::new(request_timeout)),
    )
}

/// Serve `app` until `shutdown` resolves, then drain in-flight requests.
///
/// # Errors
/// Returns an error if the listener fails while serving.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Gracefully shutdown");

    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT"),
        () = terminate => info!("Received SIGTERM"),
    }
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
