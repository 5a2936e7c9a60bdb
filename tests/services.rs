//! End-to-end tests running the real HTTP servers on ephemeral ports.

use anyhow::{Context, Result, anyhow};
use axum::Router;
use helix::{
    api,
    auth::{Auth, AuthConfig},
    dna::Dna,
    store::{AUTH_SCHEMA, DNA_SCHEMA, Store},
    validation::{RemoteConfig, RemoteValidator, Validation, ValidationError, Validator},
};
use reqwest::{Client, StatusCode};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};
use url::Url;

struct Server {
    addr: SocketAddr,
    stop: oneshot::Sender<()>,
    handle: JoinHandle<Result<()>>,
}

impl Server {
    async fn start(router: Router) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (stop, stopped) = oneshot::channel::<()>();
        let app = api::layered(router, api::DEFAULT_REQUEST_TIMEOUT);
        let handle = tokio::spawn(api::serve(listener, app, async move {
            let _ = stopped.await;
        }));
        Ok(Self { addr, stop, handle })
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    async fn shutdown(self) -> Result<()> {
        let _ = self.stop.send(());
        self.handle.await?
    }
}

fn auth_config() -> Result<AuthConfig> {
    let params = argon2::Params::new(8, 1, 1, None).map_err(|e| anyhow!("{e}"))?;
    Ok(AuthConfig::new().with_argon2_params(params))
}

async fn auth_service() -> Result<(Arc<Auth>, Server)> {
    let store = Store::in_memory(AUTH_SCHEMA).await?;
    let auth = Arc::new(Auth::new(store, auth_config()?)?);
    let server = Server::start(api::auth_router(auth.clone())).await?;
    Ok((auth, server))
}

async fn post_text(client: &Client, url: &str) -> Result<(StatusCode, String)> {
    let response = client.post(url).send().await?;
    Ok((response.status(), response.text().await?))
}

async fn get_text(client: &Client, url: &str) -> Result<(StatusCode, String)> {
    let response = client.get(url).send().await?;
    Ok((response.status(), response.text().await?))
}

fn remote(addr: SocketAddr) -> Result<RemoteValidator> {
    let url = Url::parse(&format!("http://{addr}"))?;
    RemoteValidator::new(
        RemoteConfig::new(url)
            .with_timeout(Duration::from_millis(500))
            .with_retries(1)
            .with_backoff(Duration::from_millis(1), Duration::from_millis(5)),
    )
}

#[tokio::test]
async fn remote_validator_against_live_auth() -> Result<()> {
    let (_auth, server) = auth_service().await?;
    let client = Client::new();

    let (status, body) = post_text(&client, &server.url("/signup?user=alice&pass=p1")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "signup successful\n");

    let (status, body) = post_text(&client, &server.url("/login?user=alice&pass=p1")).await?;
    assert_eq!(status, StatusCode::OK);
    let token = body.trim_end().to_string();

    let validator = remote(server.addr)?;
    assert_eq!(validator.validate("alice", &token).await?, Validation::Allowed);
    assert_eq!(validator.validate("alice", "stale").await?, Validation::Denied);
    assert_eq!(validator.validate("bob", &token).await?, Validation::Denied);

    server.shutdown().await
}

#[tokio::test]
async fn remote_validator_unavailable_when_auth_is_down() -> Result<()> {
    let (_auth, server) = auth_service().await?;
    let addr = server.addr;
    server.shutdown().await?;

    let validator = remote(addr)?;
    let result = validator.validate("alice", "token").await;
    assert!(matches!(result, Err(ValidationError::Unavailable(_))));
    Ok(())
}

#[tokio::test]
async fn split_services_end_to_end() -> Result<()> {
    let (_auth, auth_server) = auth_service().await?;

    let dna_store = Store::in_memory(DNA_SCHEMA).await?;
    let dna = Arc::new(Dna::new(dna_store, Arc::new(remote(auth_server.addr)?)));
    let dna_server = Server::start(api::dna_router(dna)).await?;
    let client = Client::new();

    post_text(&client, &auth_server.url("/signup?user=vincent&pass=p1")).await?;
    let (_, body) = post_text(&client, &auth_server.url("/login?user=vincent&pass=p1")).await?;
    let token = body.trim_end().to_string();

    let (status, body) = post_text(
        &client,
        &dna_server.url(&format!("/add?user=vincent&token={token}&sequence=gattaca")),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Add OK\n");

    let (status, body) = get_text(
        &client,
        &dna_server.url(&format!("/check?user=vincent&token={token}&subsequence=ttac")),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Subsequence found\n");

    let (status, _) = get_text(
        &client,
        &dna_server.url("/check?user=vincent&token=forged&subsequence=ttac"),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // With the auth service gone, DNA answers 503 rather than 401.
    auth_server.shutdown().await?;
    let (status, _) = get_text(
        &client,
        &dna_server.url(&format!("/check?user=vincent&token={token}&subsequence=ttac")),
    )
    .await?;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    dna_server.shutdown().await
}

#[tokio::test]
async fn monolith_end_to_end() -> Result<()> {
    let auth_store = Store::in_memory(AUTH_SCHEMA).await?;
    let dna_store = Store::in_memory(DNA_SCHEMA).await?;
    let auth = Arc::new(Auth::new(auth_store, auth_config()?)?);
    let dna = Arc::new(Dna::new(dna_store, auth.clone()));
    let server = Server::start(api::monolith_router(auth, dna)).await?;
    let client = Client::new();

    let (status, _) = post_text(&client, &server.url("/auth/signup?user=irene&pass=p1")).await?;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = post_text(&client, &server.url("/auth/login?user=irene&pass=p1")).await?;
    let token = body.trim_end().to_string();

    let (status, _) = post_text(
        &client,
        &server.url(&format!("/dna/add?user=irene&token={token}&sequence=acgt")),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = post_text(
        &client,
        &server.url(&format!("/auth/logout?user=irene&token={token}")),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = get_text(
        &client,
        &server.url(&format!("/dna/check?user=irene&token={token}&subsequence=cg")),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let response = client.get(server.url("/auth/health")).send().await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert!(response.headers().contains_key("x-app"));

    server.shutdown().await
}

#[tokio::test]
async fn on_disk_store_survives_concurrent_logins() -> Result<()> {
    let dir = std::env::temp_dir().join(format!("helix-it-{}", ulid::Ulid::new()));
    std::fs::create_dir_all(&dir)?;
    let dsn = format!("sqlite://{}", dir.join("auth.db").display());

    let result = async {
        let store = Store::open(&dsn, AUTH_SCHEMA).await?;
        let auth = Arc::new(Auth::new(store.clone(), auth_config()?)?);
        let password = secrecy::SecretString::from("p1".to_string());

        for user in ["alice", "bob", "carol"] {
            auth.signup(user, &password).await?;
        }

        let mut tasks = Vec::new();
        for round in 0..8 {
            let auth = auth.clone();
            let user = ["alice", "bob", "carol"][round % 3];
            tasks.push(tokio::spawn(async move {
                let password = secrecy::SecretString::from("p1".to_string());
                auth.login(user, &password)
                    .await
                    .map(|token| (user, token))
            }));
        }

        let mut issued = Vec::new();
        for task in tasks {
            issued.push(task.await??);
        }

        // Exactly one issued token per user is still current.
        for user in ["alice", "bob", "carol"] {
            let mut valid = 0;
            for (owner, token) in issued.iter().filter(|(owner, _)| *owner == user) {
                if auth.validate(owner, token.as_str()).await.is_ok() {
                    valid += 1;
                }
            }
            assert_eq!(valid, 1, "user {user}");
        }

        store.close().await;

        // Reopening sees the committed sessions.
        let reopened = Store::open(&dsn, AUTH_SCHEMA).await?;
        let (sessions,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sessions")
            .fetch_one(reopened.pool())
            .await?;
        reopened.close().await;
        assert_eq!(sessions, 3);
        Ok::<(), anyhow::Error>(())
    }
    .await;

    std::fs::remove_dir_all(&dir).context("failed to remove test database directory")?;
    result
}
