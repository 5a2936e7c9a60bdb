//! Auth service endpoints.
//!
//! Parameters arrive in the query string; missing ones are empty strings.
//! Responses are plain text terminated by a newline.

use crate::auth::{Auth, Error};
use axum::{
    extract::{Extension, Query},
    http::StatusCode,
};
use secrecy::SecretString;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, warn};
use utoipa::IntoParams;

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CredentialParams {
    /// Username
    #[serde(default)]
    user: String,
    /// Password
    #[serde(default)]
    pass: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SessionParams {
    /// Username
    #[serde(default)]
    user: String,
    /// Session token returned by `/login`
    #[serde(default)]
    token: String,
}

#[utoipa::path(
    post,
    path = "/signup",
    params(CredentialParams),
    responses (
        (status = 200, description = "User created", body = String, content_type = "text/plain"),
        (status = 409, description = "User already exists", body = String),
        (status = 500, description = "Store error", body = String),
    ),
    tag = "auth",
)]
pub async fn signup(
    auth: Extension<Arc<Auth>>,
    Query(params): Query<CredentialParams>,
) -> (StatusCode, String) {
    let password = SecretString::from(params.pass);
    match auth.signup(&params.user, &password).await {
        Ok(()) => (StatusCode::OK, "signup successful\n".to_string()),
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    post,
    path = "/login",
    params(CredentialParams),
    responses (
        (status = 200, description = "Session token", body = String, content_type = "text/plain"),
        (status = 401, description = "Bad credentials", body = String),
        (status = 500, description = "Store error", body = String),
    ),
    tag = "auth",
)]
pub async fn login(
    auth: Extension<Arc<Auth>>,
    Query(params): Query<CredentialParams>,
) -> (StatusCode, String) {
    let password = SecretString::from(params.pass);
    match auth.login(&params.user, &password).await {
        Ok(token) => (StatusCode::OK, format!("{}\n", token.as_str())),
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    get,
    path = "/validate",
    params(SessionParams),
    responses (
        (status = 200, description = "Token is the user's current session", body = String, content_type = "text/plain"),
        (status = 401, description = "No such session", body = String),
        (status = 500, description = "Store error", body = String),
    ),
    tag = "auth",
)]
pub async fn validate(
    auth: Extension<Arc<Auth>>,
    Query(params): Query<SessionParams>,
) -> (StatusCode, String) {
    match auth.validate(&params.user, &params.token).await {
        Ok(()) => (StatusCode::OK, "validate successful\n".to_string()),
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    post,
    path = "/logout",
    params(SessionParams),
    responses (
        (status = 200, description = "Session ended", body = String, content_type = "text/plain"),
        (status = 401, description = "No such session", body = String),
        (status = 500, description = "Store error", body = String),
    ),
    tag = "auth",
)]
pub async fn logout(
    auth: Extension<Arc<Auth>>,
    Query(params): Query<SessionParams>,
) -> (StatusCode, String) {
    match auth.logout(&params.user, &params.token).await {
        Ok(()) => (StatusCode::OK, "logout successful\n".to_string()),
        Err(err) => error_response(&err),
    }
}

fn error_response(err: &Error) -> (StatusCode, String) {
    match err {
        Error::BadAuth => (StatusCode::UNAUTHORIZED, format!("{err}\n")),
        Error::DuplicateUser => (StatusCode::CONFLICT, format!("{err}\n")),
        Error::Cancelled => {
            warn!("Auth operation cancelled: {err}");
            (StatusCode::SERVICE_UNAVAILABLE, format!("{err}\n"))
        }
        Error::Store(_) | Error::Internal(_) => {
            error!("Auth operation failed: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error\n".to_string(),
            )
        }
    }
}
