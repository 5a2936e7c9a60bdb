use crate::dna::{Dna, Error};
use axum::{
    extract::{Extension, Query},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, warn};
use utoipa::IntoParams;

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AddParams {
    /// Username
    #[serde(default)]
    user: String,
    /// Session token issued by the auth service
    #[serde(default)]
    token: String,
    /// Sequence over `a`, `c`, `g`, `t`
    #[serde(default)]
    sequence: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CheckParams {
    /// Username
    #[serde(default)]
    user: String,
    /// Session token issued by the auth service
    #[serde(default)]
    token: String,
    /// Subsequence to look for
    #[serde(default)]
    subsequence: String,
}

#[utoipa::path(
    post,
    path = "/add",
    params(AddParams),
    responses (
        (status = 200, description = "Sequence stored", body = String, content_type = "text/plain"),
        (status = 400, description = "Invalid sequence", body = String),
        (status = 401, description = "Session not valid", body = String),
        (status = 409, description = "User already added a sequence", body = String),
        (status = 503, description = "Auth service unavailable", body = String),
    ),
    tag = "dna",
)]
pub async fn add(dna: Extension<Arc<Dna>>, Query(params): Query<AddParams>) -> (StatusCode, String) {
    match dna.add(&params.user, &params.token, &params.sequence).await {
        Ok(()) => (StatusCode::OK, "Add OK\n".to_string()),
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    get,
    path = "/check",
    params(CheckParams),
    responses (
        (status = 200, description = "Subsequence found", body = String, content_type = "text/plain"),
        (status = 401, description = "Session not valid", body = String),
        (status = 404, description = "Subsequence not found", body = String),
        (status = 503, description = "Auth service unavailable", body = String),
    ),
    tag = "dna",
)]
pub async fn check(
    dna: Extension<Arc<Dna>>,
    Query(params): Query<CheckParams>,
) -> (StatusCode, String) {
    match dna
        .check(&params.user, &params.token, &params.subsequence)
        .await
    {
        Ok(()) => (StatusCode::OK, "Subsequence found\n".to_string()),
        Err(err) => error_response(&err),
    }
}

fn error_response(err: &Error) -> (StatusCode, String) {
    let status = match err {
        Error::BadAuth => StatusCode::UNAUTHORIZED,
        Error::InvalidSequence => StatusCode::BAD_REQUEST,
        Error::DuplicateUser => StatusCode::CONFLICT,
        Error::SubsequenceNotFound => StatusCode::NOT_FOUND,
        Error::AuthUnavailable(_) => {
            warn!("DNA request refused: {err}");
            StatusCode::SERVICE_UNAVAILABLE
        }
        Error::InvalidUser => StatusCode::INTERNAL_SERVER_ERROR,
        Error::Store(_) => {
            error!("DNA operation failed: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error\n".to_string(),
            );
        }
    };
    (status, format!("{err}\n"))
}
