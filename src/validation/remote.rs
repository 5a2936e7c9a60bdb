//! Validation over HTTP against a remote auth service.
//!
//! `GET {base}/validate?user=..&token=..`: 200 is allowed, 401 is denied.
//! Transport errors and 5xx are transient and retried with exponential
//! backoff; every other status is unavailable without retry. Consecutive
//! unavailable outcomes trip a [`CircuitBreaker`].

use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::Rng;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

use super::{CircuitBreaker, Validation, ValidationError, Validator};
use crate::APP_USER_AGENT;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(1);
const DEFAULT_RETRIES: u32 = 2;
const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(50);
const DEFAULT_BACKOFF_MAX: Duration = Duration::from_secs(1);
const DEFAULT_BREAKER_THRESHOLD: usize = 5;
const DEFAULT_BREAKER_RESET: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub struct RemoteConfig {
    base_url: Url,
    timeout: Duration,
    connect_timeout: Duration,
    retries: u32,
    backoff_base: Duration,
    backoff_max: Duration,
    breaker_threshold: usize,
    breaker_reset: Duration,
}

impl RemoteConfig {
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            retries: DEFAULT_RETRIES,
            backoff_base: DEFAULT_BACKOFF_BASE,
            backoff_max: DEFAULT_BACKOFF_MAX,
            breaker_threshold: DEFAULT_BREAKER_THRESHOLD,
            breaker_reset: DEFAULT_BREAKER_RESET,
        }
    }

    /// Whole-request deadline for each attempt. The connect timeout is
    /// capped to it.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self.connect_timeout = self.connect_timeout.min(timeout);
        self
    }

    #[must_use]
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    #[must_use]
    pub fn with_backoff(mut self, base: Duration, max: Duration) -> Self {
        self.backoff_base = base;
        self.backoff_max = max.max(base);
        self
    }

    #[must_use]
    pub fn with_breaker(mut self, threshold: usize, reset: Duration) -> Self {
        self.breaker_threshold = threshold;
        self.breaker_reset = reset;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn retries(&self) -> u32 {
        self.retries
    }
}

#[derive(Debug)]
pub struct RemoteValidator {
    client: Client,
    validate_url: Url,
    retries: u32,
    backoff_base: Duration,
    backoff_max: Duration,
    breaker: CircuitBreaker,
}

enum Attempt {
    Answer(Validation),
    Transient(String),
    Failed(String),
}

impl RemoteValidator {
    /// # Errors
    /// Returns an error if the base URL cannot be extended or the HTTP client
    /// cannot be built.
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            validate_url: validate_url(&config.base_url)?,
            retries: config.retries,
            backoff_base: config.backoff_base,
            backoff_max: config.backoff_max,
            breaker: CircuitBreaker::new(config.breaker_threshold, config.breaker_reset),
        })
    }

    #[must_use]
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    async fn attempt(&self, user: &str, token: &str) -> Attempt {
        let response = self
            .client
            .get(self.validate_url.clone())
            .query(&[("user", user), ("token", token)])
            .send()
            .await;

        match response {
            Ok(response) => match response.status() {
                StatusCode::OK => Attempt::Answer(Validation::Allowed),
                StatusCode::UNAUTHORIZED => Attempt::Answer(Validation::Denied),
                status if status.is_server_error() => {
                    Attempt::Transient(format!("auth service returned {status}"))
                }
                status => Attempt::Failed(format!("unexpected status {status}")),
            },
            Err(err) => Attempt::Transient(format!("request failed: {err}")),
        }
    }
}

#[async_trait]
impl Validator for RemoteValidator {
    async fn validate(&self, user: &str, token: &str) -> Result<Validation, ValidationError> {
        if !self.breaker.allow() {
            return Err(ValidationError::Unavailable("circuit open".to_string()));
        }

        let mut retry = 0;
        loop {
            match self.attempt(user, token).await {
                Attempt::Answer(validation) => {
                    self.breaker.record_success();
                    debug!(?validation, "Remote validation answered");
                    return Ok(validation);
                }
                Attempt::Transient(reason) if retry < self.retries => {
                    retry += 1;
                    let delay = backoff_delay(retry, self.backoff_base, self.backoff_max);
                    warn!(
                        retry,
                        delay_ms = delay.as_millis(),
                        "Remote validation failed, retrying: {reason}"
                    );
                    sleep(delay).await;
                }
                Attempt::Transient(reason) | Attempt::Failed(reason) => {
                    self.breaker.record_failure();
                    warn!("Remote validation unavailable: {reason}");
                    return Err(ValidationError::Unavailable(reason));
                }
            }
        }
    }
}

/// `{base}/validate`, keeping any path prefix on the base URL.
fn validate_url(base: &Url) -> Result<Url> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("validate")
        .with_context(|| format!("Invalid auth URL: {base}"))
}

fn backoff_delay(retry: u32, base: Duration, max: Duration) -> Duration {
    let shift = retry.saturating_sub(1).min(31);
    let factor = 1u32 << shift;
    let delay = base.checked_mul(factor).unwrap_or(max);
    let capped = if delay > max { max } else { delay };
    jitter_delay(capped)
}

fn jitter_delay(delay: Duration) -> Duration {
    let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
    if delay_ms < 2 {
        return delay;
    }
    let half = delay_ms / 2;
    let jitter = rand::thread_rng().gen_range(0..=half);
    Duration::from_millis(half + jitter)
}
