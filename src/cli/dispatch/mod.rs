use crate::cli::{
    actions::{Action, auth, dna, monolith},
    commands::{self, ARG_ADDRESS, ARG_PORT, ARG_STORE_TIMEOUT_MS},
};
use anyhow::{Context, Result, anyhow};
use clap::ArgMatches;
use std::time::Duration;
use url::Url;

/// # Errors
/// Returns an error if required arguments are missing or invalid.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    match matches.subcommand() {
        Some(("auth", sub)) => Ok(Action::Auth(auth::Args {
            address: string(sub, ARG_ADDRESS)?,
            port: port(sub)?,
            dsn: string(sub, commands::auth::ARG_DSN)?,
            store_timeout: millis(sub, ARG_STORE_TIMEOUT_MS)?,
        })),
        Some(("dna", sub)) => {
            let auth_url = string(sub, commands::dna::ARG_AUTH_URL)?;
            let auth_url =
                Url::parse(&auth_url).with_context(|| format!("Invalid auth URL: {auth_url}"))?;

            Ok(Action::Dna(dna::Args {
                address: string(sub, ARG_ADDRESS)?,
                port: port(sub)?,
                dsn: string(sub, commands::dna::ARG_DSN)?,
                auth_url,
                auth_timeout: millis(sub, commands::dna::ARG_AUTH_TIMEOUT_MS)?,
                auth_retries: sub
                    .get_one::<u32>(commands::dna::ARG_AUTH_RETRIES)
                    .copied()
                    .context("missing required argument: --auth-retries")?,
                breaker_threshold: sub
                    .get_one::<usize>(commands::dna::ARG_AUTH_BREAKER_THRESHOLD)
                    .copied()
                    .context("missing required argument: --auth-breaker-threshold")?,
                breaker_reset: Duration::from_secs(
                    sub.get_one::<u64>(commands::dna::ARG_AUTH_BREAKER_RESET_SECONDS)
                        .copied()
                        .context("missing required argument: --auth-breaker-reset-seconds")?,
                ),
            }))
        }
        Some(("monolith", sub)) => Ok(Action::Monolith(monolith::Args {
            address: string(sub, ARG_ADDRESS)?,
            port: port(sub)?,
            auth_dsn: string(sub, commands::monolith::ARG_AUTH_DSN)?,
            dna_dsn: string(sub, commands::monolith::ARG_DNA_DSN)?,
            store_timeout: millis(sub, ARG_STORE_TIMEOUT_MS)?,
        })),
        Some((name, _)) => Err(anyhow!("unknown subcommand: {name}")),
        None => Err(anyhow!("missing subcommand")),
    }
}

fn string(matches: &ArgMatches, id: &str) -> Result<String> {
    matches
        .get_one::<String>(id)
        .cloned()
        .with_context(|| format!("missing required argument: --{id}"))
}

fn port(matches: &ArgMatches) -> Result<u16> {
    matches
        .get_one::<u16>(ARG_PORT)
        .copied()
        .context("missing required argument: --port")
}

fn millis(matches: &ArgMatches, id: &str) -> Result<Duration> {
    matches
        .get_one::<u64>(id)
        .copied()
        .map(Duration::from_millis)
        .with_context(|| format!("missing required argument: --{id}"))
}
