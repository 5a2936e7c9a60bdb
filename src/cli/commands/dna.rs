use clap::{Arg, Command};

pub const ARG_DSN: &str = "dsn";
pub const ARG_AUTH_URL: &str = "auth-url";
pub const ARG_AUTH_TIMEOUT_MS: &str = "auth-timeout-ms";
pub const ARG_AUTH_RETRIES: &str = "auth-retries";
pub const ARG_AUTH_BREAKER_THRESHOLD: &str = "auth-breaker-threshold";
pub const ARG_AUTH_BREAKER_RESET_SECONDS: &str = "auth-breaker-reset-seconds";

#[must_use]
pub fn command() -> Command {
    Command::new("dna")
        .about("Run the DNA service, validating sessions against a remote auth service")
        .arg(super::address_arg("HELIX_DNA_ADDRESS"))
        .arg(super::port_arg("HELIX_DNA_PORT", "8082"))
        .arg(
            Arg::new(ARG_DSN)
                .short('d')
                .long("dsn")
                .help("DNA database connection string")
                .default_value("sqlite://dna.db")
                .env("HELIX_DNA_DSN"),
        )
        .arg(
            Arg::new(ARG_AUTH_URL)
                .long("auth-url")
                .help("Base URL of the auth service, example: http://127.0.0.1:8081")
                .default_value("http://127.0.0.1:8081")
                .env("HELIX_AUTH_URL"),
        )
        .arg(
            Arg::new(ARG_AUTH_TIMEOUT_MS)
                .long("auth-timeout-ms")
                .help("Deadline in milliseconds for each validation request")
                .default_value("2000")
                .env("HELIX_AUTH_TIMEOUT_MS")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_AUTH_RETRIES)
                .long("auth-retries")
                .help("Retries after a transient validation failure")
                .default_value("2")
                .env("HELIX_AUTH_RETRIES")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new(ARG_AUTH_BREAKER_THRESHOLD)
                .long("auth-breaker-threshold")
                .help("Consecutive unavailable validations before failing fast, 0 disables")
                .default_value("5")
                .env("HELIX_AUTH_BREAKER_THRESHOLD")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new(ARG_AUTH_BREAKER_RESET_SECONDS)
                .long("auth-breaker-reset-seconds")
                .help("Seconds to fail fast before letting a trial validation through")
                .default_value("30")
                .env("HELIX_AUTH_BREAKER_RESET_SECONDS")
                .value_parser(clap::value_parser!(u64)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::{ARG_PORT, new};

    #[test]
    fn test_check_args() {
        let matches = new().get_matches_from(vec![
            "helix",
            "dna",
            "--port",
            "9002",
            "--auth-url",
            "http://auth.internal:8081",
            "--auth-timeout-ms",
            "500",
            "--auth-retries",
            "0",
            "--auth-breaker-threshold",
            "3",
            "--auth-breaker-reset-seconds",
            "10",
        ]);
        let Some(("dna", sub)) = matches.subcommand() else {
            panic!("expected dna subcommand");
        };
        assert_eq!(sub.get_one::<u16>(ARG_PORT).copied(), Some(9002));
        assert_eq!(
            sub.get_one::<String>(ARG_AUTH_URL).map(String::as_str),
            Some("http://auth.internal:8081")
        );
        assert_eq!(sub.get_one::<u64>(ARG_AUTH_TIMEOUT_MS).copied(), Some(500));
        assert_eq!(sub.get_one::<u32>(ARG_AUTH_RETRIES).copied(), Some(0));
        assert_eq!(
            sub.get_one::<usize>(ARG_AUTH_BREAKER_THRESHOLD).copied(),
            Some(3)
        );
        assert_eq!(
            sub.get_one::<u64>(ARG_AUTH_BREAKER_RESET_SECONDS).copied(),
            Some(10)
        );
    }

    #[test]
    fn test_check_env() {
        temp_env::with_vars(
            [
                ("HELIX_DNA_PORT", Some("7000")),
                ("HELIX_DNA_DSN", Some("sqlite::memory:")),
                ("HELIX_AUTH_URL", Some("http://10.0.0.5:8081")),
                ("HELIX_AUTH_RETRIES", Some("4")),
            ],
            || {
                let matches = new().get_matches_from(vec!["helix", "dna"]);
                let Some(("dna", sub)) = matches.subcommand() else {
                    panic!("expected dna subcommand");
                };
                assert_eq!(sub.get_one::<u16>(ARG_PORT).copied(), Some(7000));
                assert_eq!(
                    sub.get_one::<String>(ARG_DSN).map(String::as_str),
                    Some("sqlite::memory:")
                );
                assert_eq!(
                    sub.get_one::<String>(ARG_AUTH_URL).map(String::as_str),
                    Some("http://10.0.0.5:8081")
                );
                assert_eq!(sub.get_one::<u32>(ARG_AUTH_RETRIES).copied(), Some(4));
            },
        );
    }
}
