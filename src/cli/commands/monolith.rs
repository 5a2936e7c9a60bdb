use clap::{Arg, Command};

pub const ARG_AUTH_DSN: &str = "auth-dsn";
pub const ARG_DNA_DSN: &str = "dna-dsn";

#[must_use]
pub fn command() -> Command {
    Command::new("monolith")
        .about("Run both services in one process, auth under /auth and DNA under /dna")
        .arg(super::address_arg("HELIX_ADDRESS"))
        .arg(super::port_arg("HELIX_PORT", "8080"))
        .arg(
            Arg::new(ARG_AUTH_DSN)
                .long("auth-dsn")
                .help("Auth database connection string")
                .default_value("sqlite://auth.db")
                .env("HELIX_AUTH_DSN"),
        )
        .arg(
            Arg::new(ARG_DNA_DSN)
                .long("dna-dsn")
                .help("DNA database connection string")
                .default_value("sqlite://dna.db")
                .env("HELIX_DNA_DSN"),
        )
        .arg(super::store_timeout_arg())
}
