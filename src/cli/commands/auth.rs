use clap::{Arg, Command};

pub const ARG_DSN: &str = "dsn";

#[must_use]
pub fn command() -> Command {
    Command::new("auth")
        .about("Run the auth service: signup, login, validate and logout")
        .arg(super::address_arg("HELIX_AUTH_ADDRESS"))
        .arg(super::port_arg("HELIX_AUTH_PORT", "8081"))
        .arg(
            Arg::new(ARG_DSN)
                .short('d')
                .long("dsn")
                .help("Auth database connection string")
                .default_value("sqlite://auth.db")
                .env("HELIX_AUTH_DSN"),
        )
        .arg(super::store_timeout_arg())
}
