pub mod auth;
pub mod dna;
pub mod logging;
pub mod monolith;

use clap::{
    Arg, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

pub const ARG_ADDRESS: &str = "address";
pub const ARG_PORT: &str = "port";
pub const ARG_STORE_TIMEOUT_MS: &str = "store-timeout-ms";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("helix")
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(auth::command())
        .subcommand(dna::command())
        .subcommand(monolith::command());

    logging::with_args(command)
}

fn address_arg(env: &'static str) -> Arg {
    Arg::new(ARG_ADDRESS)
        .short('a')
        .long("address")
        .help("Address to bind")
        .default_value("127.0.0.1")
        .env(env)
}

fn port_arg(env: &'static str, default: &'static str) -> Arg {
    Arg::new(ARG_PORT)
        .short('p')
        .long("port")
        .help("Port to listen on")
        .default_value(default)
        .env(env)
        .value_parser(clap::value_parser!(u16))
}

fn store_timeout_arg() -> Arg {
    Arg::new(ARG_STORE_TIMEOUT_MS)
        .long("store-timeout-ms")
        .help("Deadline in milliseconds for each auth store operation")
        .default_value("5000")
        .env("HELIX_STORE_TIMEOUT_MS")
        .value_parser(clap::value_parser!(u64).range(1..))
}
