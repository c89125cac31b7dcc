pub mod api;
pub mod logging;
pub mod storage;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ColorChoice, Command,
};

pub const ARG_USERNAME: &str = "username";
pub const ARG_PASSWORD: &str = "password";
pub const ARG_PATH: &str = "path";
pub const ARG_INTERVAL: &str = "interval";

fn subcommands(command: Command) -> Command {
    command
        .subcommand(
            Command::new("login")
                .about("Sign in and persist the token pair")
                .arg(
                    Arg::new(ARG_USERNAME)
                        .short('u')
                        .long(ARG_USERNAME)
                        .help("Account username")
                        .env("PORTAL_USERNAME")
                        .required(true),
                )
                .arg(
                    Arg::new(ARG_PASSWORD)
                        .short('p')
                        .long(ARG_PASSWORD)
                        .help("Account password")
                        .env("PORTAL_PASSWORD")
                        .hide_env_values(true)
                        .required(true),
                ),
        )
        .subcommand(Command::new("status").about("Restore the stored session and show who is signed in"))
        .subcommand(Command::new("logout").about("Sign out and clear stored tokens"))
        .subcommand(
            Command::new("route")
                .about("Show where navigating to a path would lead")
                .arg(
                    Arg::new(ARG_PATH)
                        .help("Route path, for example /feedbacks/42")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("watch")
                .about("Keep the stored session alive until it expires or Ctrl-C")
                .arg(
                    Arg::new(ARG_INTERVAL)
                        .long(ARG_INTERVAL)
                        .help("Seconds between validations")
                        .env("PORTAL_SESSION_INTERVAL")
                        .default_value("600")
                        .value_parser(clap::value_parser!(u64).range(1..)),
                ),
        )
}

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

    let command = Command::new("portal-session")
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true);

    let command = subcommands(command);
    let command = api::with_args(command);
    let command = storage::with_args(command);
    logging::with_args(command)
}
