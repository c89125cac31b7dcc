//! Maps validated CLI matches to an [`Action`].

use crate::cli::{
    actions::{login, logout, route, status, watch, Action},
    commands::{ARG_INTERVAL, ARG_PASSWORD, ARG_PATH, ARG_USERNAME},
    globals::GlobalArgs,
};
use anyhow::{anyhow, Context, Result};
use secrecy::SecretString;
use std::time::Duration;

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let globals = GlobalArgs::parse(matches)?;

    match matches.subcommand() {
        Some(("login", sub)) => {
            let username = sub
                .get_one::<String>(ARG_USERNAME)
                .cloned()
                .filter(|v| !v.trim().is_empty())
                .context("missing required argument: --username")?;
            let password = sub
                .get_one::<String>(ARG_PASSWORD)
                .cloned()
                .context("missing required argument: --password")?;

            Ok(Action::Login(login::Args {
                globals,
                username,
                password: SecretString::from(password),
            }))
        }
        Some(("status", _)) => Ok(Action::Status(status::Args { globals })),
        Some(("logout", _)) => Ok(Action::Logout(logout::Args { globals })),
        Some(("route", sub)) => {
            let path = sub
                .get_one::<String>(ARG_PATH)
                .cloned()
                .context("missing required argument: <path>")?;
            Ok(Action::Route(route::Args { globals, path }))
        }
        Some(("watch", sub)) => {
            let interval = sub
                .get_one::<u64>(ARG_INTERVAL)
                .copied()
                .map_or(crate::guard::DEFAULT_VALIDATION_INTERVAL, Duration::from_secs);
            Ok(Action::Watch(watch::Args { globals, interval }))
        }
        Some((other, _)) => Err(anyhow!("unknown command: {other}")),
        None => Err(anyhow!("missing command")),
    }
}
