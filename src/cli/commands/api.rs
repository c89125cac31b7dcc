use crate::api::{AppKind, API_URL_ENV, DEFAULT_TIMEOUT};
use anyhow::{anyhow, Result};
use clap::{Arg, ArgMatches, Command};
use std::time::Duration;

pub const ARG_API_URL: &str = "api-url";
pub const ARG_APP: &str = "app";
pub const ARG_TIMEOUT: &str = "timeout";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub api_url: Option<String>,
    pub app: AppKind,
    pub timeout: Option<Duration>,
}

impl Options {
    /// Parse API arguments from matches. A timeout of `0` disables it.
    ///
    /// # Errors
    /// Returns an error if the application name is unknown.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let api_url = matches
            .get_one::<String>(ARG_API_URL)
            .cloned()
            .filter(|v| !v.trim().is_empty());

        let app = matches
            .get_one::<String>(ARG_APP)
            .map_or(Ok(AppKind::Employee), |value| value.parse::<AppKind>())
            .map_err(|e| anyhow!(e))?;

        let timeout = match matches.get_one::<u64>(ARG_TIMEOUT).copied() {
            Some(0) => None,
            Some(seconds) => Some(Duration::from_secs(seconds)),
            None => Some(DEFAULT_TIMEOUT),
        };

        Ok(Self {
            api_url,
            app,
            timeout,
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_API_URL)
                .long(ARG_API_URL)
                .help("Backend base URL (defaults to the application's local backend)")
                .env(API_URL_ENV)
                .global(true),
        )
        .arg(
            Arg::new(ARG_APP)
                .long(ARG_APP)
                .help("Which portal the session belongs to")
                .env("PORTAL_APP")
                .default_value("employee")
                .value_parser(["admin", "employee"])
                .global(true),
        )
        .arg(
            Arg::new(ARG_TIMEOUT)
                .long(ARG_TIMEOUT)
                .help("Request timeout in seconds, 0 disables it")
                .env("PORTAL_SESSION_TIMEOUT")
                .default_value("10")
                .value_parser(clap::value_parser!(u64))
                .global(true),
        )
}
