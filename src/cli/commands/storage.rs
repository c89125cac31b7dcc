use anyhow::{anyhow, Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::{fmt, path::PathBuf, str::FromStr};

pub const ARG_STORAGE: &str = "storage";
pub const ARG_STATE_FILE: &str = "state-file";
pub const ARG_PRODUCTION: &str = "production";

const STATE_DIR: &str = "portal-session";

/// Where tokens are kept between invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    /// JSON file without expiry, like browser local storage.
    File,
    /// Cookie jar with per-token max-age, mirrored to the state file.
    Cookie,
    /// Process memory only.
    Memory,
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => f.write_str("file"),
            Self::Cookie => f.write_str("cookie"),
            Self::Memory => f.write_str("memory"),
        }
    }
}

impl FromStr for StorageKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "file" => Ok(Self::File),
            "cookie" => Ok(Self::Cookie),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown storage: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub kind: StorageKind,
    pub state_file: PathBuf,
    pub production: bool,
}

impl Options {
    /// Parse storage arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the storage kind is unknown or no state file location
    /// can be resolved.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let kind = matches
            .get_one::<String>(ARG_STORAGE)
            .map_or(Ok(StorageKind::File), |value| value.parse::<StorageKind>())
            .map_err(|e| anyhow!(e))?;

        let state_file = match matches
            .get_one::<String>(ARG_STATE_FILE)
            .filter(|v| !v.trim().is_empty())
        {
            Some(path) => PathBuf::from(path),
            None => default_state_file(kind)?,
        };

        Ok(Self {
            kind,
            state_file,
            production: matches.get_flag(ARG_PRODUCTION),
        })
    }
}

/// `{data_dir}/portal-session/{session,cookies}.json`.
///
/// # Errors
/// Returns an error if neither the data directory nor the home directory is known.
pub fn default_state_file(kind: StorageKind) -> Result<PathBuf> {
    let mut path = dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut h| {
                h.push(".local");
                h.push("share");
                h
            })
        })
        .context("failed to resolve OS data directory - tried data_dir() and home_dir()/.local/share")?;

    path.push(STATE_DIR);
    path.push(match kind {
        StorageKind::Cookie => "cookies.json",
        StorageKind::File | StorageKind::Memory => "session.json",
    });

    Ok(path)
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_STORAGE)
                .long(ARG_STORAGE)
                .help("Token storage medium")
                .env("PORTAL_SESSION_STORAGE")
                .default_value("file")
                .value_parser(["file", "cookie", "memory"])
                .global(true),
        )
        .arg(
            Arg::new(ARG_STATE_FILE)
                .long(ARG_STATE_FILE)
                .help("Where tokens are stored (defaults to the OS data directory)")
                .env("PORTAL_SESSION_STATE_FILE")
                .global(true),
        )
        .arg(
            Arg::new(ARG_PRODUCTION)
                .long(ARG_PRODUCTION)
                .help("Mark cookies Secure and SameSite=Lax")
                .env("PORTAL_SESSION_PRODUCTION")
                .action(ArgAction::SetTrue)
                .global(true),
        )
}
