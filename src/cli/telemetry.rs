use anyhow::Result;
use std::{fmt as stdfmt, str::FromStr};
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

/// Log line rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line human output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl stdfmt::Display for LogFormat {
    fn fmt(&self, f: &mut stdfmt::Formatter<'_>) -> stdfmt::Result {
        match self {
            Self::Pretty => f.write_str("pretty"),
            Self::Json => f.write_str("json"),
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Builds the log filter. `RUST_LOG` directives are honored on top of the
/// verbosity default; HTTP internals stay quiet.
///
/// # Errors
///
/// Returns an error if a directive fails to parse
pub fn filter(verbosity_level: Option<Level>) -> Result<EnvFilter> {
    let verbosity_level = verbosity_level.unwrap_or(Level::ERROR);

    Ok(EnvFilter::builder()
        .with_default_directive(verbosity_level.into())
        .from_env_lossy()
        .add_directive("hyper=error".parse()?)
        .add_directive("reqwest=warn".parse()?))
}

/// Initialize logging
///
/// # Errors
///
/// Returns an error if the global subscriber is already set
pub fn init(verbosity_level: Option<Level>, format: LogFormat) -> Result<()> {
    let filter = filter(verbosity_level)?;

    match format {
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer()
                .with_file(false)
                .with_line_number(false)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_target(false)
                .with_writer(std::io::stderr)
                .pretty();
            tracing::subscriber::set_global_default(
                Registry::default().with(fmt_layer).with(filter),
            )?;
        }
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_timer(fmt::time::SystemTime)
                .with_target(false)
                .with_writer(std::io::stderr);
            tracing::subscriber::set_global_default(
                Registry::default().with(fmt_layer).with(filter),
            )?;
        }
    }

    Ok(())
}
