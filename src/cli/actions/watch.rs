use crate::{cli::globals::GlobalArgs, guard::Navigation};
use anyhow::{bail, Context, Result};
use std::time::Duration;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub interval: Duration,
}

/// Execute the watch action: keep the stored session alive until it can no
/// longer be revalidated or the process is interrupted.
/// # Errors
/// Returns an error if there is no session to watch or it expires.
pub async fn execute(args: Args) -> Result<()> {
    let mut provider = args.globals.provider()?;

    if !provider.manager().restore().await {
        bail!("no valid session, run `portal-session login` first");
    }

    let mut redirects = provider.spawn_keeper(args.interval);
    if let Some(user) = provider.manager().user() {
        info!(username = %user.username, "watching session");
    }
    println!(
        "Keeping the session alive, validating about every {} seconds (Ctrl-C to stop)",
        args.interval.as_secs()
    );

    tokio::select! {
        redirect = redirects.recv() => {
            provider.shutdown().await;
            match redirect {
                Some(Navigation::Redirect(route)) => {
                    bail!("session expired, sign in again (redirect to {route})")
                }
                _ => bail!("session keeper stopped unexpectedly"),
            }
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for Ctrl-C")?;
            provider.shutdown().await;
            println!("Stopped");
            Ok(())
        }
    }
}
