use crate::cli::globals::GlobalArgs;
use anyhow::Result;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
}

/// Execute the logout action. Local tokens are cleared even if the server is
/// unreachable.
/// # Errors
/// Returns an error if token storage cannot be opened.
pub async fn execute(args: Args) -> Result<()> {
    let provider = args.globals.provider()?;

    info!(api = %args.globals.api.base_url, "signing out");
    provider.sign_out().await;

    println!("Signed out");
    Ok(())
}
