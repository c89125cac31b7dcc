use crate::{cli::globals::GlobalArgs, guard::Navigation};
use anyhow::Result;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub path: String,
}

/// Execute the route action: report the guard's decision for a path.
/// # Errors
/// Returns an error if token storage cannot be opened.
pub async fn execute(args: Args) -> Result<()> {
    let provider = args.globals.provider()?;
    provider.manager().restore().await;

    match provider.navigate(&args.path) {
        Navigation::Stay => println!("{}: allowed", args.path),
        Navigation::Redirect(route) => println!("{}: redirect to {route}", args.path),
    }

    Ok(())
}
