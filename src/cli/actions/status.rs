use crate::cli::globals::GlobalArgs;
use anyhow::Result;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
}

/// Execute the status action: restore the stored session and report it.
/// # Errors
/// Returns an error if token storage cannot be opened.
pub async fn execute(args: Args) -> Result<()> {
    let manager = args.globals.session_manager()?;
    manager.restore().await;

    match manager.user() {
        Some(user) => {
            println!("Signed in as {}", user.username);
            if !user.id.is_empty() {
                println!("User id:    {}", user.id);
            }
            println!("Roles:      {}", user.roles.join(", "));
        }
        None => println!("Not signed in"),
    }

    println!("App:        {} ({} capability)", args.globals.app, manager.capability());
    println!("Phase:      {}", manager.phase());
    if let Some(at) = manager.last_validation() {
        println!("Validated:  {}", at.to_rfc3339());
    }
    if let Some(error) = manager.session().error {
        println!("Error:      {error}");
    }

    Ok(())
}
