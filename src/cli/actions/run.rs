use crate::cli::actions::{login, logout, route, status, watch, Action};
use anyhow::Result;

/// Execute the provided action.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Login(args) => login::execute(args).await,
        Action::Status(args) => status::execute(args).await,
        Action::Logout(args) => logout::execute(args).await,
        Action::Route(args) => route::execute(args).await,
        Action::Watch(args) => watch::execute(args).await,
    }
}
