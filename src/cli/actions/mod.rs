pub mod login;
pub mod logout;
pub mod route;
pub mod status;
pub mod watch;

// Single dispatch point for `Action`.
mod run;

#[derive(Debug)]
pub enum Action {
    Login(login::Args),
    Status(status::Args),
    Logout(logout::Args),
    Route(route::Args),
    Watch(watch::Args),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}
