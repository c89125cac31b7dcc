use crate::{
    api::ErrorCode,
    cli::{commands::storage::StorageKind, globals::GlobalArgs},
    guard::Navigation,
    session::SessionError,
};
use anyhow::{anyhow, Result};
use secrecy::SecretString;
use tracing::{info, warn};

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub username: String,
    pub password: SecretString,
}

/// Execute the login action.
/// # Errors
/// Returns an error if the credentials are rejected or the backend is unreachable.
pub async fn execute(args: Args) -> Result<()> {
    let provider = args.globals.provider()?;

    info!(
        app = %args.globals.app,
        api = %args.globals.api.base_url,
        username = %args.username,
        "signing in"
    );

    if args.globals.storage == StorageKind::Memory {
        warn!("memory storage is selected, the session ends with this process");
    }

    let next = provider
        .sign_in(&args.username, &args.password)
        .await
        .map_err(|err| anyhow!(describe(&err, &args.globals.api.base_url)))?;

    if let Some(user) = provider.manager().user() {
        println!("Signed in as {} ({})", user.username, user.roles.join(", "));
    }
    if let Navigation::Redirect(route) = next {
        println!("Continue at {route}");
    }

    Ok(())
}

/// Login form wording for a failed sign-in.
fn describe(err: &SessionError, api_url: &str) -> String {
    let SessionError::Api(api) = err else {
        return err.to_string();
    };

    match api.code {
        ErrorCode::Network => format!(
            "Cannot connect to server. Please check if the backend is running on {api_url}"
        ),
        ErrorCode::Http(401) => "Invalid username or password.".to_string(),
        ErrorCode::Http(404) => "Login endpoint not found. Please check the backend API.".to_string(),
        ErrorCode::Http(500) => "Server error. Please try again later.".to_string(),
        _ => api.message.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{api::ApiError, auth::Capability};

    const URL: &str = "http://localhost:8081";

    #[test]
    fn describes_backend_failures() {
        let cases = [
            (ApiError::network("refused"), format!("Cannot connect to server. Please check if the backend is running on {URL}")),
            (ApiError::http(401, "Authentication required", None), "Invalid username or password.".to_string()),
            (ApiError::http(500, "boom", None), "Server error. Please try again later.".to_string()),
            (ApiError::http(422, "Username is required", None), "Username is required".to_string()),
        ];

        for (err, expected) in cases {
            assert_eq!(describe(&SessionError::Api(err), URL), expected);
        }
    }

    #[test]
    fn access_denied_keeps_its_message() {
        assert_eq!(
            describe(&SessionError::AccessDenied(Capability::Employee), URL),
            "Access denied. Employee role required."
        );
    }
}
