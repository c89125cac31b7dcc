use crate::{
    api::{ApiClient, ApiConfig, AppKind},
    auth::{Capability, HttpAuthService},
    cli::commands::{
        api,
        storage::{self, StorageKind},
    },
    guard::{AuthProvider, RouteTable},
    session::SessionManager,
    storage::{CookieStore, FileStore, MemoryStore, TokenStore},
};
use anyhow::{Context, Result};
use clap::ArgMatches;
use std::{path::PathBuf, sync::Arc};
use tracing::debug;

/// Options shared by every subcommand.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub app: AppKind,
    pub api: ApiConfig,
    pub storage: StorageKind,
    pub state_file: PathBuf,
    pub production: bool,
}

impl GlobalArgs {
    /// # Errors
    /// Returns an error if an option is invalid.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let api_opts = api::Options::parse(matches)?;
        let storage_opts = storage::Options::parse(matches)?;

        Ok(Self {
            app: api_opts.app,
            api: ApiConfig::resolve(api_opts.api_url.as_deref(), api_opts.app)
                .with_timeout(api_opts.timeout),
            storage: storage_opts.kind,
            state_file: storage_opts.state_file,
            production: storage_opts.production,
        })
    }

    #[must_use]
    pub const fn capability(&self) -> Capability {
        Capability::for_app(self.app)
    }

    /// # Errors
    /// Returns an error if an existing cookie jar cannot be read.
    pub fn token_store(&self) -> Result<Arc<dyn TokenStore>> {
        debug!(storage = %self.storage, path = %self.state_file.display(), "opening token storage");

        let store: Arc<dyn TokenStore> = match self.storage {
            StorageKind::File => Arc::new(FileStore::new(&self.state_file)),
            StorageKind::Cookie => Arc::new(
                CookieStore::open(&self.state_file, self.production).with_context(|| {
                    format!("failed to open cookie jar {}", self.state_file.display())
                })?,
            ),
            StorageKind::Memory => Arc::new(MemoryStore::new()),
        };

        Ok(store)
    }

    /// Wires storage, the REST client, the auth service and a session manager.
    ///
    /// # Errors
    /// Returns an error if storage or the HTTP client cannot be initialized.
    pub fn session_manager(&self) -> Result<Arc<SessionManager>> {
        let tokens = self.token_store()?;
        let client = ApiClient::new(&self.api, tokens.clone())
            .context("failed to build API client")?;
        let service = Arc::new(HttpAuthService::new(client));

        Ok(Arc::new(SessionManager::new(
            service,
            tokens,
            self.capability(),
        )))
    }

    /// # Errors
    /// See [`GlobalArgs::session_manager`].
    pub fn provider(&self) -> Result<AuthProvider> {
        Ok(AuthProvider::new(
            self.session_manager()?,
            RouteTable::for_app(self.app),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cli::commands;

    #[test]
    fn test_global_args() {
        temp_env::with_vars(
            [
                ("PORTAL_API_URL", None::<&str>),
                ("PORTAL_APP", None),
                ("PORTAL_SESSION_TIMEOUT", None),
                ("PORTAL_SESSION_STORAGE", None),
                ("PORTAL_SESSION_STATE_FILE", None),
                ("PORTAL_SESSION_PRODUCTION", None),
            ],
            || {
                let matches = commands::new().get_matches_from(vec![
                    "portal-session",
                    "--app",
                    "admin",
                    "--storage",
                    "memory",
                    "--timeout",
                    "0",
                    "--state-file",
                    "/tmp/portal-session-test.json",
                    "status",
                ]);
                let globals = GlobalArgs::parse(&matches).unwrap();

                assert_eq!(globals.app, AppKind::Admin);
                assert_eq!(globals.api.base_url, "http://localhost:8080");
                assert_eq!(globals.api.timeout, None);
                assert_eq!(globals.storage, StorageKind::Memory);
                assert_eq!(globals.state_file, PathBuf::from("/tmp/portal-session-test.json"));
                assert!(!globals.production);
                assert_eq!(globals.capability(), Capability::Admin);
                assert!(globals.session_manager().is_ok());
            },
        );
    }
}
