//! Wires a [`SessionManager`] to a [`RouteTable`] and keeps the session alive.
//!
//! The keeper is one background task. While the session is signed in it ticks
//! on a single jittered interval and calls
//! [`SessionManager::ensure_valid_session`]; a failure is reported as a redirect
//! to the login route. The interval is dropped on sign-out and recreated on the
//! next sign-in.

use super::{Navigation, RouteTable};
use crate::session::{SessionError, SessionManager};
use rand::{rngs::StdRng, Rng, SeedableRng};
use secrecy::SecretString;
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};

/// How often a signed-in session is revalidated.
pub const DEFAULT_VALIDATION_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug)]
struct Keeper {
    handle: JoinHandle<()>,
    stop: watch::Sender<bool>,
}

impl Keeper {
    /// Signals the task to stop and detaches it.
    fn release(self) {
        let _ = self.stop.send(true);
        debug!("session keeper released");
    }
}

#[derive(Debug)]
pub struct AuthProvider {
    manager: Arc<SessionManager>,
    routes: RouteTable,
    keeper: Option<Keeper>,
}

impl AuthProvider {
    #[must_use]
    pub const fn new(manager: Arc<SessionManager>, routes: RouteTable) -> Self {
        Self {
            manager,
            routes,
            keeper: None,
        }
    }

    #[must_use]
    pub const fn manager(&self) -> &Arc<SessionManager> {
        &self.manager
    }

    #[must_use]
    pub const fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Route decision for `path` against the current session.
    #[must_use]
    pub fn navigate(&self, path: &str) -> Navigation {
        let session = self.manager.session();
        self.routes
            .decide(path, &session, self.manager.capability())
    }

    /// Signs in and redirects to the home route.
    ///
    /// # Errors
    /// Returns the sign-in failure unchanged so a form can display it.
    pub async fn sign_in(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<Navigation, SessionError> {
        self.manager.sign_in(username, password).await?;
        Ok(Navigation::Redirect(self.routes.home.clone()))
    }

    /// Signs out and redirects to the login route.
    pub async fn sign_out(&self) -> Navigation {
        self.manager.sign_out().await;
        Navigation::Redirect(self.routes.login.clone())
    }

    /// Starts the keeper, replacing any running one. Redirects produced by failed
    /// revalidation arrive on the returned channel. A replaced keeper is told to
    /// stop and exits once any validation it has in flight completes.
    pub fn spawn_keeper(&mut self, period: Duration) -> mpsc::UnboundedReceiver<Navigation> {
        if let Some(previous) = self.keeper.take() {
            previous.release();
        }

        let (redirects, receiver) = mpsc::unbounded_channel();
        let (stop, stopped) = watch::channel(false);
        let handle = tokio::spawn(run_keeper(
            self.manager.clone(),
            period,
            self.routes.login.clone(),
            redirects,
            stopped,
        ));

        self.keeper = Some(Keeper { handle, stop });
        receiver
    }

    #[must_use]
    pub fn is_keeping(&self) -> bool {
        self.keeper
            .as_ref()
            .is_some_and(|keeper| !keeper.handle.is_finished())
    }

    /// Stops the keeper and waits for it to exit. A validation already in flight
    /// completes first.
    pub async fn shutdown(&mut self) {
        if let Some(keeper) = self.keeper.take() {
            let _ = keeper.stop.send(true);
            if let Err(err) = keeper.handle.await {
                if !err.is_cancelled() {
                    warn!("session keeper exited abnormally: {err}");
                }
            }
        }
    }
}

impl Drop for AuthProvider {
    fn drop(&mut self) {
        if let Some(keeper) = self.keeper.take() {
            keeper.release();
        }
    }
}

async fn run_keeper(
    manager: Arc<SessionManager>,
    period: Duration,
    login: String,
    redirects: mpsc::UnboundedSender<Navigation>,
    mut stop: watch::Receiver<bool>,
) {
    let mut signal = manager.subscribe();
    let mut rng = StdRng::from_entropy();

    loop {
        loop {
            let logged_in = *signal.borrow_and_update();
            if logged_in {
                break;
            }
            tokio::select! {
                biased;
                _ = stop.changed() => return,
                changed = signal.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
            }
        }

        let every = period.mul_f64(rng.gen_range(0.9..=1.0));
        let mut ticker = interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("session keeper armed, validating every {} seconds", every.as_secs());

        // stop takes priority over a ready tick
        loop {
            tokio::select! {
                biased;
                _ = stop.changed() => return,
                changed = signal.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    let logged_in = *signal.borrow_and_update();
                    if !logged_in {
                        debug!("session keeper disarmed");
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if !manager.ensure_valid_session().await {
                        warn!("session could not be revalidated, redirecting to {login}");
                        if redirects.send(Navigation::Redirect(login.clone())).is_err() {
                            debug!("redirect receiver dropped");
                        }
                    }
                }
            }
        }
    }
}
