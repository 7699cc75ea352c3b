//! Authentication gate for protected pages.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tracing::{debug, info};

use crate::auth::AuthState;
use crate::mount::Unmounted;

/// The navigation side channel. Fire-and-forget.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

/// Records the most recent navigation request so a request handler can turn
/// it into a redirect response.
#[derive(Debug, Clone, Default)]
pub struct PendingRedirect {
    target: Arc<Mutex<Option<String>>>,
}

impl PendingRedirect {
    /// Takes the pending target, leaving nothing pending.
    pub fn take(&self) -> Option<String> {
        self.target
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl Navigator for PendingRedirect {
    fn navigate(&self, path: &str) {
        *self.target.lock().unwrap_or_else(PoisonError::into_inner) = Some(path.to_string());
    }
}

/// What a protected page renders from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GateStatus {
    pub is_loading: bool,
    pub is_authenticated: bool,
}

impl From<&AuthState> for GateStatus {
    fn from(state: &AuthState) -> Self {
        Self {
            is_loading: state.is_loading,
            is_authenticated: state.is_authenticated(),
        }
    }
}

/// Keeps unauthenticated visitors away from a page.
///
/// Feed it every [`AuthState`] the page sees via [`SessionGate::observe`]
/// (or let [`SessionGate::spawn`] do so). While loading it does nothing.
/// Once resolved without a user it navigates to the redirect path, once per
/// resolution: observing the same resolved state again is a no-op.
pub struct SessionGate {
    redirect_path: String,
    navigator: Arc<dyn Navigator>,
    last: Option<AuthState>,
    // (resolution, path) of the last navigation.
    redirected: Option<(u64, String)>,
}

impl SessionGate {
    /// A gate that sends signed-out visitors to `redirect_path` through
    /// `navigator`. Nothing is navigated until a state is observed.
    pub fn new(redirect_path: impl Into<String>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            redirect_path: redirect_path.into(),
            navigator,
            last: None,
            redirected: None,
        }
    }

    pub fn redirect_path(&self) -> &str {
        &self.redirect_path
    }

    pub fn observe(&mut self, state: &AuthState) -> GateStatus {
        self.last = Some(state.clone());

        if state.is_loading {
            return GateStatus::from(state);
        }

        if state.user.is_some() {
            self.redirected = None;
        } else {
            let already = matches!(
                &self.redirected,
                Some((resolution, path))
                    if *resolution == state.resolution && *path == self.redirect_path
            );
            if !already {
                info!(path = %self.redirect_path, "visitor not signed in; redirecting");
                self.navigator.navigate(&self.redirect_path);
                self.redirected = Some((state.resolution, self.redirect_path.clone()));
            }
        }

        GateStatus::from(state)
    }

    /// Changes the redirect target and re-runs the check against the last
    /// observed state, if any.
    pub fn set_redirect_path(&mut self, path: impl Into<String>) -> Option<GateStatus> {
        self.redirect_path = path.into();
        let last = self.last.clone()?;
        Some(self.observe(&last))
    }

    /// Follows `sessions` in the background until `unmounted` fires or the
    /// session stream closes, publishing a [`GateStatus`] per change.
    ///
    /// Nothing is navigated after the consumer unmounts.
    pub fn spawn(
        mut self,
        mut sessions: watch::Receiver<AuthState>,
        mut unmounted: Unmounted,
    ) -> watch::Receiver<GateStatus> {
        let initial = GateStatus::from(&*sessions.borrow());
        let (status_tx, status_rx) = watch::channel(initial);

        tokio::spawn(async move {
            loop {
                if unmounted.is_unmounted() {
                    break;
                }
                let state = sessions.borrow_and_update().clone();
                status_tx.send_replace(self.observe(&state));

                tokio::select! {
                    biased;
                    _ = unmounted.cancelled() => break,
                    changed = sessions.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
            debug!("session gate stopped");
        });

        status_rx
    }
}
