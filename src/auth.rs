//! Process-wide authentication state.
//!
//! A single [`SessionProvider`] is created when the application starts and
//! torn down when it stops. Every consumer subscribes to the same
//! [`AuthState`] stream instead of reaching for ambient global state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::identity::{Identity, IdentityProvider};

/// Whether the current visitor is authenticated.
///
/// `is_loading` is only true while the identity check is in flight; after
/// the first resolution it stays false until the provider is refreshed.
/// `resolution` counts completed checks, so two resolved states with the
/// same user can still be told apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<Identity>,
    pub is_loading: bool,
    pub resolution: u64,
}

impl AuthState {
    pub const fn loading() -> Self {
        Self {
            user: None,
            is_loading: true,
            resolution: 0,
        }
    }

    /// The state after the first identity check.
    pub const fn resolved(user: Option<Identity>) -> Self {
        Self {
            user,
            is_loading: false,
            resolution: 1,
        }
    }

    /// The state after the next identity check completes with `user`.
    pub fn resolve(&self, user: Option<Identity>) -> Self {
        Self {
            user,
            is_loading: false,
            resolution: self.resolution + 1,
        }
    }

    /// Back to loading, keeping the resolution count.
    pub fn reloading(&self) -> Self {
        Self {
            user: None,
            is_loading: true,
            resolution: self.resolution,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// Owns the [`AuthState`] and keeps it in step with the identity provider.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use lucra_gate::{IdentityProvider, SessionProvider};
///
/// # async fn example(identity: Arc<dyn IdentityProvider>) {
/// let provider = SessionProvider::init(identity);
/// let state = provider.resolved().await;
/// println!("signed in: {}", state.is_authenticated());
/// provider.teardown();
/// # }
/// ```
pub struct SessionProvider {
    identity: Arc<dyn IdentityProvider>,
    state: Arc<watch::Sender<AuthState>>,
    generation: Arc<AtomicU64>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SessionProvider {
    /// Starts in the loading state and resolves the identity in the
    /// background. Must be called from within a Tokio runtime.
    pub fn init(identity: Arc<dyn IdentityProvider>) -> Self {
        let (tx, _) = watch::channel(AuthState::loading());
        let provider = Self {
            identity,
            state: Arc::new(tx),
            generation: Arc::new(AtomicU64::new(0)),
            task: Mutex::new(None),
        };
        provider.spawn_resolution();
        provider
    }

    /// A receiver that sees the current state and every change after it.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// A snapshot of the state right now, loading or not.
    pub fn current(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Waits until the state is no longer loading and returns it.
    pub async fn resolved(&self) -> AuthState {
        let mut rx = self.subscribe();
        let state = match rx.wait_for(|state| !state.is_loading).await {
            Ok(state) => state.clone(),
            Err(_) => self.current(),
        };
        state
    }

    /// Re-initializes: back to loading, then a fresh identity check. An
    /// in-flight check from before the refresh is abandoned.
    pub fn refresh(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.state.send_modify(|current| *current = current.reloading());
        self.spawn_resolution();
    }

    /// Aborts any pending check. Subscribers see the stream close once the
    /// provider is gone.
    pub fn teardown(self) {
        let task = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.abort();
        }
        debug!("session provider torn down");
    }

    fn spawn_resolution(&self) {
        let identity = Arc::clone(&self.identity);
        let state = Arc::clone(&self.state);
        let generation = Arc::clone(&self.generation);
        let started = generation.load(Ordering::SeqCst);

        let handle = tokio::spawn(async move {
            let user = match identity.current_identity().await {
                Ok(user) => user,
                Err(e) => {
                    warn!(error = %e, "identity lookup failed; treating visitor as signed out");
                    None
                }
            };
            // A refresh issued meanwhile owns the state now.
            let applied = state.send_if_modified(|current| {
                if generation.load(Ordering::SeqCst) != started {
                    return false;
                }
                *current = current.resolve(user.clone());
                true
            });
            if applied {
                debug!(authenticated = user.is_some(), "session resolved");
            }
        });

        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = task.replace(handle) {
            previous.abort();
        }
    }
}

impl Drop for SessionProvider {
    fn drop(&mut self) {
        let task = self.task.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = task.take() {
            task.abort();
        }
    }
}
