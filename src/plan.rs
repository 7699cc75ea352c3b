//! Resolution of the visitor's current subscription plan.
//!
//! One resolution cycle goes `idle → fetching → resolved`, where resolved is
//! either the stored record or a synthesized Free plan. Nothing in between
//! is observable to the page, and no error ever reaches it.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use tracing::{debug, error, warn};

use crate::cache::QueryCache;
use crate::config::GateConfig;
use crate::identity::IdentityProvider;
use crate::mount::Unmounted;
use crate::subscription::{default_plan, PlanSentinel, StoreError, Subscription, SubscriptionStore};

/// What the plan cache holds: `None` when there was nobody to resolve for.
pub type PlanSnapshot = Option<Subscription>;

/// Resolves and caches the current visitor's plan.
///
/// The cache is injected so several resolvers (one per page, say) share the
/// same snapshot under the configured key.
pub struct PlanResolver {
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn SubscriptionStore>,
    cache: Arc<QueryCache<PlanSnapshot>>,
    config: GateConfig,
}

impl PlanResolver {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn SubscriptionStore>,
        cache: Arc<QueryCache<PlanSnapshot>>,
        config: GateConfig,
    ) -> Self {
        Self {
            identity,
            store,
            cache,
            config,
        }
    }

    /// The cached plan, fetched first if there is no fresh snapshot.
    pub async fn current_plan(&self) -> Arc<PlanSnapshot> {
        self.cache
            .get_or_fetch(&self.config.plan_cache_key, self.config.plan_stale_time, || {
                self.fetch_plan()
            })
            .await
    }

    /// Like [`current_plan`](Self::current_plan), but gives up with `None`
    /// if the consumer unmounts first. A fetch abandoned this way leaves the
    /// cache untouched.
    pub async fn current_plan_until(&self, mut unmounted: Unmounted) -> Option<Arc<PlanSnapshot>> {
        if unmounted.is_unmounted() {
            return None;
        }
        tokio::select! {
            biased;
            _ = unmounted.cancelled() => {
                debug!("plan consumer unmounted before resolution");
                None
            }
            plan = self.current_plan() => Some(plan),
        }
    }

    /// The latest snapshot without triggering a fetch.
    pub fn cached_plan(&self) -> Option<Arc<PlanSnapshot>> {
        self.cache.peek(&self.config.plan_cache_key)
    }

    /// Marks the snapshot outdated; the next consumer re-fetches.
    pub async fn invalidate(&self) {
        self.cache.invalidate(&self.config.plan_cache_key).await;
    }

    /// One uncached resolution.
    ///
    /// Returns `None` only when nobody is signed in, in which case the
    /// subscription store is never queried.
    pub async fn fetch_plan(&self) -> PlanSnapshot {
        let user = match self.identity.current_identity().await {
            Ok(Some(user)) => user,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "identity lookup failed; no plan to resolve");
                return None;
            }
        };

        let now: DateTimeWithTimeZone = Utc::now().into();
        let plan = match self.store.latest_active(&user.id).await {
            Ok(Some(record)) => record,
            Ok(None) | Err(StoreError::NoRows) => {
                default_plan(&user.id, PlanSentinel::Default, now)
            }
            Err(e) => {
                error!(user_id = %user.id, error = %e, "subscription lookup failed; using Free plan");
                default_plan(&user.id, PlanSentinel::Fallback, now)
            }
        };

        debug!(user_id = %user.id, plan = %plan.plan_name, id = %plan.id, "plan resolved");
        Some(plan)
    }
}
