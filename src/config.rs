//! Gate and plan-cache configuration.

use std::env;
use std::time::Duration;

use crate::error::{Error, Result};

/// Where unauthenticated visitors are sent.
pub const DEFAULT_REDIRECT_PATH: &str = "/auth";

/// Cache key under which the current plan snapshot lives.
pub const USER_PLAN_KEY: &str = "userPlan";

/// How long a plan snapshot is considered fresh (5 minutes).
pub const PLAN_STALE_TIME: Duration = Duration::from_millis(300_000);

/// Environment variable overriding [`GateConfig::redirect_path`].
pub const REDIRECT_ENV: &str = "LUCRA_AUTH_REDIRECT";

/// Environment variable overriding [`GateConfig::plan_stale_time`], in seconds.
pub const STALE_SECS_ENV: &str = "LUCRA_PLAN_STALE_SECS";

/// Settings shared by [`SessionGate`](crate::SessionGate) and
/// [`PlanResolver`](crate::PlanResolver).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use lucra_gate::GateConfig;
///
/// let config = GateConfig::default()
///     .with_redirect_path("/login")
///     .with_plan_stale_time(Duration::from_secs(60));
///
/// assert_eq!(config.redirect_path, "/login");
/// assert_eq!(config.plan_cache_key, "userPlan");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateConfig {
    pub redirect_path: String,
    pub plan_cache_key: String,
    pub plan_stale_time: Duration,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            redirect_path: DEFAULT_REDIRECT_PATH.to_string(),
            plan_cache_key: USER_PLAN_KEY.to_string(),
            plan_stale_time: PLAN_STALE_TIME,
        }
    }
}

impl GateConfig {
    /// Builds a configuration from the defaults, overridden by
    /// `LUCRA_AUTH_REDIRECT` and `LUCRA_PLAN_STALE_SECS` when set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = lookup(REDIRECT_ENV) {
            if !path.starts_with('/') {
                return Err(Error::Config(format!(
                    "{REDIRECT_ENV} must be an absolute path, got {path:?}"
                )));
            }
            config.redirect_path = path;
        }

        if let Some(secs) = lookup(STALE_SECS_ENV) {
            let secs: u64 = secs.trim().parse().map_err(|e| {
                Error::Config(format!("{STALE_SECS_ENV} is not a number of seconds: {e}"))
            })?;
            config.plan_stale_time = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Sets where signed-out visitors are sent.
    pub fn with_redirect_path(mut self, path: impl Into<String>) -> Self {
        self.redirect_path = path.into();
        self
    }

    /// Overrides the cache key, e.g. to keep one plan snapshot per visitor
    /// when a single cache serves many sessions.
    pub fn with_plan_cache_key(mut self, key: impl Into<String>) -> Self {
        self.plan_cache_key = key.into();
        self
    }

    /// Sets how long a plan snapshot is served before it is fetched again.
    pub fn with_plan_stale_time(mut self, stale_time: Duration) -> Self {
        self.plan_stale_time = stale_time;
        self
    }
}
