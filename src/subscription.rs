//! The remote subscription store seam and the synthesized fallback plan.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};

use crate::entity::subscription::{self, Entity as SubscriptionEntity, ACTIVE_STATUS};

/// A subscription record. See [`entity::subscription`](crate::entity::subscription).
pub type Subscription = subscription::Model;

/// Plan every user falls back to.
pub const FREE_PLAN: &str = "Free";

/// Failure modes of a subscription lookup.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store reported that the query matched nothing.
    #[error("no rows found")]
    NoRows,

    #[error("subscription store error: {0}")]
    Backend(String),
}

impl From<DbErr> for StoreError {
    fn from(e: DbErr) -> Self {
        match e {
            DbErr::RecordNotFound(_) => Self::NoRows,
            other => Self::Backend(other.to_string()),
        }
    }
}

/// Read access to subscription records.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// The most recently created record for `user_id` whose status is
    /// `"active"`. Stores may report "nothing found" either as `Ok(None)` or
    /// as [`StoreError::NoRows`].
    async fn latest_active(&self, user_id: &str) -> Result<Option<Subscription>, StoreError>;
}

/// Reads subscriptions from the `subscriptions` table.
#[derive(Debug, Clone)]
pub struct SeaOrmSubscriptionStore {
    conn: Arc<DatabaseConnection>,
}

impl SeaOrmSubscriptionStore {
    /// Creates a store that owns `conn`.
    pub fn new(conn: DatabaseConnection) -> Self {
        Self::from_shared(Arc::new(conn))
    }

    /// Creates a store over a connection shared with, e.g., the session store.
    pub fn from_shared(conn: Arc<DatabaseConnection>) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl SubscriptionStore for SeaOrmSubscriptionStore {
    async fn latest_active(&self, user_id: &str) -> Result<Option<Subscription>, StoreError> {
        // `one` adds the LIMIT 1.
        let record = SubscriptionEntity::find()
            .filter(subscription::Column::UserId.eq(user_id))
            .filter(subscription::Column::Status.eq(ACTIVE_STATUS))
            .order_by_desc(subscription::Column::CreatedAt)
            .one(self.conn.as_ref())
            .await?;

        Ok(record)
    }
}

/// Which path produced a synthesized plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanSentinel {
    /// The lookup failed.
    Fallback,
    /// The lookup succeeded but found no active record.
    Default,
}

impl PlanSentinel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fallback => "fallback",
            Self::Default => "default",
        }
    }

    /// Recognizes a synthesized record by its `id`.
    pub fn of(record: &Subscription) -> Option<Self> {
        match record.id.as_str() {
            "fallback" => Some(Self::Fallback),
            "default" => Some(Self::Default),
            _ => None,
        }
    }
}

/// The active, open-ended Free plan for `user_id`, starting at `now`.
pub fn default_plan(user_id: &str, sentinel: PlanSentinel, now: DateTimeWithTimeZone) -> Subscription {
    Subscription {
        id: sentinel.as_str().to_string(),
        user_id: user_id.to_string(),
        plan_name: FREE_PLAN.to_string(),
        status: ACTIVE_STATUS.to_string(),
        start_date: now,
        end_date: None,
        created_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTimeWithTimeZone {
        "2025-01-15T09:30:00+00:00".parse().unwrap()
    }

    #[test]
    fn both_sentinels_produce_the_same_free_plan() {
        let fallback = default_plan("u-1", PlanSentinel::Fallback, now());
        let default = default_plan("u-1", PlanSentinel::Default, now());

        assert_eq!(fallback.id, "fallback");
        assert_eq!(default.id, "default");
        assert_eq!(
            Subscription {
                id: String::new(),
                ..fallback
            },
            Subscription {
                id: String::new(),
                ..default
            }
        );
    }

    #[test]
    fn free_plan_is_active_and_open_ended() {
        let plan = default_plan("u-1", PlanSentinel::Default, now());

        assert_eq!(plan.user_id, "u-1");
        assert_eq!(plan.plan_name, FREE_PLAN);
        assert!(plan.is_active());
        assert_eq!(plan.start_date, now());
        assert_eq!(plan.end_date, None);
        assert_eq!(PlanSentinel::of(&plan), Some(PlanSentinel::Default));
    }

    #[test]
    fn record_not_found_maps_to_no_rows() {
        let err = StoreError::from(DbErr::RecordNotFound("subscriptions".into()));
        assert!(matches!(err, StoreError::NoRows));

        let err = StoreError::from(DbErr::Custom("connection reset".into()));
        assert!(matches!(err, StoreError::Backend(_)));
    }
}
