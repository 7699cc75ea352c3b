//! Sea-ORM entity definitions.
//!
//! `session` backs [`SeaOrmSessionStore`](crate::SeaOrmSessionStore) and is
//! where a visitor's identity is persisted. `subscription` is the billing-plan
//! table the [`PlanResolver`](crate::PlanResolver) reads from.

/// Persisted sessions.
pub mod session;

/// Subscription records, one per plan period a user has held.
pub mod subscription;
