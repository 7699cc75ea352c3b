//! Subscription entity model.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Status value of the subscription a user is currently billed for.
pub const ACTIVE_STATUS: &str = "active";

/// A subscription record, as stored and as handed to pages.
///
/// Records synthesized by the resolver carry a sentinel `id` (`"fallback"` or
/// `"default"`, see [`PlanSentinel`](crate::PlanSentinel)) and never exist in
/// the table.
///
/// | Column     | Type               | Description                          |
/// |------------|--------------------|--------------------------------------|
/// | id         | TEXT (Primary Key) | Record ID                            |
/// | user_id    | TEXT               | Owning identity                      |
/// | plan_name  | TEXT               | e.g. `"Free"`, `"Pro"`               |
/// | status     | TEXT               | `"active"` or any other lifecycle tag |
/// | start_date | TIMESTAMPTZ        | Start of the plan period             |
/// | end_date   | TIMESTAMPTZ NULL   | End of the plan period, if bounded   |
/// | created_at | TIMESTAMPTZ        | Insertion time; newest active wins   |
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscriptions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,
    #[sea_orm(column_type = "Text")]
    pub user_id: String,
    pub plan_name: String,
    pub status: String,
    pub start_date: DateTimeWithTimeZone,
    pub end_date: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    pub fn is_active(&self) -> bool {
        self.status == ACTIVE_STATUS
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
