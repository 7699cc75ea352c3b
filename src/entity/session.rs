//! Session entity model.

use sea_orm::entity::prelude::*;

/// A persisted session row.
///
/// | Column      | Type               | Description                                 |
/// |-------------|--------------------|---------------------------------------------|
/// | id          | TEXT (Primary Key) | Session ID                                  |
/// | data        | BYTEA              | MessagePack-encoded `tower_sessions::Record` |
/// | expiry_date | TIMESTAMPTZ        | Rows past this instant are never loaded     |
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,

    /// The whole session record, including the `user_id` entry that the
    /// identity lookup reads.
    pub data: Vec<u8>,

    pub expiry_date: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
