//! Schema for the session and subscription tables.

pub use sea_orm_migration::prelude::*;

mod m20250101_000001_create_sessions_table;
mod m20250101_000002_create_subscriptions_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    // Kept apart from the host application's own migration history.
    fn migration_table_name() -> sea_orm::DynIden {
        Alias::new("lucra_gate_migrations").into_iden()
    }

    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_sessions_table::Migration),
            Box::new(m20250101_000002_create_subscriptions_table::Migration),
        ]
    }
}
