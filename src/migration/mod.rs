//! SeaORM database migrations.
//!
//! Schemas are expressed with the backend-neutral builder so that the same
//! migrations run on PostgreSQL and on SQLite.

pub use sea_orm_migration::prelude::*;

mod m20260301_000001_create_test_cases;
mod m20260301_000002_create_test_steps;
mod m20260301_000003_create_test_cycles;
mod m20260301_000004_create_executions;
mod m20260301_000005_create_execution_steps;
mod m20260301_000006_create_defects;
mod m20260301_000007_normalize_legacy_values;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_test_cases::Migration),
            Box::new(m20260301_000002_create_test_steps::Migration),
            Box::new(m20260301_000003_create_test_cycles::Migration),
            Box::new(m20260301_000004_create_executions::Migration),
            Box::new(m20260301_000005_create_execution_steps::Migration),
            Box::new(m20260301_000006_create_defects::Migration),
            Box::new(m20260301_000007_normalize_legacy_values::Migration),
        ]
    }
}
