//! Migration: Rewrite legacy status vocabulary to the canonical one.
//!
//! Rows imported from earlier schema revisions may still carry the Portuguese
//! status values. This is a one-time, forward-only data migration.

use sea_orm_migration::prelude::*;
use tracing::info;

use crate::db::legacy::normalize_legacy_values;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let report = normalize_legacy_values(manager.get_connection())
            .await
            .map_err(|e| DbErr::Migration(e.to_string()))?;

        info!(
            rewritten = report.rewritten,
            rederived = report.rederived_executions,
            "Legacy status values normalized"
        );

        Ok(())
    }

    async fn down(&self, _manager: &SchemaManager) -> Result<(), DbErr> {
        // Canonical values are a superset of the information the legacy ones held
        Ok(())
    }
}
