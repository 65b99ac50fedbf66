//! Migration: Create defects table.
//!
//! At most one open defect may exist per (execution, title); the partial
//! unique index backs the idempotent creation path against concurrent writers.

use sea_orm_migration::prelude::*;

use super::m20260301_000004_create_executions::Executions;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Defects::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Defects::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Defects::ExecutionId).uuid().not_null())
                    .col(ColumnDef::new(Defects::Title).string_len(255).not_null())
                    .col(ColumnDef::new(Defects::Description).text().not_null())
                    .col(ColumnDef::new(Defects::Severity).string_len(20).not_null())
                    .col(ColumnDef::new(Defects::Status).string_len(20).not_null())
                    .col(ColumnDef::new(Defects::Evidence).text().not_null())
                    .col(
                        ColumnDef::new(Defects::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Defects::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_defects_execution")
                            .from(Defects::Table, Defects::ExecutionId)
                            .to(Executions::Table, Executions::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_defects_execution_id")
                    .table(Defects::Table)
                    .col(Defects::ExecutionId)
                    .to_owned(),
            )
            .await?;

        // Partial index syntax is shared by PostgreSQL and SQLite
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE UNIQUE INDEX IF NOT EXISTS idx_defects_open_title
                    ON defects (execution_id, title)
                    WHERE status = 'open';
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Defects::Table).if_exists().to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Defects {
    Table,
    Id,
    ExecutionId,
    Title,
    Description,
    Severity,
    Status,
    Evidence,
    CreatedAt,
    UpdatedAt,
}
