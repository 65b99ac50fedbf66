//! Migration: Create executions table.

use sea_orm_migration::prelude::*;

use super::m20260301_000001_create_test_cases::TestCases;
use super::m20260301_000003_create_test_cycles::TestCycles;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Executions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Executions::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Executions::TestCycleId).uuid().not_null())
                    .col(ColumnDef::new(Executions::TestCaseId).uuid().not_null())
                    .col(ColumnDef::new(Executions::AssigneeId).uuid().not_null())
                    .col(ColumnDef::new(Executions::Status).string_len(20).not_null())
                    .col(
                        ColumnDef::new(Executions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Executions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_executions_test_cycle")
                            .from(Executions::Table, Executions::TestCycleId)
                            .to(TestCycles::Table, TestCycles::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_executions_test_case")
                            .from(Executions::Table, Executions::TestCaseId)
                            .to(TestCases::Table, TestCases::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_executions_test_case_id")
                    .table(Executions::Table)
                    .col(Executions::TestCaseId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_executions_test_cycle_id")
                    .table(Executions::Table)
                    .col(Executions::TestCycleId)
                    .to_owned(),
            )
            .await?;

        // "My tasks" lookups filter by assignee and status
        manager
            .create_index(
                Index::create()
                    .name("idx_executions_assignee_status")
                    .table(Executions::Table)
                    .col(Executions::AssigneeId)
                    .col(Executions::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Executions::Table).if_exists().to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Executions {
    Table,
    Id,
    TestCycleId,
    TestCaseId,
    AssigneeId,
    Status,
    CreatedAt,
    UpdatedAt,
}
