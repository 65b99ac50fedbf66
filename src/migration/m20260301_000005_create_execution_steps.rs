//! Migration: Create execution_steps table.
//!
//! Rows are value snapshots of test steps taken at allocation time.

use sea_orm_migration::prelude::*;

use super::m20260301_000002_create_test_steps::TestSteps;
use super::m20260301_000004_create_executions::Executions;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ExecutionSteps::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExecutionSteps::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ExecutionSteps::ExecutionId).uuid().not_null())
                    .col(ColumnDef::new(ExecutionSteps::TestStepId).uuid().not_null())
                    .col(ColumnDef::new(ExecutionSteps::Position).integer().not_null())
                    .col(ColumnDef::new(ExecutionSteps::Action).text().not_null())
                    .col(ColumnDef::new(ExecutionSteps::ExpectedResult).text().not_null())
                    .col(ColumnDef::new(ExecutionSteps::Outcome).string_len(20).not_null())
                    .col(ColumnDef::new(ExecutionSteps::ActualResult).text())
                    .col(ColumnDef::new(ExecutionSteps::Evidence).text().not_null())
                    .col(
                        ColumnDef::new(ExecutionSteps::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExecutionSteps::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_execution_steps_execution")
                            .from(ExecutionSteps::Table, ExecutionSteps::ExecutionId)
                            .to(Executions::Table, Executions::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_execution_steps_test_step")
                            .from(ExecutionSteps::Table, ExecutionSteps::TestStepId)
                            .to(TestSteps::Table, TestSteps::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_execution_steps_execution_position")
                    .table(ExecutionSteps::Table)
                    .col(ExecutionSteps::ExecutionId)
                    .col(ExecutionSteps::Position)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_execution_steps_test_step_id")
                    .table(ExecutionSteps::Table)
                    .col(ExecutionSteps::TestStepId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ExecutionSteps::Table).if_exists().to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum ExecutionSteps {
    Table,
    Id,
    ExecutionId,
    TestStepId,
    Position,
    Action,
    ExpectedResult,
    Outcome,
    ActualResult,
    Evidence,
    CreatedAt,
    UpdatedAt,
}
