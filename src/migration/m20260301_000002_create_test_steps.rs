//! Migration: Create test_steps table.

use sea_orm_migration::prelude::*;

use super::m20260301_000001_create_test_cases::TestCases;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TestSteps::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(TestSteps::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(TestSteps::TestCaseId).uuid().not_null())
                    .col(ColumnDef::new(TestSteps::Position).integer().not_null())
                    .col(ColumnDef::new(TestSteps::Action).text().not_null())
                    .col(ColumnDef::new(TestSteps::ExpectedResult).text().not_null())
                    .col(
                        ColumnDef::new(TestSteps::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TestSteps::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_test_steps_test_case")
                            .from(TestSteps::Table, TestSteps::TestCaseId)
                            .to(TestCases::Table, TestCases::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Position is unique within a case
        manager
            .create_index(
                Index::create()
                    .name("idx_test_steps_case_position")
                    .table(TestSteps::Table)
                    .col(TestSteps::TestCaseId)
                    .col(TestSteps::Position)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TestSteps::Table).if_exists().to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum TestSteps {
    Table,
    Id,
    TestCaseId,
    Position,
    Action,
    ExpectedResult,
    CreatedAt,
    UpdatedAt,
}
