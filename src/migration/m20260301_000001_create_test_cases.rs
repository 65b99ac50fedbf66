//! Migration: Create test_cases table.
//!
//! Test case names are unique within a project.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TestCases::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(TestCases::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(TestCases::ProjectId).uuid().not_null())
                    .col(ColumnDef::new(TestCases::Name).string_len(255).not_null())
                    .col(ColumnDef::new(TestCases::Description).text())
                    .col(ColumnDef::new(TestCases::Preconditions).text())
                    .col(ColumnDef::new(TestCases::AcceptanceCriteria).text())
                    .col(ColumnDef::new(TestCases::Priority).string_len(20).not_null())
                    .col(ColumnDef::new(TestCases::OwnerId).uuid())
                    .col(
                        ColumnDef::new(TestCases::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TestCases::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_test_cases_project_name")
                    .table(TestCases::Table)
                    .col(TestCases::ProjectId)
                    .col(TestCases::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TestCases::Table).if_exists().to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum TestCases {
    Table,
    Id,
    ProjectId,
    Name,
    Description,
    Preconditions,
    AcceptanceCriteria,
    Priority,
    OwnerId,
    CreatedAt,
    UpdatedAt,
}
