//! Migration: Create test_cycles table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TestCycles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(TestCycles::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(TestCycles::ProjectId).uuid().not_null())
                    .col(ColumnDef::new(TestCycles::Name).string_len(255).not_null())
                    .col(ColumnDef::new(TestCycles::Number).integer().not_null())
                    .col(ColumnDef::new(TestCycles::Description).text())
                    .col(ColumnDef::new(TestCycles::StartsAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(TestCycles::EndsAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(TestCycles::Status).string_len(20).not_null())
                    .col(
                        ColumnDef::new(TestCycles::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TestCycles::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_test_cycles_project_name")
                    .table(TestCycles::Table)
                    .col(TestCycles::ProjectId)
                    .col(TestCycles::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TestCycles::Table).if_exists().to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum TestCycles {
    Table,
    Id,
    ProjectId,
    Name,
    Number,
    Description,
    StartsAt,
    EndsAt,
    Status,
    CreatedAt,
    UpdatedAt,
}
