//! Execution entity: one run of a test case, in a cycle, by an assignee.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "executions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub test_cycle_id: Uuid,
    pub test_case_id: Uuid,
    pub assignee_id: Uuid,
    pub status: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::test_cycle::Entity",
        from = "Column::TestCycleId",
        to = "super::test_cycle::Column::Id",
        on_delete = "Restrict"
    )]
    TestCycle,
    #[sea_orm(
        belongs_to = "super::test_case::Entity",
        from = "Column::TestCaseId",
        to = "super::test_case::Column::Id",
        on_delete = "Restrict"
    )]
    TestCase,
    #[sea_orm(has_many = "super::execution_step::Entity")]
    ExecutionSteps,
    #[sea_orm(has_many = "super::defect::Entity")]
    Defects,
}

impl Related<super::test_cycle::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TestCycle.def()
    }
}

impl Related<super::test_case::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TestCase.def()
    }
}

impl Related<super::execution_step::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExecutionSteps.def()
    }
}

impl Related<super::defect::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Defects.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
