//! TestStep entity: one ordered instruction of a test case.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "test_steps")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub test_case_id: Uuid,
    /// 1-based position, unique within the case.
    pub position: i32,
    pub action: String,
    pub expected_result: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::test_case::Entity",
        from = "Column::TestCaseId",
        to = "super::test_case::Column::Id",
        on_delete = "Restrict"
    )]
    TestCase,
    #[sea_orm(has_many = "super::execution_step::Entity")]
    ExecutionSteps,
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

impl ActiveModelBehavior for ActiveModel {}
