//! ExecutionStep entity: the mutable outcome record of one step of an execution.
//!
//! Position, action and expected result are copied from the originating test
//! step at allocation time; later template edits do not reach these rows.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "execution_steps")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub execution_id: Uuid,
    /// Back-reference to the originating template step.
    pub test_step_id: Uuid,
    pub position: i32,
    pub action: String,
    pub expected_result: String,
    pub outcome: String,
    pub actual_result: Option<String>,
    /// JSON array of opaque blob-store references.
    pub evidence: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::execution::Entity",
        from = "Column::ExecutionId",
        to = "super::execution::Column::Id",
        on_delete = "Restrict"
    )]
    Execution,
    #[sea_orm(
        belongs_to = "super::test_step::Entity",
        from = "Column::TestStepId",
        to = "super::test_step::Column::Id",
        on_delete = "Restrict"
    )]
    TestStep,
}

impl Related<super::execution::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Execution.def()
    }
}

impl Related<super::test_step::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TestStep.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
