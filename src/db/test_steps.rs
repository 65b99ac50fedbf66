//! Database queries for template steps.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entity::test_step::{self, ActiveModel, Entity as TestStep};
use crate::error::{AppError, AppResult};

/// Insert a step at the given position.
pub async fn insert_test_step<C: ConnectionTrait>(
    db: &C,
    test_case_id: Uuid,
    position: i32,
    action: &str,
    expected_result: &str,
    now: DateTime<Utc>,
) -> AppResult<test_step::Model> {
    let model = ActiveModel {
        id: Set(Uuid::now_v7()),
        test_case_id: Set(test_case_id),
        position: Set(position),
        action: Set(action.to_string()),
        expected_result: Set(expected_result.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };

    model
        .insert(db)
        .await
        .map_err(AppError::db("Failed to insert test step"))
}

/// Get all steps of a case, in position order.
pub async fn list_test_steps<C: ConnectionTrait>(
    db: &C,
    test_case_id: Uuid,
) -> AppResult<Vec<test_step::Model>> {
    TestStep::find()
        .filter(test_step::Column::TestCaseId.eq(test_case_id))
        .order_by_asc(test_step::Column::Position)
        .all(db)
        .await
        .map_err(AppError::db("Failed to list test steps"))
}

/// Move a step to `position` without touching its text.
pub async fn set_test_step_position<C: ConnectionTrait>(
    db: &C,
    model: test_step::Model,
    position: i32,
) -> AppResult<test_step::Model> {
    let mut active: ActiveModel = model.into();
    active.position = Set(position);

    active
        .update(db)
        .await
        .map_err(AppError::db("Failed to reposition test step"))
}

/// Rewrite a step in place.
pub async fn update_test_step<C: ConnectionTrait>(
    db: &C,
    model: test_step::Model,
    position: i32,
    action: &str,
    expected_result: &str,
    now: DateTime<Utc>,
) -> AppResult<test_step::Model> {
    let mut active: ActiveModel = model.into();
    active.position = Set(position);
    active.action = Set(action.to_string());
    active.expected_result = Set(expected_result.to_string());
    active.updated_at = Set(now);

    active
        .update(db)
        .await
        .map_err(AppError::db("Failed to update test step"))
}

/// Delete the given steps. Returns the number of rows removed.
pub async fn delete_test_steps<C: ConnectionTrait>(db: &C, ids: &[Uuid]) -> AppResult<u64> {
    if ids.is_empty() {
        return Ok(0);
    }

    let result = TestStep::delete_many()
        .filter(test_step::Column::Id.is_in(ids.iter().copied()))
        .exec(db)
        .await
        .map_err(AppError::db("Failed to delete test steps"))?;

    Ok(result.rows_affected)
}

/// Delete every step of a case. Returns the number of rows removed.
pub async fn delete_test_steps_for_case<C: ConnectionTrait>(
    db: &C,
    test_case_id: Uuid,
) -> AppResult<u64> {
    let result = TestStep::delete_many()
        .filter(test_step::Column::TestCaseId.eq(test_case_id))
        .exec(db)
        .await
        .map_err(AppError::db("Failed to delete test steps of case"))?;

    Ok(result.rows_affected)
}
