//! Database queries for test cycles.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entity::test_cycle::{self, ActiveModel, Entity as TestCycle};
use crate::error::{AppError, AppResult};
use crate::models::{CycleStatus, NewTestCycle, TestCyclePatch};

/// Insert a cycle with the given sequential number.
pub async fn insert_test_cycle<C: ConnectionTrait>(
    db: &C,
    input: &NewTestCycle,
    number: i32,
    now: DateTime<Utc>,
) -> AppResult<test_cycle::Model> {
    let model = ActiveModel {
        id: Set(Uuid::now_v7()),
        project_id: Set(input.project_id),
        name: Set(input.name.trim().to_string()),
        number: Set(number),
        description: Set(input.description.clone()),
        starts_at: Set(input.starts_at),
        ends_at: Set(input.ends_at),
        status: Set(CycleStatus::Planned.as_str().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };

    model
        .insert(db)
        .await
        .map_err(AppError::db("Failed to insert test cycle"))
}

/// Get a cycle by ID.
pub async fn find_test_cycle<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> AppResult<Option<test_cycle::Model>> {
    TestCycle::find_by_id(id)
        .one(db)
        .await
        .map_err(AppError::db("Failed to get test cycle"))
}

/// Get a cycle by name within a project.
pub async fn find_test_cycle_by_name<C: ConnectionTrait>(
    db: &C,
    project_id: Uuid,
    name: &str,
) -> AppResult<Option<test_cycle::Model>> {
    TestCycle::find()
        .filter(test_cycle::Column::ProjectId.eq(project_id))
        .filter(test_cycle::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(AppError::db("Failed to look up test cycle by name"))
}

/// Next sequential cycle number for a project, starting at 1.
pub async fn next_cycle_number<C: ConnectionTrait>(db: &C, project_id: Uuid) -> AppResult<i32> {
    let latest = TestCycle::find()
        .filter(test_cycle::Column::ProjectId.eq(project_id))
        .order_by_desc(test_cycle::Column::Number)
        .one(db)
        .await
        .map_err(AppError::db("Failed to read latest cycle number"))?;

    Ok(latest.map_or(1, |cycle| cycle.number + 1))
}

/// List a project's cycles by number.
pub async fn list_test_cycles<C: ConnectionTrait>(
    db: &C,
    project_id: Uuid,
) -> AppResult<Vec<test_cycle::Model>> {
    TestCycle::find()
        .filter(test_cycle::Column::ProjectId.eq(project_id))
        .order_by_asc(test_cycle::Column::Number)
        .all(db)
        .await
        .map_err(AppError::db("Failed to list test cycles"))
}

/// Apply a cycle patch.
pub async fn update_test_cycle<C: ConnectionTrait>(
    db: &C,
    model: test_cycle::Model,
    patch: &TestCyclePatch,
    now: DateTime<Utc>,
) -> AppResult<test_cycle::Model> {
    let mut active: ActiveModel = model.into();

    if let Some(name) = &patch.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = &patch.description {
        active.description = Set(Some(description.clone()));
    }
    if let Some(starts_at) = patch.starts_at {
        active.starts_at = Set(Some(starts_at));
    }
    if let Some(ends_at) = patch.ends_at {
        active.ends_at = Set(Some(ends_at));
    }
    if let Some(status) = patch.status {
        active.status = Set(status.as_str().to_string());
    }
    active.updated_at = Set(now);

    active
        .update(db)
        .await
        .map_err(AppError::db("Failed to update test cycle"))
}

/// Delete a cycle row. Returns the number of rows removed.
pub async fn delete_test_cycle<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<u64> {
    let result = TestCycle::delete_by_id(id)
        .exec(db)
        .await
        .map_err(AppError::db("Failed to delete test cycle"))?;

    Ok(result.rows_affected)
}
