//! Database queries for test cases.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::entity::test_case::{self, ActiveModel, Entity as TestCase};
use crate::error::{AppError, AppResult};
use crate::models::{NewTestCase, TestCasePatch};

/// Insert a test case row (steps are inserted separately).
pub async fn insert_test_case<C: ConnectionTrait>(
    db: &C,
    input: &NewTestCase,
    now: DateTime<Utc>,
) -> AppResult<test_case::Model> {
    let model = ActiveModel {
        id: Set(Uuid::now_v7()),
        project_id: Set(input.project_id),
        name: Set(input.name.trim().to_string()),
        description: Set(input.description.clone()),
        preconditions: Set(input.preconditions.clone()),
        acceptance_criteria: Set(input.acceptance_criteria.clone()),
        priority: Set(input.priority.as_str().to_string()),
        owner_id: Set(input.owner_id),
        created_at: Set(now),
        updated_at: Set(now),
    };

    model
        .insert(db)
        .await
        .map_err(AppError::db("Failed to insert test case"))
}

/// Get a test case by ID.
pub async fn find_test_case<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> AppResult<Option<test_case::Model>> {
    TestCase::find_by_id(id)
        .one(db)
        .await
        .map_err(AppError::db("Failed to get test case"))
}

/// Get a test case by name within a project.
pub async fn find_test_case_by_name<C: ConnectionTrait>(
    db: &C,
    project_id: Uuid,
    name: &str,
) -> AppResult<Option<test_case::Model>> {
    TestCase::find()
        .filter(test_case::Column::ProjectId.eq(project_id))
        .filter(test_case::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(AppError::db("Failed to look up test case by name"))
}

/// List a project's test cases by name.
pub async fn list_test_cases<C: ConnectionTrait>(
    db: &C,
    project_id: Uuid,
    limit: u64,
    offset: u64,
) -> AppResult<Vec<test_case::Model>> {
    TestCase::find()
        .filter(test_case::Column::ProjectId.eq(project_id))
        .order_by_asc(test_case::Column::Name)
        .limit(limit)
        .offset(offset)
        .all(db)
        .await
        .map_err(AppError::db("Failed to list test cases"))
}

/// Apply the scalar fields of a patch. Steps are synced by the caller.
pub async fn update_test_case<C: ConnectionTrait>(
    db: &C,
    model: test_case::Model,
    patch: &TestCasePatch,
    now: DateTime<Utc>,
) -> AppResult<test_case::Model> {
    let mut active: ActiveModel = model.into();

    if let Some(name) = &patch.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = &patch.description {
        active.description = Set(Some(description.clone()));
    }
    if let Some(preconditions) = &patch.preconditions {
        active.preconditions = Set(Some(preconditions.clone()));
    }
    if let Some(criteria) = &patch.acceptance_criteria {
        active.acceptance_criteria = Set(Some(criteria.clone()));
    }
    if let Some(priority) = patch.priority {
        active.priority = Set(priority.as_str().to_string());
    }
    if let Some(owner_id) = patch.owner_id {
        active.owner_id = Set(Some(owner_id));
    }
    active.updated_at = Set(now);

    active
        .update(db)
        .await
        .map_err(AppError::db("Failed to update test case"))
}

/// Delete a test case row. Returns the number of rows removed.
pub async fn delete_test_case<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<u64> {
    let result = TestCase::delete_by_id(id)
        .exec(db)
        .await
        .map_err(AppError::db("Failed to delete test case"))?;

    Ok(result.rows_affected)
}
