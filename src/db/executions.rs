//! Database queries for executions.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::entity::execution::{self, ActiveModel, Entity as Execution};
use crate::error::{AppError, AppResult};
use crate::models::ExecutionStatus;

/// Insert a pending execution.
pub async fn insert_execution<C: ConnectionTrait>(
    db: &C,
    test_cycle_id: Uuid,
    test_case_id: Uuid,
    assignee_id: Uuid,
    now: DateTime<Utc>,
) -> AppResult<execution::Model> {
    let model = ActiveModel {
        id: Set(Uuid::now_v7()),
        test_cycle_id: Set(test_cycle_id),
        test_case_id: Set(test_case_id),
        assignee_id: Set(assignee_id),
        status: Set(ExecutionStatus::Pending.as_str().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };

    model
        .insert(db)
        .await
        .map_err(AppError::db("Failed to insert execution"))
}

/// Get an execution by ID.
pub async fn find_execution<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> AppResult<Option<execution::Model>> {
    Execution::find_by_id(id)
        .one(db)
        .await
        .map_err(AppError::db("Failed to get execution"))
}

/// Find an execution of the same triple that has not reached a terminal
/// status, ignoring `except` when given.
pub async fn find_in_flight_execution<C: ConnectionTrait>(
    db: &C,
    test_cycle_id: Uuid,
    test_case_id: Uuid,
    assignee_id: Uuid,
    except: Option<Uuid>,
) -> AppResult<Option<execution::Model>> {
    let in_flight = [
        ExecutionStatus::Pending,
        ExecutionStatus::InProgress,
        ExecutionStatus::Reteste,
    ]
    .map(|s| s.as_str());

    let mut query = Execution::find()
        .filter(execution::Column::TestCycleId.eq(test_cycle_id))
        .filter(execution::Column::TestCaseId.eq(test_case_id))
        .filter(execution::Column::AssigneeId.eq(assignee_id))
        .filter(execution::Column::Status.is_in(in_flight));
    if let Some(except) = except {
        query = query.filter(execution::Column::Id.ne(except));
    }

    query
        .one(db)
        .await
        .map_err(AppError::db("Failed to look up in-flight execution"))
}

/// IDs of every execution created from a test case.
pub async fn execution_ids_for_case<C: ConnectionTrait>(
    db: &C,
    test_case_id: Uuid,
) -> AppResult<Vec<Uuid>> {
    Execution::find()
        .select_only()
        .column(execution::Column::Id)
        .filter(execution::Column::TestCaseId.eq(test_case_id))
        .into_tuple::<Uuid>()
        .all(db)
        .await
        .map_err(AppError::db("Failed to list executions of test case"))
}

/// IDs of every execution scheduled into a cycle.
pub async fn execution_ids_for_cycle<C: ConnectionTrait>(
    db: &C,
    test_cycle_id: Uuid,
) -> AppResult<Vec<Uuid>> {
    Execution::find()
        .select_only()
        .column(execution::Column::Id)
        .filter(execution::Column::TestCycleId.eq(test_cycle_id))
        .into_tuple::<Uuid>()
        .all(db)
        .await
        .map_err(AppError::db("Failed to list executions of test cycle"))
}

/// List executions assigned to a tester, newest first.
pub async fn list_assigned_executions<C: ConnectionTrait>(
    db: &C,
    assignee_id: Uuid,
    status: Option<ExecutionStatus>,
    limit: u64,
    offset: u64,
) -> AppResult<Vec<execution::Model>> {
    let mut query = Execution::find().filter(execution::Column::AssigneeId.eq(assignee_id));

    if let Some(status) = status {
        query = query.filter(execution::Column::Status.eq(status.as_str()));
    }

    query
        .order_by_desc(execution::Column::Id) // UUIDv7 is time-ordered
        .limit(limit)
        .offset(offset)
        .all(db)
        .await
        .map_err(AppError::db("Failed to list assigned executions"))
}

/// Count a cycle's executions that are still pending or in progress.
pub async fn count_unfinished_in_cycle<C: ConnectionTrait>(
    db: &C,
    test_cycle_id: Uuid,
) -> AppResult<u64> {
    let unfinished = [ExecutionStatus::Pending, ExecutionStatus::InProgress].map(|s| s.as_str());

    Execution::find()
        .filter(execution::Column::TestCycleId.eq(test_cycle_id))
        .filter(execution::Column::Status.is_in(unfinished))
        .count(db)
        .await
        .map_err(AppError::db("Failed to count unfinished executions"))
}

/// Overwrite the status of an execution.
pub async fn set_execution_status<C: ConnectionTrait>(
    db: &C,
    model: execution::Model,
    status: ExecutionStatus,
    now: DateTime<Utc>,
) -> AppResult<execution::Model> {
    let mut active: ActiveModel = model.into();
    active.status = Set(status.as_str().to_string());
    active.updated_at = Set(now);

    active
        .update(db)
        .await
        .map_err(AppError::db("Failed to update execution status"))
}

/// Delete the given executions. Returns the number of rows removed.
pub async fn delete_executions<C: ConnectionTrait>(db: &C, ids: &[Uuid]) -> AppResult<u64> {
    if ids.is_empty() {
        return Ok(0);
    }

    let result = Execution::delete_many()
        .filter(execution::Column::Id.is_in(ids.iter().copied()))
        .exec(db)
        .await
        .map_err(AppError::db("Failed to delete executions"))?;

    Ok(result.rows_affected)
}
