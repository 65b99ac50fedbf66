//! Database queries for execution steps.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::entity::execution_step::{self, ActiveModel, Entity as ExecutionStep};
use crate::entity::test_step;
use crate::error::{AppError, AppResult};
use crate::models::StepOutcome;

/// Insert a pending snapshot of a template step.
pub async fn insert_snapshot<C: ConnectionTrait>(
    db: &C,
    execution_id: Uuid,
    step: &test_step::Model,
    now: DateTime<Utc>,
) -> AppResult<execution_step::Model> {
    let model = ActiveModel {
        id: Set(Uuid::now_v7()),
        execution_id: Set(execution_id),
        test_step_id: Set(step.id),
        position: Set(step.position),
        action: Set(step.action.clone()),
        expected_result: Set(step.expected_result.clone()),
        outcome: Set(StepOutcome::Pending.as_str().to_string()),
        actual_result: Set(None),
        evidence: Set("[]".to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };

    model
        .insert(db)
        .await
        .map_err(AppError::db("Failed to insert execution step"))
}

/// Get an execution step by ID.
pub async fn find_execution_step<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> AppResult<Option<execution_step::Model>> {
    ExecutionStep::find_by_id(id)
        .one(db)
        .await
        .map_err(AppError::db("Failed to get execution step"))
}

/// Get all steps of an execution in snapshot order.
pub async fn list_execution_steps<C: ConnectionTrait>(
    db: &C,
    execution_id: Uuid,
) -> AppResult<Vec<execution_step::Model>> {
    ExecutionStep::find()
        .filter(execution_step::Column::ExecutionId.eq(execution_id))
        .order_by_asc(execution_step::Column::Position)
        .all(db)
        .await
        .map_err(AppError::db("Failed to list execution steps"))
}

/// Store an outcome, optional result text and the encoded evidence list.
pub async fn update_step_result<C: ConnectionTrait>(
    db: &C,
    model: execution_step::Model,
    outcome: StepOutcome,
    actual_result: Option<String>,
    evidence: String,
    now: DateTime<Utc>,
) -> AppResult<execution_step::Model> {
    let mut active: ActiveModel = model.into();
    active.outcome = Set(outcome.as_str().to_string());
    if let Some(actual_result) = actual_result {
        active.actual_result = Set(Some(actual_result));
    }
    active.evidence = Set(evidence);
    active.updated_at = Set(now);

    active
        .update(db)
        .await
        .map_err(AppError::db("Failed to record step result"))
}

/// Replace the encoded evidence list.
pub async fn set_step_evidence<C: ConnectionTrait>(
    db: &C,
    model: execution_step::Model,
    evidence: String,
    now: DateTime<Utc>,
) -> AppResult<execution_step::Model> {
    let mut active: ActiveModel = model.into();
    active.evidence = Set(evidence);
    active.updated_at = Set(now);

    active
        .update(db)
        .await
        .map_err(AppError::db("Failed to store step evidence"))
}

/// Reset every reproved step of an execution to pending, clearing its
/// result and evidence. Returns the number of steps reset.
pub async fn reset_reproved_steps<C: ConnectionTrait>(
    db: &C,
    execution_id: Uuid,
    now: DateTime<Utc>,
) -> AppResult<u64> {
    let result = ExecutionStep::update_many()
        .col_expr(
            execution_step::Column::Outcome,
            Expr::value(StepOutcome::Pending.as_str()),
        )
        .col_expr(
            execution_step::Column::ActualResult,
            Expr::value(Option::<String>::None),
        )
        .col_expr(execution_step::Column::Evidence, Expr::value("[]"))
        .col_expr(execution_step::Column::UpdatedAt, Expr::value(now))
        .filter(execution_step::Column::ExecutionId.eq(execution_id))
        .filter(execution_step::Column::Outcome.eq(StepOutcome::Reproved.as_str()))
        .exec(db)
        .await
        .map_err(AppError::db("Failed to reset reproved steps"))?;

    Ok(result.rows_affected)
}

/// Delete the steps of the given executions. Returns the number of rows removed.
pub async fn delete_steps_of_executions<C: ConnectionTrait>(
    db: &C,
    execution_ids: &[Uuid],
) -> AppResult<u64> {
    if execution_ids.is_empty() {
        return Ok(0);
    }

    let result = ExecutionStep::delete_many()
        .filter(execution_step::Column::ExecutionId.is_in(execution_ids.iter().copied()))
        .exec(db)
        .await
        .map_err(AppError::db("Failed to delete execution steps"))?;

    Ok(result.rows_affected)
}

/// Distinct IDs of the executions holding a snapshot of any of the given
/// template steps.
pub async fn execution_ids_of_snapshots<C: ConnectionTrait>(
    db: &C,
    test_step_ids: &[Uuid],
) -> AppResult<Vec<Uuid>> {
    if test_step_ids.is_empty() {
        return Ok(Vec::new());
    }

    ExecutionStep::find()
        .select_only()
        .column(execution_step::Column::ExecutionId)
        .distinct()
        .filter(execution_step::Column::TestStepId.is_in(test_step_ids.iter().copied()))
        .into_tuple::<Uuid>()
        .all(db)
        .await
        .map_err(AppError::db("Failed to list executions of removed steps"))
}

/// Delete snapshots taken from the given template steps.
pub async fn delete_snapshots_of_test_steps<C: ConnectionTrait>(
    db: &C,
    test_step_ids: &[Uuid],
) -> AppResult<u64> {
    if test_step_ids.is_empty() {
        return Ok(0);
    }

    let result = ExecutionStep::delete_many()
        .filter(execution_step::Column::TestStepId.is_in(test_step_ids.iter().copied()))
        .exec(db)
        .await
        .map_err(AppError::db("Failed to delete snapshots of removed steps"))?;

    Ok(result.rows_affected)
}
