//! Database queries for defects.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::entity::defect::{self, ActiveModel, Entity as Defect};
use crate::entity::execution;
use crate::error::{AppError, AppResult};
use crate::models::{DefectStatus, Severity};

/// Insert an open defect.
pub async fn insert_defect<C: ConnectionTrait>(
    db: &C,
    execution_id: Uuid,
    title: &str,
    description: &str,
    severity: Severity,
    evidence: String,
    now: DateTime<Utc>,
) -> AppResult<defect::Model> {
    let model = ActiveModel {
        id: Set(Uuid::now_v7()),
        execution_id: Set(execution_id),
        title: Set(title.to_string()),
        description: Set(description.to_string()),
        severity: Set(severity.as_str().to_string()),
        status: Set(DefectStatus::Open.as_str().to_string()),
        evidence: Set(evidence),
        created_at: Set(now),
        updated_at: Set(now),
    };

    model
        .insert(db)
        .await
        .map_err(AppError::db("Failed to insert defect"))
}

/// Get a defect by ID.
pub async fn find_defect<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<Option<defect::Model>> {
    Defect::find_by_id(id)
        .one(db)
        .await
        .map_err(AppError::db("Failed to get defect"))
}

/// Get the open defect with `title` filed against an execution, if any.
pub async fn find_open_defect<C: ConnectionTrait>(
    db: &C,
    execution_id: Uuid,
    title: &str,
) -> AppResult<Option<defect::Model>> {
    Defect::find()
        .filter(defect::Column::ExecutionId.eq(execution_id))
        .filter(defect::Column::Title.eq(title))
        .filter(defect::Column::Status.eq(DefectStatus::Open.as_str()))
        .one(db)
        .await
        .map_err(AppError::db("Failed to look up open defect"))
}

/// List the defects of an execution, oldest first.
pub async fn list_defects<C: ConnectionTrait>(
    db: &C,
    execution_id: Uuid,
) -> AppResult<Vec<defect::Model>> {
    Defect::find()
        .filter(defect::Column::ExecutionId.eq(execution_id))
        .order_by_asc(defect::Column::Id) // UUIDv7 is time-ordered
        .all(db)
        .await
        .map_err(AppError::db("Failed to list defects"))
}

/// List defects across all executions, oldest first. With `assignee_id`,
/// only defects filed against executions assigned to that tester.
pub async fn list_all_defects<C: ConnectionTrait>(
    db: &C,
    assignee_id: Option<Uuid>,
    limit: u64,
    offset: u64,
) -> AppResult<Vec<defect::Model>> {
    let mut query = Defect::find();

    if let Some(assignee_id) = assignee_id {
        query = query
            .inner_join(execution::Entity)
            .filter(execution::Column::AssigneeId.eq(assignee_id));
    }

    query
        .order_by_asc(defect::Column::Id)
        .limit(limit)
        .offset(offset)
        .all(db)
        .await
        .map_err(AppError::db("Failed to list defects"))
}

/// Field values to write on a defect. `None` leaves a field unchanged.
#[derive(Debug, Default)]
pub struct DefectChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub severity: Option<Severity>,
    pub status: Option<DefectStatus>,
    pub evidence: Option<String>,
}

/// Apply changes to a defect.
pub async fn update_defect<C: ConnectionTrait>(
    db: &C,
    model: defect::Model,
    changes: DefectChanges,
    now: DateTime<Utc>,
) -> AppResult<defect::Model> {
    let mut active: ActiveModel = model.into();

    if let Some(title) = changes.title {
        active.title = Set(title);
    }
    if let Some(description) = changes.description {
        active.description = Set(description);
    }
    if let Some(severity) = changes.severity {
        active.severity = Set(severity.as_str().to_string());
    }
    if let Some(status) = changes.status {
        active.status = Set(status.as_str().to_string());
    }
    if let Some(evidence) = changes.evidence {
        active.evidence = Set(evidence);
    }
    active.updated_at = Set(now);

    active
        .update(db)
        .await
        .map_err(AppError::db("Failed to update defect"))
}

/// Delete a defect row. Returns the number of rows removed.
pub async fn delete_defect<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<u64> {
    let result = Defect::delete_by_id(id)
        .exec(db)
        .await
        .map_err(AppError::db("Failed to delete defect"))?;

    Ok(result.rows_affected)
}

/// Delete the defects of the given executions. Returns the number of rows removed.
pub async fn delete_defects_of_executions<C: ConnectionTrait>(
    db: &C,
    execution_ids: &[Uuid],
) -> AppResult<u64> {
    if execution_ids.is_empty() {
        return Ok(0);
    }

    let result = Defect::delete_many()
        .filter(defect::Column::ExecutionId.is_in(execution_ids.iter().copied()))
        .exec(db)
        .await
        .map_err(AppError::db("Failed to delete defects"))?;

    Ok(result.rows_affected)
}
