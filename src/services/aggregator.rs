//! Status Aggregator: derives an execution's status from its step outcomes.

use chrono::Utc;
use sea_orm::ConnectionTrait;
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::{self, execution_steps, executions};
use crate::error::{AppError, AppResult};
use crate::models::{Actor, AuditAction, EntityKind, Execution, ExecutionStatus, StepOutcome};

use super::Engine;

/// Derive the aggregate status of a set of step outcomes.
///
/// The first matching rule wins:
/// 1. any reproved step: `failed`
/// 2. any blocked step: `blocked`
/// 3. every step approved: `passed`
/// 4. otherwise: `in_progress`
///
/// An execution without steps has nothing to aggregate and stays `pending`.
pub fn derive_status(outcomes: &[StepOutcome]) -> ExecutionStatus {
    if outcomes.is_empty() {
        return ExecutionStatus::Pending;
    }

    if outcomes.contains(&StepOutcome::Reproved) {
        ExecutionStatus::Failed
    } else if outcomes.contains(&StepOutcome::Blocked) {
        ExecutionStatus::Blocked
    } else if outcomes.iter().all(|o| *o == StepOutcome::Approved) {
        ExecutionStatus::Passed
    } else {
        ExecutionStatus::InProgress
    }
}

/// Status the aggregator derives from an execution's stored step outcomes.
pub(crate) async fn derived_status_of<C: ConnectionTrait>(
    db: &C,
    execution_id: Uuid,
) -> AppResult<ExecutionStatus> {
    let outcomes = execution_steps::list_execution_steps(db, execution_id)
        .await?
        .iter()
        .map(|step| {
            StepOutcome::parse(&step.outcome).ok_or_else(|| {
                AppError::Database(format!(
                    "Execution step {} has unknown outcome '{}'",
                    step.id, step.outcome
                ))
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    Ok(derive_status(&outcomes))
}

/// Recompute and store the status of an execution from its current steps.
///
/// The row is left untouched when the derived status equals the stored one.
pub async fn refresh_execution_status<C: ConnectionTrait>(
    db: &C,
    execution_id: Uuid,
) -> AppResult<Execution> {
    let execution = executions::find_execution(db, execution_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Execution {}", execution_id)))?;

    let derived = derived_status_of(db, execution_id).await?;
    if execution.status == derived.as_str() {
        debug!(%execution_id, status = %derived, "Execution status unchanged");
        return Execution::try_from(execution);
    }

    debug!(
        %execution_id,
        from = %execution.status,
        to = %derived,
        "Execution status derived"
    );
    let updated = executions::set_execution_status(db, execution, derived, Utc::now()).await?;

    Execution::try_from(updated)
}

impl Engine {
    /// Force a terminal status for manual sign-off.
    ///
    /// Only actors whose access level is configured for finalization may call
    /// this. The aggregator is not re-run afterwards. Finalizing to the status
    /// already stored writes nothing and publishes no audit record.
    pub async fn finalize(
        &self,
        actor: &Actor,
        execution_id: Uuid,
        status: ExecutionStatus,
    ) -> AppResult<Execution> {
        if !actor.has_any_level(&self.settings.finalize_access_levels) {
            return Err(AppError::Forbidden(format!(
                "access level '{}' may not finalize executions",
                actor.access_level
            )));
        }
        if !status.is_terminal() {
            return Err(AppError::Rejected(format!(
                "'{}' is not a terminal execution status",
                status
            )));
        }

        let txn = self.pool.begin().await?;
        let outcome = async {
            let execution = executions::find_execution(&txn, execution_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Execution {}", execution_id)))?;

            if execution.status == status.as_str() {
                return Ok((execution, false));
            }
            let execution =
                executions::set_execution_status(&txn, execution, status, Utc::now()).await?;
            Ok::<_, AppError>((execution, true))
        }
        .await;
        let (execution, written) = db::finish(txn, outcome).await?;

        if written {
            info!(%execution_id, %status, actor_id = %actor.id, "Execution finalized");
            self.record(
                actor,
                AuditAction::Update,
                EntityKind::Execution,
                execution_id,
                format!("finalized status={}", status),
            );
        } else {
            debug!(%execution_id, %status, "Execution already in requested status");
        }

        Execution::try_from(execution)
    }
}
