//! Execution Orchestrator: turns a (case, cycle, assignee) triple into an
//! execution with a value snapshot of the case's steps.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::db::{self, execution_steps, executions, test_cases, test_cycles, test_steps};
use crate::entity::{execution, execution_step};
use crate::error::{AppError, AppResult};
use crate::models::{
    Actor, AssignedExecutionsQuery, AuditAction, EntityKind, Execution, ExecutionDetail,
    ExecutionStep, clamped_limit,
};

use super::Engine;

impl Engine {
    /// Allocate an execution of `test_case_id` in `test_cycle_id` to `assignee_id`.
    ///
    /// The execution starts `pending` with one pending step per template step,
    /// in template order. Either every step is created or nothing is.
    pub async fn allocate(
        &self,
        actor: &Actor,
        test_cycle_id: Uuid,
        test_case_id: Uuid,
        assignee_id: Uuid,
    ) -> AppResult<ExecutionDetail> {
        let now = Utc::now();
        let txn = self.pool.begin().await?;
        let outcome = async {
            if test_cycles::find_test_cycle(&txn, test_cycle_id).await?.is_none() {
                return Err(AppError::NotFound(format!("Test cycle {}", test_cycle_id)));
            }
            if test_cases::find_test_case(&txn, test_case_id).await?.is_none() {
                return Err(AppError::NotFound(format!("Test case {}", test_case_id)));
            }

            if let Some(existing) = executions::find_in_flight_execution(
                &txn,
                test_cycle_id,
                test_case_id,
                assignee_id,
                None,
            )
            .await?
            {
                return Err(AppError::Conflict(format!(
                    "Execution {} of this case is already {} for the assignee in this cycle",
                    existing.id, existing.status
                )));
            }

            let execution =
                executions::insert_execution(&txn, test_cycle_id, test_case_id, assignee_id, now)
                    .await?;

            let template = test_steps::list_test_steps(&txn, test_case_id).await?;
            let mut steps = Vec::with_capacity(template.len());
            for step in &template {
                steps.push(execution_steps::insert_snapshot(&txn, execution.id, step, now).await?);
            }

            Ok((execution, steps))
        }
        .await;
        let (execution, steps) = db::finish(txn, outcome).await?;

        info!(
            execution_id = %execution.id,
            %test_case_id,
            %test_cycle_id,
            %assignee_id,
            steps = steps.len(),
            "Execution allocated"
        );
        self.record(
            actor,
            AuditAction::Create,
            EntityKind::Execution,
            execution.id,
            format!("assignee={} steps={}", assignee_id, steps.len()),
        );

        execution_detail(execution, steps)
    }

    /// Get an execution with its steps in snapshot order.
    pub async fn get_execution(&self, id: Uuid) -> AppResult<ExecutionDetail> {
        let conn = self.pool.connection();
        let execution = executions::find_execution(conn, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Execution {}", id)))?;
        let steps = execution_steps::list_execution_steps(conn, id).await?;

        execution_detail(execution, steps)
    }

    /// List the executions assigned to a tester, newest first.
    pub async fn list_assigned_executions(
        &self,
        assignee_id: Uuid,
        query: AssignedExecutionsQuery,
    ) -> AppResult<Vec<Execution>> {
        executions::list_assigned_executions(
            self.pool.connection(),
            assignee_id,
            query.status,
            clamped_limit(query.limit),
            query.offset.unwrap_or(0),
        )
        .await?
        .into_iter()
        .map(Execution::try_from)
        .collect()
    }
}

pub(crate) fn execution_detail(
    execution: execution::Model,
    steps: Vec<execution_step::Model>,
) -> AppResult<ExecutionDetail> {
    Ok(ExecutionDetail {
        execution: Execution::try_from(execution)?,
        steps: steps
            .into_iter()
            .map(ExecutionStep::try_from)
            .collect::<AppResult<Vec<_>>>()?,
    })
}
