//! Step Result Tracker: per-step outcomes and bounded evidence.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::db::{self, execution_steps};
use crate::error::{AppError, AppResult};
use crate::models::execution::{decode_evidence, encode_evidence};
use crate::models::{Actor, AuditAction, EntityKind, ExecutionStep, StepResultInput};

use super::Engine;
use super::aggregator::refresh_execution_status;

impl Engine {
    /// Record a tester's outcome for one execution step.
    ///
    /// Evidence in `input` is appended to the step's list; the combined list
    /// may not exceed the evidence limit. The owning execution's status is
    /// re-derived before the transaction commits.
    pub async fn record_result(
        &self,
        actor: &Actor,
        execution_step_id: Uuid,
        input: StepResultInput,
    ) -> AppResult<ExecutionStep> {
        let now = Utc::now();
        let txn = self.pool.begin().await?;
        let outcome = async {
            let step = execution_steps::find_execution_step(&txn, execution_step_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Execution step {}", execution_step_id)))?;

            let mut evidence = decode_evidence(&step.evidence);
            if let Some(added) = input.evidence {
                evidence.extend(added);
                self.check_evidence(&evidence)?;
            }

            let step = execution_steps::update_step_result(
                &txn,
                step,
                input.outcome,
                input.actual_result,
                encode_evidence(&evidence)?,
                now,
            )
            .await?;
            let execution = refresh_execution_status(&txn, step.execution_id).await?;

            Ok::<_, AppError>((step, execution))
        }
        .await;
        let (step, execution) = db::finish(txn, outcome).await?;

        info!(
            execution_step_id = %step.id,
            execution_id = %execution.id,
            outcome = %step.outcome,
            execution_status = %execution.status,
            "Step result recorded"
        );
        self.record(
            actor,
            AuditAction::Update,
            EntityKind::ExecutionStep,
            step.id,
            format!("outcome={} execution_status={}", step.outcome, execution.status),
        );

        ExecutionStep::try_from(step)
    }

    /// Append one evidence reference to a step without changing its outcome.
    pub async fn attach_evidence(
        &self,
        actor: &Actor,
        execution_step_id: Uuid,
        reference: String,
    ) -> AppResult<ExecutionStep> {
        let now = Utc::now();
        let txn = self.pool.begin().await?;
        let outcome = async {
            let step = execution_steps::find_execution_step(&txn, execution_step_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Execution step {}", execution_step_id)))?;

            let mut evidence = decode_evidence(&step.evidence);
            evidence.push(reference);
            self.check_evidence(&evidence)?;

            execution_steps::set_step_evidence(&txn, step, encode_evidence(&evidence)?, now).await
        }
        .await;
        let step = db::finish(txn, outcome).await?;

        info!(execution_step_id = %step.id, "Evidence attached");
        self.record(
            actor,
            AuditAction::Update,
            EntityKind::ExecutionStep,
            step.id,
            "evidence attached",
        );

        ExecutionStep::try_from(step)
    }
}
