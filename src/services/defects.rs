//! Defect Workflow: idempotent defect filing and the fix-to-retest transition.

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::defects::DefectChanges;
use crate::db::{self, defects, execution_steps, executions};
use crate::error::{AppError, AppResult};
use crate::models::execution::encode_evidence;
use crate::models::{
    Actor, AuditAction, Defect, DefectPatch, DefectStatus, DefectSubmission, EntityKind,
    ExecutionStatus, NewDefect, clamped_limit,
};

use super::Engine;
use super::engine::required_name;

/// Side effect of a defect entering `fixed`.
#[derive(Debug, Clone, Copy)]
struct RetestTransition {
    execution_id: Uuid,
    reset_steps: u64,
}

impl Engine {
    /// File a defect against an execution.
    ///
    /// When an open defect with the same title already exists on the
    /// execution it is returned unchanged with `is_existing` set.
    pub async fn create_defect(
        &self,
        actor: &Actor,
        input: NewDefect,
    ) -> AppResult<DefectSubmission> {
        let title = required_name("Defect title", &input.title)?;
        self.check_evidence(&input.evidence)?;
        let evidence = encode_evidence(&input.evidence)?;

        let now = Utc::now();
        let txn = self.pool.begin().await?;
        let outcome = async {
            if executions::find_execution(&txn, input.execution_id)
                .await?
                .is_none()
            {
                return Err(AppError::NotFound(format!("Execution {}", input.execution_id)));
            }

            if let Some(existing) = defects::find_open_defect(&txn, input.execution_id, &title).await? {
                return Ok((existing, true));
            }

            let defect = defects::insert_defect(
                &txn,
                input.execution_id,
                &title,
                &input.description,
                input.severity,
                evidence,
                now,
            )
            .await?;
            Ok((defect, false))
        }
        .await;

        let (defect, is_existing) = match db::finish(txn, outcome).await {
            Ok(result) => result,
            // A concurrent submission won the open-title index
            Err(AppError::Conflict(msg)) => {
                match defects::find_open_defect(self.pool.connection(), input.execution_id, &title)
                    .await?
                {
                    Some(existing) => (existing, true),
                    None => return Err(AppError::Conflict(msg)),
                }
            }
            Err(err) => return Err(err),
        };

        if is_existing {
            warn!(
                defect_id = %defect.id,
                execution_id = %defect.execution_id,
                "Defect re-submitted while still open; returning existing defect"
            );
        } else {
            info!(
                defect_id = %defect.id,
                execution_id = %defect.execution_id,
                severity = %defect.severity,
                "Defect created"
            );
            self.record(
                actor,
                AuditAction::Create,
                EntityKind::Defect,
                defect.id,
                format!("title={} severity={}", defect.title, defect.severity),
            );
        }

        Ok(DefectSubmission {
            defect: Defect::try_from(defect)?,
            is_existing,
        })
    }

    /// Apply a patch to a defect.
    ///
    /// When the defect enters `fixed`, its execution moves to `reteste` and
    /// every reproved step of that execution is reset to pending with its
    /// result and evidence cleared. Approved and blocked steps are kept.
    /// The transition is a `Conflict` while another execution of the same
    /// cycle, case and assignee is still in flight.
    pub async fn update_defect(
        &self,
        actor: &Actor,
        id: Uuid,
        patch: DefectPatch,
    ) -> AppResult<Defect> {
        if patch.is_empty() {
            return Err(AppError::Rejected("Defect patch is empty".to_string()));
        }

        let title = patch
            .title
            .as_deref()
            .map(|title| required_name("Defect title", title))
            .transpose()?;
        let evidence = match &patch.evidence {
            Some(evidence) => {
                self.check_evidence(evidence)?;
                Some(encode_evidence(evidence)?)
            }
            None => None,
        };

        let now = Utc::now();
        let txn = self.pool.begin().await?;
        let outcome = async {
            let defect = defects::find_defect(&txn, id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Defect {}", id)))?;

            let entering_fixed = patch.status == Some(DefectStatus::Fixed)
                && defect.status != DefectStatus::Fixed.as_str();

            let changes = DefectChanges {
                title,
                description: patch.description.clone(),
                severity: patch.severity,
                status: patch.status,
                evidence,
            };
            let defect = defects::update_defect(&txn, defect, changes, now).await?;

            let retest = if entering_fixed {
                let execution = executions::find_execution(&txn, defect.execution_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("Execution {}", defect.execution_id)))?;

                // Retest may not put a second execution of the triple in flight
                if let Some(other) = executions::find_in_flight_execution(
                    &txn,
                    execution.test_cycle_id,
                    execution.test_case_id,
                    execution.assignee_id,
                    Some(execution.id),
                )
                .await?
                {
                    return Err(AppError::Conflict(format!(
                        "Execution {} of this case is already {} for the assignee in this cycle",
                        other.id, other.status
                    )));
                }

                executions::set_execution_status(&txn, execution, ExecutionStatus::Reteste, now)
                    .await?;
                let reset_steps =
                    execution_steps::reset_reproved_steps(&txn, defect.execution_id, now).await?;

                Some(RetestTransition {
                    execution_id: defect.execution_id,
                    reset_steps,
                })
            } else {
                None
            };

            Ok::<_, AppError>((defect, retest))
        }
        .await;
        let (defect, retest) = db::finish(txn, outcome).await?;

        info!(defect_id = %defect.id, status = %defect.status, "Defect updated");
        self.record(
            actor,
            AuditAction::Update,
            EntityKind::Defect,
            defect.id,
            format!("status={}", defect.status),
        );

        if let Some(retest) = retest {
            info!(
                execution_id = %retest.execution_id,
                reset_steps = retest.reset_steps,
                "Execution moved to retest"
            );
            self.record(
                actor,
                AuditAction::Update,
                EntityKind::Execution,
                retest.execution_id,
                format!("status=reteste reset_steps={}", retest.reset_steps),
            );
        }

        Defect::try_from(defect)
    }

    /// Get a defect by ID.
    pub async fn get_defect(&self, id: Uuid) -> AppResult<Defect> {
        let defect = defects::find_defect(self.pool.connection(), id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Defect {}", id)))?;

        Defect::try_from(defect)
    }

    /// List defects across every execution, oldest first.
    ///
    /// Actors whose access level is configured for the overview see all
    /// defects; everyone else sees only those filed against executions
    /// assigned to them.
    pub async fn list_visible_defects(
        &self,
        actor: &Actor,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> AppResult<Vec<Defect>> {
        let assignee_id = if actor.has_any_level(&self.settings.defect_overview_access_levels) {
            None
        } else {
            Some(actor.id)
        };

        defects::list_all_defects(
            self.pool.connection(),
            assignee_id,
            clamped_limit(limit),
            offset.unwrap_or(0),
        )
        .await?
        .into_iter()
        .map(Defect::try_from)
        .collect()
    }

    /// List the defects filed against an execution, oldest first.
    pub async fn list_defects(&self, execution_id: Uuid) -> AppResult<Vec<Defect>> {
        let conn = self.pool.connection();
        if executions::find_execution(conn, execution_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Execution {}", execution_id)));
        }

        defects::list_defects(conn, execution_id)
            .await?
            .into_iter()
            .map(Defect::try_from)
            .collect()
    }
}
