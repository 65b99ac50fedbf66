//! Cascade Deletion Manager.
//!
//! The schema declares no implicit cascades; every delete below removes
//! dependants first, in a fixed order, inside one transaction.

use sea_orm::ConnectionTrait;
use tracing::info;
use uuid::Uuid;

use crate::db::{self, defects, execution_steps, executions, test_cases, test_cycles, test_steps};
use crate::error::{AppError, AppResult};
use crate::models::{Actor, AuditAction, CascadeReport, EntityKind};

use super::Engine;

/// Delete executions with their steps and defects.
async fn remove_executions<C: ConnectionTrait>(
    db: &C,
    execution_ids: &[Uuid],
    report: &mut CascadeReport,
) -> AppResult<()> {
    report.execution_steps += execution_steps::delete_steps_of_executions(db, execution_ids).await?;
    report.defects += defects::delete_defects_of_executions(db, execution_ids).await?;
    report.executions += executions::delete_executions(db, execution_ids).await?;
    Ok(())
}

impl Engine {
    /// Delete a test case, every execution created from it and everything
    /// under those executions, then the case's steps and the case itself.
    pub async fn delete_test_case(&self, actor: &Actor, id: Uuid) -> AppResult<CascadeReport> {
        let txn = self.pool.begin().await?;
        let outcome = async {
            if test_cases::find_test_case(&txn, id).await?.is_none() {
                return Err(AppError::NotFound(format!("Test case {}", id)));
            }

            let mut report = CascadeReport::default();
            let execution_ids = executions::execution_ids_for_case(&txn, id).await?;
            remove_executions(&txn, &execution_ids, &mut report).await?;
            report.test_steps += test_steps::delete_test_steps_for_case(&txn, id).await?;
            report.test_cases += test_cases::delete_test_case(&txn, id).await?;
            Ok(report)
        }
        .await;
        let report = db::finish(txn, outcome).await?;

        info!(test_case_id = %id, ?report, "Test case deleted");
        self.record(
            actor,
            AuditAction::Delete,
            EntityKind::TestCase,
            id,
            format!("rows_removed={}", report.total()),
        );

        Ok(report)
    }

    /// Delete an execution with its steps and defects.
    pub async fn delete_execution(&self, actor: &Actor, id: Uuid) -> AppResult<CascadeReport> {
        let txn = self.pool.begin().await?;
        let outcome = async {
            if executions::find_execution(&txn, id).await?.is_none() {
                return Err(AppError::NotFound(format!("Execution {}", id)));
            }

            let mut report = CascadeReport::default();
            remove_executions(&txn, &[id], &mut report).await?;
            Ok(report)
        }
        .await;
        let report = db::finish(txn, outcome).await?;

        info!(execution_id = %id, ?report, "Execution deleted");
        self.record(
            actor,
            AuditAction::Delete,
            EntityKind::Execution,
            id,
            format!("rows_removed={}", report.total()),
        );

        Ok(report)
    }

    /// Delete a single defect.
    pub async fn delete_defect(&self, actor: &Actor, id: Uuid) -> AppResult<CascadeReport> {
        let txn = self.pool.begin().await?;
        let outcome = async {
            if defects::find_defect(&txn, id).await?.is_none() {
                return Err(AppError::NotFound(format!("Defect {}", id)));
            }

            Ok(CascadeReport {
                defects: defects::delete_defect(&txn, id).await?,
                ..CascadeReport::default()
            })
        }
        .await;
        let report = db::finish(txn, outcome).await?;

        info!(defect_id = %id, "Defect deleted");
        self.record(actor, AuditAction::Delete, EntityKind::Defect, id, "deleted");

        Ok(report)
    }

    /// Delete a cycle with every execution scheduled into it.
    pub async fn delete_cycle(&self, actor: &Actor, id: Uuid) -> AppResult<CascadeReport> {
        let txn = self.pool.begin().await?;
        let outcome = async {
            if test_cycles::find_test_cycle(&txn, id).await?.is_none() {
                return Err(AppError::NotFound(format!("Test cycle {}", id)));
            }

            let mut report = CascadeReport::default();
            let execution_ids = executions::execution_ids_for_cycle(&txn, id).await?;
            remove_executions(&txn, &execution_ids, &mut report).await?;
            report.test_cycles += test_cycles::delete_test_cycle(&txn, id).await?;
            Ok(report)
        }
        .await;
        let report = db::finish(txn, outcome).await?;

        info!(test_cycle_id = %id, ?report, "Test cycle deleted");
        self.record(
            actor,
            AuditAction::Delete,
            EntityKind::TestCycle,
            id,
            format!("rows_removed={}", report.total()),
        );

        Ok(report)
    }
}
