//! Normalization of legacy status vocabulary.
//!
//! Earlier schema revisions stored Portuguese values in every status column,
//! and different revisions disagreed on the execution vocabulary. Values with
//! an unambiguous canonical counterpart are rewritten in place. Execution
//! statuses without one (the catch-all `fechado`) are re-derived from the
//! step outcomes instead of being guessed.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use tracing::{debug, warn};

use crate::entity::{defect, execution, execution_step, test_case, test_cycle};
use crate::error::{AppError, AppResult};
use crate::models::{
    CycleStatus, DefectStatus, ExecutionStatus, Priority, Severity, StepOutcome,
};
use crate::services::aggregator::derive_status;

const LEGACY_EXECUTION_STATUSES: &[&str] =
    &["pendente", "em_progresso", "passou", "falhou", "falha", "bloqueado"];
const LEGACY_STEP_OUTCOMES: &[&str] = &["pendente", "aprovado", "reprovado", "bloqueado"];
const LEGACY_DEFECT_STATUSES: &[&str] = &["aberto", "em_teste", "corrigido", "fechado"];
const LEGACY_SEVERITIES: &[&str] = &["critico", "alto", "medio", "baixo"];
const LEGACY_PRIORITIES: &[&str] = &["alta", "media", "baixa"];
const LEGACY_CYCLE_STATUSES: &[&str] = &[
    "planejado",
    "em_execucao",
    "concluido",
    "pausado",
    "cancelado",
    "erro",
];

/// Outcome of a normalization pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacyNormalization {
    /// Rows whose value was rewritten by direct mapping.
    pub rewritten: u64,
    /// Executions whose status was recomputed from their steps.
    pub rederived_executions: u64,
}

/// Pair every legacy value with its canonical replacement.
fn mapping(
    legacy: &[&'static str],
    canonical: fn(&str) -> Option<&'static str>,
) -> Vec<(&'static str, &'static str)> {
    legacy
        .iter()
        .filter_map(|value| canonical(value).map(|mapped| (*value, mapped)))
        .collect()
}

/// Rewrite `column` of entity `E` for every pair in `pairs`.
async fn rewrite<C, E>(db: &C, column: E::Column, pairs: &[(&str, &str)]) -> AppResult<u64>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let mut total = 0;
    for (legacy, canonical) in pairs {
        let result = E::update_many()
            .col_expr(column, Expr::value(*canonical))
            .filter(column.eq(*legacy))
            .exec(db)
            .await
            .map_err(AppError::db("Failed to rewrite legacy value"))?;

        if result.rows_affected > 0 {
            debug!(legacy, canonical, rows = result.rows_affected, "Rewrote legacy value");
        }
        total += result.rows_affected;
    }
    Ok(total)
}

/// Rewrite all legacy values to the canonical vocabulary.
///
/// Step outcomes are normalized before executions are re-derived from them.
pub async fn normalize_legacy_values<C: ConnectionTrait>(
    db: &C,
) -> AppResult<LegacyNormalization> {
    let mut report = LegacyNormalization::default();

    report.rewritten += rewrite::<_, execution_step::Entity>(
        db,
        execution_step::Column::Outcome,
        &mapping(LEGACY_STEP_OUTCOMES, |s| {
            StepOutcome::from_legacy(s).map(|o| o.as_str())
        }),
    )
    .await?;

    report.rewritten += rewrite::<_, execution::Entity>(
        db,
        execution::Column::Status,
        &mapping(LEGACY_EXECUTION_STATUSES, |s| {
            ExecutionStatus::from_legacy(s).map(|o| o.as_str())
        }),
    )
    .await?;

    report.rewritten += rewrite::<_, defect::Entity>(
        db,
        defect::Column::Status,
        &mapping(LEGACY_DEFECT_STATUSES, |s| {
            DefectStatus::from_legacy(s).map(|o| o.as_str())
        }),
    )
    .await?;

    report.rewritten += rewrite::<_, defect::Entity>(
        db,
        defect::Column::Severity,
        &mapping(LEGACY_SEVERITIES, |s| Severity::from_legacy(s).map(|o| o.as_str())),
    )
    .await?;

    report.rewritten += rewrite::<_, test_case::Entity>(
        db,
        test_case::Column::Priority,
        &mapping(LEGACY_PRIORITIES, |s| Priority::from_legacy(s).map(|o| o.as_str())),
    )
    .await?;

    report.rewritten += rewrite::<_, test_cycle::Entity>(
        db,
        test_cycle::Column::Status,
        &mapping(LEGACY_CYCLE_STATUSES, |s| {
            CycleStatus::from_legacy(s).map(|o| o.as_str())
        }),
    )
    .await?;

    report.rederived_executions = rederive_unmapped_executions(db).await?;

    Ok(report)
}

/// Recompute the status of every execution still holding a non-canonical value.
async fn rederive_unmapped_executions<C: ConnectionTrait>(db: &C) -> AppResult<u64> {
    let canonical = [
        ExecutionStatus::Pending,
        ExecutionStatus::InProgress,
        ExecutionStatus::Passed,
        ExecutionStatus::Failed,
        ExecutionStatus::Blocked,
        ExecutionStatus::Reteste,
    ]
    .map(|s| s.as_str());

    let unmapped = execution::Entity::find()
        .filter(execution::Column::Status.is_not_in(canonical))
        .all(db)
        .await
        .map_err(AppError::db("Failed to load executions with legacy status"))?;

    let mut count = 0;
    for model in unmapped {
        let steps = super::execution_steps::list_execution_steps(db, model.id).await?;
        let outcomes: Vec<StepOutcome> = steps
            .iter()
            .filter_map(|step| StepOutcome::parse(&step.outcome))
            .collect();

        if outcomes.len() != steps.len() {
            warn!(
                execution_id = %model.id,
                "Execution has steps with unknown outcomes; deriving from the known ones"
            );
        }

        let derived = derive_status(&outcomes);
        debug!(
            execution_id = %model.id,
            legacy = %model.status,
            derived = %derived,
            "Re-derived legacy execution status"
        );
        super::executions::set_execution_status(db, model, derived, Utc::now()).await?;
        count += 1;
    }

    Ok(count)
}
