//! Cycle Registry: time-boxed windows that executions are scheduled into.

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::db::{self, executions, test_cycles};
use crate::error::{AppError, AppResult};
use crate::models::{
    Actor, AuditAction, CycleStatus, EntityKind, NewTestCycle, TestCycle, TestCyclePatch,
};

use super::Engine;
use super::engine::required_name;

fn check_window(starts_at: Option<DateTime<Utc>>, ends_at: Option<DateTime<Utc>>) -> AppResult<()> {
    if let (Some(starts_at), Some(ends_at)) = (starts_at, ends_at)
        && ends_at < starts_at
    {
        return Err(AppError::Rejected(
            "Cycle end date must not precede its start date".to_string(),
        ));
    }
    Ok(())
}

impl Engine {
    /// Create a planned cycle with the next sequential number of its project.
    pub async fn create_cycle(&self, actor: &Actor, input: NewTestCycle) -> AppResult<TestCycle> {
        let name = required_name("Cycle name", &input.name)?;
        check_window(input.starts_at, input.ends_at)?;

        let now = Utc::now();
        let txn = self.pool.begin().await?;
        let outcome = async {
            if test_cycles::find_test_cycle_by_name(&txn, input.project_id, &name)
                .await?
                .is_some()
            {
                return Err(AppError::Conflict(format!(
                    "Cycle '{}' already exists in project {}",
                    name, input.project_id
                )));
            }

            let number = test_cycles::next_cycle_number(&txn, input.project_id).await?;
            test_cycles::insert_test_cycle(&txn, &input, number, now).await
        }
        .await;
        let cycle = db::finish(txn, outcome).await?;

        info!(test_cycle_id = %cycle.id, number = cycle.number, "Test cycle created");
        self.record(
            actor,
            AuditAction::Create,
            EntityKind::TestCycle,
            cycle.id,
            format!("name={} number={}", cycle.name, cycle.number),
        );

        TestCycle::try_from(cycle)
    }

    /// Update a cycle. Completing a cycle requires every execution in it to
    /// have left `pending` and `in_progress`.
    pub async fn update_cycle(
        &self,
        actor: &Actor,
        id: Uuid,
        patch: TestCyclePatch,
    ) -> AppResult<TestCycle> {
        if let Some(name) = &patch.name {
            required_name("Cycle name", name)?;
        }

        let now = Utc::now();
        let txn = self.pool.begin().await?;
        let outcome = async {
            let cycle = test_cycles::find_test_cycle(&txn, id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Test cycle {}", id)))?;

            check_window(
                patch.starts_at.or(cycle.starts_at),
                patch.ends_at.or(cycle.ends_at),
            )?;

            if let Some(name) = &patch.name {
                let name = name.trim();
                if let Some(other) =
                    test_cycles::find_test_cycle_by_name(&txn, cycle.project_id, name).await?
                    && other.id != cycle.id
                {
                    return Err(AppError::Conflict(format!(
                        "Cycle '{}' already exists in project {}",
                        name, cycle.project_id
                    )));
                }
            }

            if patch.status == Some(CycleStatus::Completed) {
                let unfinished = executions::count_unfinished_in_cycle(&txn, cycle.id).await?;
                if unfinished > 0 {
                    return Err(AppError::Rejected(format!(
                        "Cycle {} still has {} pending or in-progress executions",
                        cycle.id, unfinished
                    )));
                }
            }

            test_cycles::update_test_cycle(&txn, cycle, &patch, now).await
        }
        .await;
        let cycle = db::finish(txn, outcome).await?;

        info!(test_cycle_id = %cycle.id, status = %cycle.status, "Test cycle updated");
        self.record(
            actor,
            AuditAction::Update,
            EntityKind::TestCycle,
            cycle.id,
            format!("status={}", cycle.status),
        );

        TestCycle::try_from(cycle)
    }

    /// Get a cycle by ID.
    pub async fn get_cycle(&self, id: Uuid) -> AppResult<TestCycle> {
        let cycle = test_cycles::find_test_cycle(self.pool.connection(), id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Test cycle {}", id)))?;

        TestCycle::try_from(cycle)
    }

    /// List a project's cycles in number order.
    pub async fn list_cycles(&self, project_id: Uuid) -> AppResult<Vec<TestCycle>> {
        test_cycles::list_test_cycles(self.pool.connection(), project_id)
            .await?
            .into_iter()
            .map(TestCycle::try_from)
            .collect()
    }

    /// Whether any execution of the cycle is still pending or in progress.
    pub async fn cycle_has_pending_executions(&self, id: Uuid) -> AppResult<bool> {
        let conn = self.pool.connection();
        if test_cycles::find_test_cycle(conn, id).await?.is_none() {
            return Err(AppError::NotFound(format!("Test cycle {}", id)));
        }

        Ok(executions::count_unfinished_in_cycle(conn, id).await? > 0)
    }
}
