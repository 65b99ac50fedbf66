//! Template Catalog: test cases and their ordered steps.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use sea_orm::ConnectionTrait;
use tracing::info;
use uuid::Uuid;

use crate::db::{self, execution_steps, executions, test_cases, test_steps};
use crate::entity::test_step;
use crate::error::{AppError, AppResult};
use crate::models::{
    Actor, AuditAction, EntityKind, NewTestCase, TestCase, TestCaseDetail, TestCasePatch,
    TestStep, TestStepPatch, clamped_limit,
};

use super::Engine;
use super::aggregator::{derived_status_of, refresh_execution_status};
use super::engine::{required_name, required_text};

/// What a step diff-sync changed.
#[derive(Debug, Default)]
struct StepSync {
    steps: Vec<test_step::Model>,
    removed: u64,
    removed_snapshots: u64,
    rederived_executions: usize,
}

fn position(index: usize) -> AppResult<i32> {
    i32::try_from(index + 1)
        .map_err(|_| AppError::Rejected("test case has too many steps".to_string()))
}

impl Engine {
    /// Create a test case and its steps, positioned 1..N in the given order.
    pub async fn create_test_case(
        &self,
        actor: &Actor,
        input: NewTestCase,
    ) -> AppResult<TestCaseDetail> {
        let name = required_name("Test case name", &input.name)?;
        for step in &input.steps {
            required_text("Step action", &step.action)?;
            required_text("Step expected result", &step.expected_result)?;
        }

        let now = Utc::now();
        let txn = self.pool.begin().await?;
        let outcome = async {
            if test_cases::find_test_case_by_name(&txn, input.project_id, &name)
                .await?
                .is_some()
            {
                return Err(AppError::Conflict(format!(
                    "Test case '{}' already exists in project {}",
                    name, input.project_id
                )));
            }

            let case = test_cases::insert_test_case(&txn, &input, now).await?;
            let mut steps = Vec::with_capacity(input.steps.len());
            for (index, step) in input.steps.iter().enumerate() {
                steps.push(
                    test_steps::insert_test_step(
                        &txn,
                        case.id,
                        position(index)?,
                        step.action.trim(),
                        step.expected_result.trim(),
                        now,
                    )
                    .await?,
                );
            }
            Ok::<_, AppError>((case, steps))
        }
        .await;
        let (case, steps) = db::finish(txn, outcome).await?;

        info!(test_case_id = %case.id, steps = steps.len(), "Test case created");
        self.record(
            actor,
            AuditAction::Create,
            EntityKind::TestCase,
            case.id,
            format!("name={}", case.name),
        );

        detail(case, steps)
    }

    /// Update a test case. When the patch carries steps, the persisted steps
    /// are diff-synced against them.
    pub async fn update_test_case(
        &self,
        actor: &Actor,
        id: Uuid,
        patch: TestCasePatch,
    ) -> AppResult<TestCaseDetail> {
        if let Some(name) = &patch.name {
            required_name("Test case name", name)?;
        }
        if let Some(steps) = &patch.steps {
            validate_step_patch(steps)?;
        }

        let now = Utc::now();
        let txn = self.pool.begin().await?;
        let outcome = async {
            let case = test_cases::find_test_case(&txn, id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Test case {}", id)))?;

            if let Some(name) = &patch.name {
                let name = name.trim();
                if let Some(other) =
                    test_cases::find_test_case_by_name(&txn, case.project_id, name).await?
                    && other.id != case.id
                {
                    return Err(AppError::Conflict(format!(
                        "Test case '{}' already exists in project {}",
                        name, case.project_id
                    )));
                }
            }

            let case = test_cases::update_test_case(&txn, case, &patch, now).await?;
            let sync = match &patch.steps {
                Some(desired) => sync_steps(&txn, case.id, desired, now).await?,
                None => StepSync {
                    steps: test_steps::list_test_steps(&txn, case.id).await?,
                    ..StepSync::default()
                },
            };
            Ok::<_, AppError>((case, sync))
        }
        .await;
        let (case, sync) = db::finish(txn, outcome).await?;

        info!(
            test_case_id = %case.id,
            steps = sync.steps.len(),
            removed_steps = sync.removed,
            removed_snapshots = sync.removed_snapshots,
            rederived_executions = sync.rederived_executions,
            "Test case updated"
        );
        self.record(
            actor,
            AuditAction::Update,
            EntityKind::TestCase,
            case.id,
            format!(
                "steps={} removed_steps={} removed_snapshots={}",
                sync.steps.len(),
                sync.removed,
                sync.removed_snapshots
            ),
        );

        detail(case, sync.steps)
    }

    /// Get a test case with its steps.
    pub async fn get_test_case(&self, id: Uuid) -> AppResult<TestCaseDetail> {
        let conn = self.pool.connection();
        let case = test_cases::find_test_case(conn, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Test case {}", id)))?;
        let steps = test_steps::list_test_steps(conn, id).await?;

        detail(case, steps)
    }

    /// List a project's test cases by name.
    pub async fn list_test_cases(
        &self,
        project_id: Uuid,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> AppResult<Vec<TestCase>> {
        test_cases::list_test_cases(
            self.pool.connection(),
            project_id,
            clamped_limit(limit),
            offset.unwrap_or(0),
        )
        .await?
        .into_iter()
        .map(TestCase::try_from)
        .collect()
    }
}

fn detail(
    case: crate::entity::test_case::Model,
    steps: Vec<test_step::Model>,
) -> AppResult<TestCaseDetail> {
    Ok(TestCaseDetail {
        case: TestCase::try_from(case)?,
        steps: steps.into_iter().map(TestStep::from).collect(),
    })
}

fn validate_step_patch(steps: &[TestStepPatch]) -> AppResult<()> {
    let mut seen = HashSet::new();
    for step in steps {
        required_text("Step action", &step.action)?;
        required_text("Step expected result", &step.expected_result)?;
        if let Some(id) = step.id
            && !seen.insert(id)
        {
            return Err(AppError::Rejected(format!(
                "Step {} appears more than once in the patch",
                id
            )));
        }
    }
    Ok(())
}

/// Make the persisted steps of a case match `desired`, in order.
///
/// Steps with an id are updated in place, steps without one are inserted and
/// persisted steps missing from `desired` are deleted together with the
/// execution snapshots still referencing them. Executions that lost a snapshot
/// get their status re-derived unless it was set outside the aggregator.
/// Kept steps are first parked at negative positions so the (case, position)
/// unique index never sees a transient duplicate.
async fn sync_steps<C: ConnectionTrait>(
    db: &C,
    test_case_id: Uuid,
    desired: &[TestStepPatch],
    now: DateTime<Utc>,
) -> AppResult<StepSync> {
    let mut persisted: HashMap<Uuid, test_step::Model> = test_steps::list_test_steps(db, test_case_id)
        .await?
        .into_iter()
        .map(|step| (step.id, step))
        .collect();

    if let Some(foreign) = desired
        .iter()
        .filter_map(|step| step.id)
        .find(|id| !persisted.contains_key(id))
    {
        return Err(AppError::Rejected(format!(
            "Step {} does not belong to test case {}",
            foreign, test_case_id
        )));
    }

    let kept: HashSet<Uuid> = desired.iter().filter_map(|step| step.id).collect();
    let removed: Vec<Uuid> = persisted
        .keys()
        .filter(|id| !kept.contains(id))
        .copied()
        .collect();

    // Only executions whose stored status follows their steps are re-derived.
    // Untouched, finalized and retest executions keep theirs.
    let mut rederive = Vec::new();
    for execution_id in execution_steps::execution_ids_of_snapshots(db, &removed).await? {
        let Some(execution) = executions::find_execution(db, execution_id).await? else {
            continue;
        };
        if execution.status == derived_status_of(db, execution_id).await?.as_str() {
            rederive.push(execution_id);
        }
    }

    let removed_snapshots = execution_steps::delete_snapshots_of_test_steps(db, &removed).await?;
    let removed_count = test_steps::delete_test_steps(db, &removed).await?;

    let mut parked = HashMap::with_capacity(kept.len());
    for (index, step) in desired.iter().enumerate() {
        if let Some(id) = step.id
            && let Some(model) = persisted.remove(&id)
        {
            let model = test_steps::set_test_step_position(db, model, -position(index)?).await?;
            parked.insert(id, model);
        }
    }

    let mut steps = Vec::with_capacity(desired.len());
    for (index, step) in desired.iter().enumerate() {
        let position = position(index)?;
        let action = step.action.trim();
        let expected_result = step.expected_result.trim();

        let model = match step.id.and_then(|id| parked.remove(&id)) {
            Some(model) => {
                test_steps::update_test_step(db, model, position, action, expected_result, now)
                    .await?
            }
            None => {
                test_steps::insert_test_step(db, test_case_id, position, action, expected_result, now)
                    .await?
            }
        };
        steps.push(model);
    }

    for execution_id in &rederive {
        refresh_execution_status(db, *execution_id).await?;
    }

    Ok(StepSync {
        steps,
        removed: removed_count,
        removed_snapshots,
        rederived_executions: rederive.len(),
    })
}
