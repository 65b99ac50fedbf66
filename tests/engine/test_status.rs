//! Status aggregation over stored steps and manual finalization.

use testbench_lib::config::EngineSettings;
use testbench_lib::error::AppError;
use testbench_lib::models::{
    AccessLevel, AuditAction, ExecutionStatus, StepOutcome, StepResultInput,
};
use uuid::Uuid;

use super::test_helpers::*;

#[tokio::test]
async fn test_status_follows_priority_rules() {
    let engine = create_test_engine().await;
    let case = seed_case(&engine, "Checkout", 3).await;
    let cycle = seed_cycle(&engine, "Sprint 1").await;
    let assignee = tester();
    let execution = seed_execution(&engine, &cycle, &case, &assignee).await;
    let steps: Vec<Uuid> = execution.steps.iter().map(|s| s.id).collect();

    let record = |step: Uuid, outcome: StepOutcome| {
        let engine = engine.clone();
        async move {
            engine
                .record_result(&assignee, step, StepResultInput::outcome(outcome))
                .await
                .unwrap();
            engine
                .get_execution(execution.execution.id)
                .await
                .unwrap()
                .execution
                .status
        }
    };

    assert_eq!(record(steps[0], StepOutcome::Blocked).await, ExecutionStatus::Blocked);
    assert_eq!(record(steps[1], StepOutcome::Reproved).await, ExecutionStatus::Failed);
    assert_eq!(record(steps[1], StepOutcome::Approved).await, ExecutionStatus::Blocked);
    assert_eq!(record(steps[0], StepOutcome::Approved).await, ExecutionStatus::InProgress);
    assert_eq!(record(steps[2], StepOutcome::Approved).await, ExecutionStatus::Passed);
}

#[tokio::test]
async fn test_unchanged_status_is_not_rewritten() {
    let engine = create_test_engine().await;
    let case = seed_case(&engine, "Checkout", 2).await;
    let cycle = seed_cycle(&engine, "Sprint 1").await;
    let assignee = tester();
    let execution = seed_execution(&engine, &cycle, &case, &assignee).await;

    engine
        .record_result(
            &assignee,
            execution.steps[0].id,
            StepResultInput::outcome(StepOutcome::Approved),
        )
        .await
        .unwrap();
    let first = engine.get_execution(execution.execution.id).await.unwrap();
    assert_eq!(first.execution.status, ExecutionStatus::InProgress);

    engine
        .record_result(
            &assignee,
            execution.steps[0].id,
            StepResultInput::outcome(StepOutcome::Approved).with_result("Still fine"),
        )
        .await
        .unwrap();
    let second = engine.get_execution(execution.execution.id).await.unwrap();

    assert_eq!(second.execution.status, ExecutionStatus::InProgress);
    assert_eq!(second.execution.updated_at, first.execution.updated_at);
}

#[tokio::test]
async fn test_finalize_forces_terminal_status() {
    let engine = create_test_engine().await;
    let case = seed_case(&engine, "Checkout", 2).await;
    let cycle = seed_cycle(&engine, "Sprint 1").await;
    let assignee = tester();
    let execution = seed_execution(&engine, &cycle, &case, &assignee).await;

    let finalized = engine
        .finalize(&admin(), execution.execution.id, ExecutionStatus::Blocked)
        .await
        .unwrap();
    assert_eq!(finalized.status, ExecutionStatus::Blocked);

    // The steps are untouched and the aggregator did not run
    let detail = engine.get_execution(execution.execution.id).await.unwrap();
    assert_eq!(detail.execution.status, ExecutionStatus::Blocked);
    assert!(detail.steps.iter().all(|s| s.outcome == StepOutcome::Pending));

    // The next outcome write derives the status again
    engine
        .record_result(
            &assignee,
            execution.steps[0].id,
            StepResultInput::outcome(StepOutcome::Approved),
        )
        .await
        .unwrap();
    let detail = engine.get_execution(execution.execution.id).await.unwrap();
    assert_eq!(detail.execution.status, ExecutionStatus::InProgress);
}

#[tokio::test]
async fn test_finalize_to_stored_status_publishes_nothing() {
    let engine = create_test_engine().await;
    let case = seed_case(&engine, "Checkout", 1).await;
    let cycle = seed_cycle(&engine, "Sprint 1").await;
    let execution = seed_execution(&engine, &cycle, &case, &tester()).await;
    let mut audit = engine.audit_trail().subscribe();

    let first = engine
        .finalize(&admin(), execution.execution.id, ExecutionStatus::Passed)
        .await
        .unwrap();
    let record = audit.try_recv().unwrap();
    assert_eq!(record.entity_id, execution.execution.id);
    assert_eq!(record.action, AuditAction::Update);

    let second = engine
        .finalize(&admin(), execution.execution.id, ExecutionStatus::Passed)
        .await
        .unwrap();
    assert_eq!(second.updated_at, first.updated_at);
    assert!(audit.try_recv().is_err());
}

#[tokio::test]
async fn test_finalize_requires_access_level() {
    let engine = create_test_engine().await;
    let case = seed_case(&engine, "Checkout", 1).await;
    let cycle = seed_cycle(&engine, "Sprint 1").await;
    let execution = seed_execution(&engine, &cycle, &case, &tester()).await;

    let err = engine
        .finalize(&tester(), execution.execution.id, ExecutionStatus::Passed)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)), "{err:?}");

    let permissive = create_test_engine_with(EngineSettings {
        finalize_access_levels: vec![AccessLevel::Admin, AccessLevel::User],
        ..EngineSettings::default()
    })
    .await;
    let case = seed_case(&permissive, "Checkout", 1).await;
    let cycle = seed_cycle(&permissive, "Sprint 1").await;
    let execution = seed_execution(&permissive, &cycle, &case, &tester()).await;
    permissive
        .finalize(&tester(), execution.execution.id, ExecutionStatus::Passed)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_finalize_rejects_non_terminal_status() {
    let engine = create_test_engine().await;
    let case = seed_case(&engine, "Checkout", 1).await;
    let cycle = seed_cycle(&engine, "Sprint 1").await;
    let execution = seed_execution(&engine, &cycle, &case, &tester()).await;

    for status in [
        ExecutionStatus::Pending,
        ExecutionStatus::InProgress,
        ExecutionStatus::Reteste,
    ] {
        let err = engine
            .finalize(&admin(), execution.execution.id, status)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Rejected(_)), "{status}: {err:?}");
    }

    let err = engine
        .finalize(&admin(), Uuid::now_v7(), ExecutionStatus::Passed)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
