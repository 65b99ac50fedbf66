//! Defect workflow: idempotent filing and the fix-to-retest transition.

use testbench_lib::config::EngineSettings;
use testbench_lib::error::AppError;
use testbench_lib::models::{
    AccessLevel, AuditAction, DefectPatch, DefectStatus, EntityKind, ExecutionDetail,
    ExecutionStatus, NewDefect, Severity, StepOutcome, StepResultInput,
};
use testbench_lib::services::Engine;
use uuid::Uuid;

use super::test_helpers::*;

/// Allocate a 4-step execution and record approved, reproved, blocked, reproved.
async fn failed_execution(engine: &Engine) -> ExecutionDetail {
    let case = seed_case(engine, "Checkout", 4).await;
    let cycle = seed_cycle(engine, "Sprint 1").await;
    let assignee = tester();
    let execution = seed_execution(engine, &cycle, &case, &assignee).await;

    let outcomes = [
        StepOutcome::Approved,
        StepOutcome::Reproved,
        StepOutcome::Blocked,
        StepOutcome::Reproved,
    ];
    for (step, outcome) in execution.steps.iter().zip(outcomes) {
        engine
            .record_result(
                &assignee,
                step.id,
                StepResultInput::outcome(outcome)
                    .with_result(format!("{outcome} observed"))
                    .with_evidence(vec![format!("https://blob.example/{}.png", step.id)]),
            )
            .await
            .unwrap();
    }

    engine.get_execution(execution.execution.id).await.unwrap()
}

#[tokio::test]
async fn test_create_defect_is_idempotent_while_open() {
    let engine = create_test_engine().await;
    let execution = failed_execution(&engine).await;
    let execution_id = execution.execution.id;

    let first = engine
        .create_defect(
            &tester(),
            NewDefect::new(execution_id, "Total is wrong", Severity::High),
        )
        .await
        .unwrap();
    assert!(!first.is_existing);
    assert_eq!(first.defect.status, DefectStatus::Open);

    let second = engine
        .create_defect(
            &tester(),
            NewDefect::new(execution_id, "  Total is wrong ", Severity::Low),
        )
        .await
        .unwrap();
    assert!(second.is_existing);
    assert_eq!(second.defect.id, first.defect.id);
    assert_eq!(second.defect.severity, Severity::High);

    assert_eq!(engine.list_defects(execution_id).await.unwrap().len(), 1);

    // Once the defect leaves `open`, the same title files a new one
    engine
        .update_defect(&admin(), first.defect.id, DefectPatch::status(DefectStatus::InReview))
        .await
        .unwrap();
    let third = engine
        .create_defect(
            &tester(),
            NewDefect::new(execution_id, "Total is wrong", Severity::High),
        )
        .await
        .unwrap();
    assert!(!third.is_existing);
    assert_ne!(third.defect.id, first.defect.id);
}

#[tokio::test]
async fn test_create_defect_validation() {
    let engine = create_test_engine().await;
    let execution = failed_execution(&engine).await;

    let err = engine
        .create_defect(
            &tester(),
            NewDefect::new(Uuid::now_v7(), "Orphan", Severity::Low),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = engine
        .create_defect(
            &tester(),
            NewDefect::new(execution.execution.id, "   ", Severity::Low),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Rejected(_)));

    let mut too_much = NewDefect::new(execution.execution.id, "Screens", Severity::Low);
    too_much.evidence = (0..4).map(|n| format!("https://blob.example/{n}.png")).collect();
    let err = engine.create_defect(&tester(), too_much).await.unwrap_err();
    assert!(matches!(err, AppError::Rejected(_)));

    // Longer than the title column holds
    let err = engine
        .create_defect(
            &tester(),
            NewDefect::new(execution.execution.id, "t".repeat(256), Severity::Low),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Rejected(_)), "{err:?}");
    assert!(engine.list_defects(execution.execution.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_fixed_resets_only_reproved_steps() {
    let engine = create_test_engine().await;
    let before = failed_execution(&engine).await;
    assert_eq!(before.execution.status, ExecutionStatus::Failed);

    let defect = engine
        .create_defect(
            &tester(),
            NewDefect::new(before.execution.id, "Coupon ignored", Severity::Critical),
        )
        .await
        .unwrap()
        .defect;

    let fixed = engine
        .update_defect(&admin(), defect.id, DefectPatch::status(DefectStatus::Fixed))
        .await
        .unwrap();
    assert_eq!(fixed.status, DefectStatus::Fixed);

    let after = engine.get_execution(before.execution.id).await.unwrap();
    assert_eq!(after.execution.status, ExecutionStatus::Reteste);

    for (old, new) in before.steps.iter().zip(&after.steps) {
        if old.outcome == StepOutcome::Reproved {
            assert_eq!(new.outcome, StepOutcome::Pending);
            assert!(new.actual_result.is_none());
            assert!(new.evidence.is_empty());
        } else {
            assert_eq!(new, old, "non-reproved step changed");
        }
    }
    let reset = before
        .steps
        .iter()
        .filter(|s| s.outcome == StepOutcome::Reproved)
        .count();
    assert_eq!(reset, 2);
}

#[tokio::test]
async fn test_retest_fires_only_on_transition_into_fixed() {
    let engine = create_test_engine().await;
    let execution = failed_execution(&engine).await;
    let assignee = tester();

    let defect = engine
        .create_defect(
            &assignee,
            NewDefect::new(execution.execution.id, "Coupon ignored", Severity::Medium),
        )
        .await
        .unwrap()
        .defect;
    engine
        .update_defect(&admin(), defect.id, DefectPatch::status(DefectStatus::Fixed))
        .await
        .unwrap();

    // The retest fails again
    engine
        .record_result(
            &assignee,
            execution.steps[1].id,
            StepResultInput::outcome(StepOutcome::Reproved),
        )
        .await
        .unwrap();

    // Editing the description of a defect already fixed does not reset anything
    engine
        .update_defect(
            &admin(),
            defect.id,
            DefectPatch {
                description: Some("Coupon code is dropped on submit".to_string()),
                status: Some(DefectStatus::Fixed),
                ..DefectPatch::default()
            },
        )
        .await
        .unwrap();

    let detail = engine.get_execution(execution.execution.id).await.unwrap();
    assert_eq!(detail.execution.status, ExecutionStatus::Failed);
    assert_eq!(detail.steps[1].outcome, StepOutcome::Reproved);
}

#[tokio::test]
async fn test_update_defect_validation() {
    let engine = create_test_engine().await;
    let execution = failed_execution(&engine).await;
    let defect = engine
        .create_defect(
            &tester(),
            NewDefect::new(execution.execution.id, "Coupon ignored", Severity::Medium),
        )
        .await
        .unwrap()
        .defect;

    let err = engine
        .update_defect(&admin(), defect.id, DefectPatch::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Rejected(_)));

    let err = engine
        .update_defect(&admin(), Uuid::now_v7(), DefectPatch::status(DefectStatus::Closed))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let updated = engine
        .update_defect(
            &admin(),
            defect.id,
            DefectPatch {
                title: Some(" Coupon dropped ".to_string()),
                severity: Some(Severity::High),
                evidence: Some(vec!["https://blob.example/coupon.png".to_string()]),
                ..DefectPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.title, "Coupon dropped");
    assert_eq!(updated.severity, Severity::High);
    assert_eq!(updated.evidence.len(), 1);
    assert_eq!(engine.get_defect(defect.id).await.unwrap(), updated);
}

#[tokio::test]
async fn test_audit_records_emitted_after_commit() {
    let engine = create_test_engine().await;
    let execution = failed_execution(&engine).await;
    let mut audit = engine.audit_trail().subscribe();
    let actor = tester();

    let submission = engine
        .create_defect(
            &actor,
            NewDefect::new(execution.execution.id, "Coupon ignored", Severity::Medium),
        )
        .await
        .unwrap();

    let record = audit.try_recv().unwrap();
    assert_eq!(record.actor_id, actor.id);
    assert_eq!(record.action, AuditAction::Create);
    assert_eq!(record.entity_kind, EntityKind::Defect);
    assert_eq!(record.entity_id, submission.defect.id);

    // Idempotent re-submission and rejected calls publish nothing
    engine
        .create_defect(
            &actor,
            NewDefect::new(execution.execution.id, "Coupon ignored", Severity::Medium),
        )
        .await
        .unwrap();
    engine
        .update_defect(&actor, submission.defect.id, DefectPatch::default())
        .await
        .unwrap_err();
    assert!(audit.try_recv().is_err());

    engine
        .update_defect(&admin(), submission.defect.id, DefectPatch::status(DefectStatus::Fixed))
        .await
        .unwrap();
    let kinds: Vec<EntityKind> = (0..2).map(|_| audit.try_recv().unwrap().entity_kind).collect();
    assert_eq!(kinds, vec![EntityKind::Defect, EntityKind::Execution]);
}

#[tokio::test]
async fn test_fixed_conflicts_with_another_in_flight_execution() {
    let engine = create_test_engine().await;
    let failed = failed_execution(&engine).await;
    let failed_id = failed.execution.id;

    // A failed execution no longer blocks allocating the same triple again
    let rerun = engine
        .allocate(
            &admin(),
            failed.execution.test_cycle_id,
            failed.execution.test_case_id,
            failed.execution.assignee_id,
        )
        .await
        .unwrap();
    assert_eq!(rerun.execution.status, ExecutionStatus::Pending);

    let defect = engine
        .create_defect(
            &tester(),
            NewDefect::new(failed_id, "Coupon ignored", Severity::Medium),
        )
        .await
        .unwrap()
        .defect;
    let before = snapshot(&engine).await;

    let err = engine
        .update_defect(&admin(), defect.id, DefectPatch::status(DefectStatus::Fixed))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "{err:?}");
    assert_eq!(snapshot(&engine).await, before);

    // Once the rerun is removed the fix goes through
    engine.delete_execution(&admin(), rerun.execution.id).await.unwrap();
    engine
        .update_defect(&admin(), defect.id, DefectPatch::status(DefectStatus::Fixed))
        .await
        .unwrap();
    let detail = engine.get_execution(failed_id).await.unwrap();
    assert_eq!(detail.execution.status, ExecutionStatus::Reteste);
}

#[tokio::test]
async fn test_defect_overview_scoped_by_access_level() {
    let engine = create_test_engine().await;
    let case = seed_case(&engine, "Checkout", 1).await;
    let cycle = seed_cycle(&engine, "Sprint 1").await;
    let (alice, bob) = (tester(), tester());

    let mut filed = Vec::new();
    for (assignee, title) in [(&alice, "Cart empties"), (&bob, "Tax missing")] {
        let execution = seed_execution(&engine, &cycle, &case, assignee).await;
        let defect = engine
            .create_defect(
                assignee,
                NewDefect::new(execution.execution.id, title, Severity::Low),
            )
            .await
            .unwrap()
            .defect;
        filed.push(defect);
    }

    let all = engine.list_visible_defects(&admin(), None, None).await.unwrap();
    assert_eq!(all, filed);

    let own = engine.list_visible_defects(&alice, None, None).await.unwrap();
    assert_eq!(own, vec![filed[0].clone()]);
    let own = engine.list_visible_defects(&bob, None, None).await.unwrap();
    assert_eq!(own, vec![filed[1].clone()]);

    let page = engine
        .list_visible_defects(&admin(), Some(1), Some(1))
        .await
        .unwrap();
    assert_eq!(page, vec![filed[1].clone()]);

    // Widening the overview to every level shows testers everything too
    let open = Engine::new(
        engine.pool().clone(),
        EngineSettings {
            defect_overview_access_levels: vec![AccessLevel::Admin, AccessLevel::User],
            ..EngineSettings::default()
        },
    );
    assert_eq!(open.list_visible_defects(&alice, None, None).await.unwrap(), filed);
}
