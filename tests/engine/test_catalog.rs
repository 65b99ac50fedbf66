//! Template catalog: creation, diff-sync and name uniqueness.

use testbench_lib::error::AppError;
use testbench_lib::models::{
    DefectPatch, DefectStatus, ExecutionStatus, NewDefect, NewTestCase, NewTestCycle, NewTestStep,
    Priority, Severity, StepOutcome, StepResultInput, TestCaseDetail, TestCasePatch,
    TestStepPatch,
};
use uuid::Uuid;

use super::test_helpers::*;

#[tokio::test]
async fn test_create_positions_steps_in_order() {
    let engine = create_test_engine().await;

    let case = seed_case(&engine, "Login", 3).await;

    assert_eq!(case.case.name, "Login");
    assert_eq!(case.case.priority, Priority::Medium);
    let positions: Vec<i32> = case.steps.iter().map(|s| s.position).collect();
    assert_eq!(positions, vec![1, 2, 3]);
    assert_eq!(case.steps[1].action, "Action 2");

    let fetched = engine.get_test_case(case.case.id).await.unwrap();
    assert_eq!(fetched, case);
}

#[tokio::test]
async fn test_duplicate_name_in_project_conflicts() {
    let engine = create_test_engine().await;
    let project_id = Uuid::now_v7();

    engine
        .create_test_case(&admin(), NewTestCase::new(project_id, "Checkout", vec![]))
        .await
        .unwrap();

    let err = engine
        .create_test_case(&admin(), NewTestCase::new(project_id, " Checkout ", vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "{err:?}");

    // Same name in another project is fine
    engine
        .create_test_case(&admin(), NewTestCase::new(Uuid::now_v7(), "Checkout", vec![]))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_blank_name_or_step_rejected() {
    let engine = create_test_engine().await;

    let err = engine
        .create_test_case(&admin(), NewTestCase::new(Uuid::now_v7(), "  ", vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Rejected(_)));

    let err = engine
        .create_test_case(
            &admin(),
            NewTestCase::new(Uuid::now_v7(), "Search", vec![NewTestStep::new("", "Results")]),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Rejected(_)));
}

#[tokio::test]
async fn test_names_longer_than_column_rejected() {
    let engine = create_test_engine().await;
    let project_id = Uuid::now_v7();
    let long_name = "n".repeat(256);

    let err = engine
        .create_test_case(&admin(), NewTestCase::new(project_id, long_name.clone(), vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Rejected(_)), "{err:?}");

    let err = engine
        .create_cycle(&admin(), NewTestCycle::new(project_id, long_name.clone()))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Rejected(_)), "{err:?}");

    let case = seed_case(&engine, "Short", 0).await;
    let err = engine
        .update_test_case(
            &admin(),
            case.case.id,
            TestCasePatch {
                name: Some(long_name),
                ..TestCasePatch::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Rejected(_)), "{err:?}");

    // Exactly at the limit is accepted
    engine
        .create_test_case(&admin(), NewTestCase::new(project_id, "n".repeat(255), vec![]))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_update_diff_syncs_steps() {
    let engine = create_test_engine().await;
    let case = seed_case(&engine, "Profile", 3).await;
    let (s1, s2, s3) = (&case.steps[0], &case.steps[1], &case.steps[2]);

    // Reorder s3 before s1, drop s2, append a new step
    let patch = TestCasePatch {
        priority: Some(Priority::High),
        steps: Some(vec![
            TestStepPatch::existing(s3.id, "Action 3 edited", "Expected 3"),
            TestStepPatch::existing(s1.id, s1.action.clone(), s1.expected_result.clone()),
            TestStepPatch::added("Logout", "Back on login page"),
        ]),
        ..TestCasePatch::default()
    };

    let updated = engine
        .update_test_case(&admin(), case.case.id, patch)
        .await
        .unwrap();

    assert_eq!(updated.case.priority, Priority::High);
    assert_eq!(updated.steps.len(), 3);
    assert_eq!(updated.steps[0].id, s3.id);
    assert_eq!(updated.steps[0].action, "Action 3 edited");
    assert_eq!(updated.steps[1].id, s1.id);
    assert_eq!(updated.steps[2].action, "Logout");
    let positions: Vec<i32> = updated.steps.iter().map(|s| s.position).collect();
    assert_eq!(positions, vec![1, 2, 3]);
    assert!(updated.steps.iter().all(|s| s.id != s2.id));

    assert_eq!(engine.get_test_case(case.case.id).await.unwrap(), updated);
}

#[tokio::test]
async fn test_removed_step_takes_its_snapshots_along() {
    let engine = create_test_engine().await;
    let case = seed_case(&engine, "Cart", 2).await;
    let cycle = seed_cycle(&engine, "Sprint 1").await;
    let execution = seed_execution(&engine, &cycle, &case, &tester()).await;

    let kept = &case.steps[0];
    engine
        .update_test_case(
            &admin(),
            case.case.id,
            TestCasePatch {
                steps: Some(vec![TestStepPatch::existing(
                    kept.id,
                    kept.action.clone(),
                    kept.expected_result.clone(),
                )]),
                ..TestCasePatch::default()
            },
        )
        .await
        .unwrap();

    let detail = engine.get_execution(execution.execution.id).await.unwrap();
    assert_eq!(detail.steps.len(), 1);
    assert_eq!(detail.steps[0].test_step_id, kept.id);
}

/// Keep only the first step of `case`.
fn keep_first_step(case: &TestCaseDetail) -> TestCasePatch {
    let kept = &case.steps[0];
    TestCasePatch {
        steps: Some(vec![TestStepPatch::existing(
            kept.id,
            kept.action.clone(),
            kept.expected_result.clone(),
        )]),
        ..TestCasePatch::default()
    }
}

#[tokio::test]
async fn test_removing_failing_step_rederives_execution_status() {
    let engine = create_test_engine().await;
    let case = seed_case(&engine, "Login", 2).await;
    let cycle = seed_cycle(&engine, "Sprint 3").await;
    let assignee = tester();
    let execution = seed_execution(&engine, &cycle, &case, &assignee).await;

    for (step, outcome) in execution
        .steps
        .iter()
        .zip([StepOutcome::Approved, StepOutcome::Reproved])
    {
        engine
            .record_result(&assignee, step.id, StepResultInput::outcome(outcome))
            .await
            .unwrap();
    }
    let before = engine.get_execution(execution.execution.id).await.unwrap();
    assert_eq!(before.execution.status, ExecutionStatus::Failed);

    engine
        .update_test_case(&admin(), case.case.id, keep_first_step(&case))
        .await
        .unwrap();

    let after = engine.get_execution(execution.execution.id).await.unwrap();
    let outcomes: Vec<StepOutcome> = after.steps.iter().map(|s| s.outcome).collect();
    assert_eq!(outcomes, vec![StepOutcome::Approved]);
    assert_eq!(after.execution.status, ExecutionStatus::Passed);
}

#[tokio::test]
async fn test_removing_step_keeps_status_set_outside_aggregator() {
    let engine = create_test_engine().await;
    let case = seed_case(&engine, "Signup", 3).await;
    let cycle = seed_cycle(&engine, "Sprint 4").await;
    let assignee = tester();
    let retest = seed_execution(&engine, &cycle, &case, &assignee).await;
    let finalized = seed_execution(&engine, &cycle, &case, &tester()).await;

    // retest: approved, reproved, approved, then the defect is fixed
    for (step, outcome) in retest.steps.iter().zip([
        StepOutcome::Approved,
        StepOutcome::Reproved,
        StepOutcome::Approved,
    ]) {
        engine
            .record_result(&assignee, step.id, StepResultInput::outcome(outcome))
            .await
            .unwrap();
    }
    let defect = engine
        .create_defect(
            &assignee,
            NewDefect::new(retest.execution.id, "Captcha never loads", Severity::High),
        )
        .await
        .unwrap();
    engine
        .update_defect(
            &admin(),
            defect.defect.id,
            DefectPatch::status(DefectStatus::Fixed),
        )
        .await
        .unwrap();

    // finalized: signed off as blocked with every step still pending
    engine
        .finalize(&admin(), finalized.execution.id, ExecutionStatus::Blocked)
        .await
        .unwrap();

    engine
        .update_test_case(&admin(), case.case.id, keep_first_step(&case))
        .await
        .unwrap();

    let retest = engine.get_execution(retest.execution.id).await.unwrap();
    assert_eq!(retest.steps.len(), 1);
    assert_eq!(retest.execution.status, ExecutionStatus::Reteste);

    let finalized = engine.get_execution(finalized.execution.id).await.unwrap();
    assert_eq!(finalized.steps.len(), 1);
    assert_eq!(finalized.execution.status, ExecutionStatus::Blocked);
}

#[tokio::test]
async fn test_template_edits_do_not_reach_snapshots() {
    let engine = create_test_engine().await;
    let case = seed_case(&engine, "Search", 1).await;
    let cycle = seed_cycle(&engine, "Sprint 2").await;
    let execution = seed_execution(&engine, &cycle, &case, &tester()).await;

    engine
        .record_result(
            &tester(),
            execution.steps[0].id,
            StepResultInput::outcome(StepOutcome::Approved),
        )
        .await
        .unwrap();

    let step = &case.steps[0];
    engine
        .update_test_case(
            &admin(),
            case.case.id,
            TestCasePatch {
                steps: Some(vec![TestStepPatch::existing(step.id, "Rewritten", "Changed")]),
                ..TestCasePatch::default()
            },
        )
        .await
        .unwrap();

    let detail = engine.get_execution(execution.execution.id).await.unwrap();
    assert_eq!(detail.steps[0].action, "Action 1");
    assert_eq!(detail.steps[0].expected_result, "Expected 1");
    assert_eq!(detail.steps[0].outcome, StepOutcome::Approved);
}

#[tokio::test]
async fn test_update_rejects_foreign_and_repeated_step_ids() {
    let engine = create_test_engine().await;
    let case = seed_case(&engine, "Settings", 1).await;
    let other = seed_case(&engine, "Other", 1).await;
    let before = snapshot(&engine).await;

    let foreign = TestCasePatch {
        steps: Some(vec![TestStepPatch::existing(other.steps[0].id, "x", "y")]),
        ..TestCasePatch::default()
    };
    let err = engine
        .update_test_case(&admin(), case.case.id, foreign)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Rejected(_)), "{err:?}");

    let id = case.steps[0].id;
    let repeated = TestCasePatch {
        steps: Some(vec![
            TestStepPatch::existing(id, "a", "b"),
            TestStepPatch::existing(id, "c", "d"),
        ]),
        ..TestCasePatch::default()
    };
    let err = engine
        .update_test_case(&admin(), case.case.id, repeated)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Rejected(_)), "{err:?}");

    assert_eq!(snapshot(&engine).await, before);
}

#[tokio::test]
async fn test_update_missing_case_and_rename_conflict() {
    let engine = create_test_engine().await;
    let project_id = Uuid::now_v7();

    let err = engine
        .update_test_case(&admin(), Uuid::now_v7(), TestCasePatch::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    engine
        .create_test_case(&admin(), NewTestCase::new(project_id, "Alpha", vec![]))
        .await
        .unwrap();
    let beta = engine
        .create_test_case(&admin(), NewTestCase::new(project_id, "Beta", vec![]))
        .await
        .unwrap();

    let err = engine
        .update_test_case(
            &admin(),
            beta.case.id,
            TestCasePatch {
                name: Some("Alpha".to_string()),
                ..TestCasePatch::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "{err:?}");

    // Keeping its own name is not a conflict
    engine
        .update_test_case(
            &admin(),
            beta.case.id,
            TestCasePatch {
                name: Some("Beta".to_string()),
                description: Some("Second case".to_string()),
                ..TestCasePatch::default()
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_list_test_cases_by_project() {
    let engine = create_test_engine().await;
    let project_id = Uuid::now_v7();

    for name in ["Zeta", "Alpha", "Mu"] {
        engine
            .create_test_case(&admin(), NewTestCase::new(project_id, name, vec![]))
            .await
            .unwrap();
    }
    seed_case(&engine, "Elsewhere", 0).await;

    let names: Vec<String> = engine
        .list_test_cases(project_id, None, None)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["Alpha", "Mu", "Zeta"]);

    let page = engine
        .list_test_cases(project_id, Some(1), Some(1))
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].name, "Mu");
}
