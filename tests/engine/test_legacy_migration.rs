//! Normalization of legacy status values written by earlier schema revisions.

use testbench_lib::db::legacy::normalize_legacy_values;
use testbench_lib::models::{
    CycleStatus, DefectStatus, ExecutionStatus, NewDefect, Priority, Severity, StepOutcome,
    StepResultInput,
};

use super::test_helpers::*;

#[tokio::test]
async fn test_legacy_values_are_normalized() {
    let engine = create_test_engine().await;
    let case = seed_case(&engine, "Login", 2).await;
    let cycle = seed_cycle(&engine, "Sprint 1").await;
    let assignee = tester();
    let execution = seed_execution(&engine, &cycle, &case, &assignee).await;
    engine
        .record_result(
            &assignee,
            execution.steps[0].id,
            StepResultInput::outcome(StepOutcome::Reproved),
        )
        .await
        .unwrap();
    let defect = engine
        .create_defect(
            &assignee,
            NewDefect::new(execution.execution.id, "Broken", Severity::Low),
        )
        .await
        .unwrap()
        .defect;

    execute_sql(&engine, "UPDATE test_cases SET priority = 'alta'").await;
    execute_sql(&engine, "UPDATE test_cycles SET status = 'em_execucao'").await;
    execute_sql(&engine, "UPDATE executions SET status = 'falhou'").await;
    execute_sql(
        &engine,
        "UPDATE execution_steps SET outcome = CASE outcome \
         WHEN 'reproved' THEN 'reprovado' ELSE 'pendente' END",
    )
    .await;
    execute_sql(&engine, "UPDATE defects SET status = 'corrigido', severity = 'critico'").await;

    let report = normalize_legacy_values(engine.pool().connection())
        .await
        .unwrap();
    assert_eq!(report.rewritten, 7);
    assert_eq!(report.rederived_executions, 0);

    let case = engine.get_test_case(case.case.id).await.unwrap();
    assert_eq!(case.case.priority, Priority::High);
    assert_eq!(engine.get_cycle(cycle.id).await.unwrap().status, CycleStatus::Running);

    let detail = engine.get_execution(execution.execution.id).await.unwrap();
    assert_eq!(detail.execution.status, ExecutionStatus::Failed);
    assert_eq!(detail.steps[0].outcome, StepOutcome::Reproved);
    assert_eq!(detail.steps[1].outcome, StepOutcome::Pending);

    let defect = engine.get_defect(defect.id).await.unwrap();
    assert_eq!(defect.status, DefectStatus::Fixed);
    assert_eq!(defect.severity, Severity::Critical);

    // A second pass finds nothing left to do
    let again = normalize_legacy_values(engine.pool().connection())
        .await
        .unwrap();
    assert_eq!(again.rewritten, 0);
}

#[tokio::test]
async fn test_ambiguous_closed_status_is_rederived() {
    let engine = create_test_engine().await;
    let cycle = seed_cycle(&engine, "Sprint 1").await;
    let assignee = tester();

    let passed_case = seed_case(&engine, "Passed", 2).await;
    let passed = seed_execution(&engine, &cycle, &passed_case, &assignee).await;
    for step in &passed.steps {
        engine
            .record_result(&assignee, step.id, StepResultInput::outcome(StepOutcome::Approved))
            .await
            .unwrap();
    }

    let blocked_case = seed_case(&engine, "Blocked", 2).await;
    let blocked = seed_execution(&engine, &cycle, &blocked_case, &assignee).await;
    engine
        .record_result(
            &assignee,
            blocked.steps[1].id,
            StepResultInput::outcome(StepOutcome::Blocked),
        )
        .await
        .unwrap();

    execute_sql(&engine, "UPDATE executions SET status = 'fechado'").await;

    let report = normalize_legacy_values(engine.pool().connection())
        .await
        .unwrap();
    assert_eq!(report.rederived_executions, 2);

    let status = |id| {
        let engine = engine.clone();
        async move { engine.get_execution(id).await.unwrap().execution.status }
    };
    assert_eq!(status(passed.execution.id).await, ExecutionStatus::Passed);
    assert_eq!(status(blocked.execution.id).await, ExecutionStatus::Blocked);
}
