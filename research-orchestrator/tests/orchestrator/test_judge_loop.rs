//! Tests for the sufficiency judge loop: bounds, dedup, fail-safe behavior

use super::common::*;
use research_orchestrator::orchestrator::judge::{evaluate_and_expand, JudgeDecision};
use research_orchestrator::orchestrator::{TaskKind, TaskStatus};

#[tokio::test]
async fn test_exhausted_rounds_force_sufficiency() {
    // With no rounds remaining the judge must not even be
    // consulted, and any proposals would be discarded
    let judge = ScriptedJudge::new(vec![ScriptedJudge::need_more(vec!["more evidence?"])]);

    let mut plan = plan_with_tasks(vec![("q1", TaskKind::Research)]);
    plan.rounds_remaining = 0;
    let tasks_before = plan.tasks.len();

    let decision = evaluate_and_expand(&mut plan, &judge).await;

    assert_eq!(decision, JudgeDecision::Sufficient);
    assert_eq!(plan.tasks.len(), tasks_before);
    assert_eq!(judge.request_count(), 0);
}

#[tokio::test]
async fn test_duplicate_proposals_dropped_before_append() {
    // Two proposals, one duplicating existing task text verbatim
    let judge = ScriptedJudge::new(vec![ScriptedJudge::need_more(vec![
        "q1",
        "what about pricing?",
    ])]);

    let mut plan = plan_with_tasks(vec![("q1", TaskKind::Research)]);
    plan.tasks[0].mark_done("a1".to_string(), Vec::new());

    let decision = evaluate_and_expand(&mut plan, &judge).await;

    assert_eq!(decision, JudgeDecision::Expanded { added: 1 });
    assert_eq!(plan.tasks.len(), 2);
    assert_eq!(plan.tasks[1].question, "what about pricing?");
    assert_eq!(plan.tasks[1].kind, TaskKind::Research);
    assert_eq!(plan.tasks[1].status, TaskStatus::Pending);
    assert_eq!(plan.tasks[1].generation, 1);
    assert_eq!(plan.generation, 1);
    assert_eq!(plan.rounds_remaining, 2);
}

#[tokio::test]
async fn test_sufficient_verdict_terminates_without_mutation() {
    let judge = ScriptedJudge::sufficient();

    let mut plan = plan_with_tasks(vec![("q1", TaskKind::Research)]);
    plan.tasks[0].mark_done("a1".to_string(), Vec::new());

    let decision = evaluate_and_expand(&mut plan, &judge).await;

    assert_eq!(decision, JudgeDecision::Sufficient);
    assert_eq!(plan.generation, 0);
    assert_eq!(plan.rounds_remaining, 3);
    assert_eq!(judge.request_count(), 1);
}

#[tokio::test]
async fn test_contract_violation_fails_safe() {
    // Four proposals exceed the boundary contract; the loop must terminate
    // rather than retry indefinitely
    let judge = ScriptedJudge::new(vec![ScriptedJudge::need_more(vec![
        "p1", "p2", "p3", "p4",
    ])]);

    let mut plan = plan_with_tasks(vec![("q1", TaskKind::Research)]);

    let decision = evaluate_and_expand(&mut plan, &judge).await;

    assert_eq!(decision, JudgeDecision::Sufficient);
    assert_eq!(plan.tasks.len(), 1);
    assert_eq!(plan.rounds_remaining, 3);
}

#[tokio::test]
async fn test_judge_transport_error_fails_safe() {
    let judge = ScriptedJudge::new(vec![Err("judge unavailable".to_string())]);

    let mut plan = plan_with_tasks(vec![("q1", TaskKind::Research)]);

    let decision = evaluate_and_expand(&mut plan, &judge).await;

    assert_eq!(decision, JudgeDecision::Sufficient);
    assert_eq!(plan.tasks.len(), 1);
}

#[tokio::test]
async fn test_all_duplicate_proposals_terminate_loop() {
    let judge = ScriptedJudge::new(vec![ScriptedJudge::need_more(vec!["q1", "Q1  "])]);

    let mut plan = plan_with_tasks(vec![("q1", TaskKind::Research)]);

    let decision = evaluate_and_expand(&mut plan, &judge).await;

    assert_eq!(decision, JudgeDecision::Sufficient);
    assert_eq!(plan.tasks.len(), 1);
    assert_eq!(plan.rounds_remaining, 3);
}

#[tokio::test]
async fn test_rounds_monotone_and_bounded() {
    // A judge that always wants more converges in exactly max_rounds
    // expansions, with rounds_remaining non-increasing down to 0
    let judge = ScriptedJudge::new(vec![
        ScriptedJudge::need_more(vec!["follow-up 1"]),
        ScriptedJudge::need_more(vec!["follow-up 2"]),
        ScriptedJudge::need_more(vec!["follow-up 3"]),
        ScriptedJudge::need_more(vec!["follow-up 4"]),
    ]);

    let mut plan = plan_with_tasks(vec![("q1", TaskKind::Research)]);
    let mut previous_rounds = plan.rounds_remaining;
    let mut expansions = 0;

    loop {
        let decision = evaluate_and_expand(&mut plan, &judge).await;
        assert!(plan.rounds_remaining <= previous_rounds);
        previous_rounds = plan.rounds_remaining;

        match decision {
            JudgeDecision::Sufficient => break,
            JudgeDecision::Expanded { .. } => expansions += 1,
        }
        assert!(expansions <= 3, "loop failed to terminate");
    }

    assert_eq!(expansions, 3);
    assert_eq!(plan.rounds_remaining, 0);
    assert_eq!(plan.generation, 3);
    // The fourth scripted verdict was never consulted
    assert_eq!(judge.request_count(), 3);
}

#[tokio::test]
async fn test_judge_receives_findings_and_rounds() {
    let judge = ScriptedJudge::sufficient();

    let mut plan = plan_with_tasks(vec![("q1", TaskKind::Research), ("q2", TaskKind::Analysis)]);
    plan.tasks[0].mark_done("a1".to_string(), Vec::new());
    plan.tasks[1].mark_failed();

    evaluate_and_expand(&mut plan, &judge).await;

    let requests = judge.requests.lock().unwrap();
    let request = &requests[0];
    assert_eq!(request.main_question, "main question");
    assert_eq!(request.rounds_remaining, 3);
    assert_eq!(request.findings.len(), 2);
    assert_eq!(request.findings[0].answer, "a1");
    assert_eq!(request.findings[1].answer, "");
}
