//! Tests for the decomposition gateway

use super::common::*;
use research_orchestrator::orchestrator::{decompose, TaskKind};
use research_orchestrator_sdk::DecompositionError;

fn temp_config() -> research_orchestrator::orchestrator::OrchestratorConfig {
    research_orchestrator::orchestrator::OrchestratorConfig {
        max_tasks: 4,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_valid_decomposition_builds_ordered_plan() {
    // 3 research + 1 analysis, analysis ordered last
    let generator = ScriptedDecomposer::new(vec![vec![
        draft("market size by region?", "research", true),
        draft("synthesize the market estimate", "analysis", false),
        draft("key vendors?", "research", true),
        draft("growth forecasts?", "research", true),
    ]]);
    let config = temp_config();

    let plan = decompose::decompose(&generator, &config, "What is the global market size of RAG?", None, None)
        .await
        .unwrap();

    assert_eq!(plan.tasks.len(), 4);
    assert_eq!(plan.tasks[3].kind, TaskKind::Analysis);
    assert!(plan.tasks[..3]
        .iter()
        .all(|task| task.kind == TaskKind::Research));
    assert_eq!(generator.request_count(), 1);
    assert!(!generator.request(0).strict);
}

#[tokio::test]
async fn test_contract_violation_retried_once_with_strict_instruction() {
    // First batch exceeds max_tasks, second is valid
    let too_many: Vec<_> = (0..5)
        .map(|i| draft(&format!("q{}", i), "research", true))
        .collect();
    let generator = ScriptedDecomposer::new(vec![
        too_many,
        vec![draft("q0", "research", true)],
    ]);
    let config = temp_config();

    let plan = decompose::decompose(&generator, &config, "main", None, None)
        .await
        .unwrap();

    assert_eq!(plan.tasks.len(), 1);
    assert_eq!(generator.request_count(), 2);
    assert!(!generator.request(0).strict);
    assert!(generator.request(1).strict);
}

#[tokio::test]
async fn test_second_consecutive_failure_is_fatal() {
    let generator = ScriptedDecomposer::new(vec![
        vec![draft("q", "verification", false)],
        vec![],
    ]);
    let config = temp_config();

    let error = decompose::decompose(&generator, &config, "main", None, None)
        .await
        .unwrap_err();

    // The diagnostic names the violated contract
    assert!(matches!(error, DecompositionError::EmptyPlan));
    assert_eq!(generator.request_count(), 2);
}

#[tokio::test]
async fn test_generator_transport_error_surfaces_after_retry() {
    // No scripted batches at all: both attempts fail at the boundary
    let generator = ScriptedDecomposer::new(vec![]);
    let config = temp_config();

    let error = decompose::decompose(&generator, &config, "main", None, None)
        .await
        .unwrap_err();

    assert!(matches!(error, DecompositionError::Generator(_)));
}

#[tokio::test]
async fn test_revision_hint_reaches_generator() {
    let generator = ScriptedDecomposer::new(vec![vec![draft("q", "research", true)]]);
    let config = temp_config();

    decompose::decompose(
        &generator,
        &config,
        "main",
        Some("split by region"),
        Some("background notes"),
    )
    .await
    .unwrap();

    let request = generator.request(0);
    assert_eq!(request.revision_hint.as_deref(), Some("split by region"));
    assert_eq!(request.background_context.as_deref(), Some("background notes"));
    assert_eq!(request.max_tasks, 4);
}
