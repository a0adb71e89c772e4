//! Decomposition Gateway.
//!
//! Turns the external generator's draft output into a validated [`Plan`]:
//! enforces the task-count bound, rejects unrecognized kinds, repairs drafts
//! the generator left incomplete, and normalizes ordering so research tasks
//! precede the tasks that depend on them. Structural normalization only;
//! the gateway never judges decomposition quality.
//!
//! A malformed response is retried once with a stricter instruction; a
//! second consecutive failure is fatal to the run, since nothing can execute
//! without a valid plan.

use research_orchestrator_sdk::{
    log_warning, DecompositionError, DecompositionRequest, DraftTask, QuestionDecomposer,
};

use crate::orchestrator::config::OrchestratorConfig;
use crate::orchestrator::types::{Plan, Task, TaskKind};

/// Decompose the main question into a reviewed-pending plan.
///
/// Retries once with `strict = true` after a first contract violation.
pub async fn decompose(
    generator: &dyn QuestionDecomposer,
    config: &OrchestratorConfig,
    main_question: &str,
    revision_hint: Option<&str>,
    background_context: Option<&str>,
) -> Result<Plan, DecompositionError> {
    let mut request = DecompositionRequest {
        main_question: main_question.to_string(),
        locale: config.locale.clone(),
        max_tasks: config.max_tasks,
        revision_hint: revision_hint.map(str::to_string),
        background_context: background_context.map(str::to_string),
        strict: false,
    };

    match attempt(generator, config, main_question, &request).await {
        Ok(plan) => Ok(plan),
        Err(first_error) => {
            log_warning!(
                "Decomposition failed ({}), retrying with strict instruction",
                first_error
            );
            request.strict = true;
            attempt(generator, config, main_question, &request).await
        }
    }
}

async fn attempt(
    generator: &dyn QuestionDecomposer,
    config: &OrchestratorConfig,
    main_question: &str,
    request: &DecompositionRequest,
) -> Result<Plan, DecompositionError> {
    let drafts = generator
        .decompose(request)
        .await
        .map_err(|e| DecompositionError::Generator(e.to_string()))?;

    build_plan(drafts, config, main_question)
}

/// Validate drafts and assemble the generation-0 plan.
pub fn build_plan(
    mut drafts: Vec<DraftTask>,
    config: &OrchestratorConfig,
    main_question: &str,
) -> Result<Plan, DecompositionError> {
    if drafts.is_empty() {
        return Err(DecompositionError::EmptyPlan);
    }
    if drafts.len() > config.max_tasks {
        return Err(DecompositionError::TooManyTasks {
            returned: drafts.len(),
            max_tasks: config.max_tasks,
        });
    }

    repair_missing_kinds(&mut drafts);

    let mut typed: Vec<(TaskKind, DraftTask)> = Vec::with_capacity(drafts.len());
    for draft in drafts {
        let kind = TaskKind::parse(&draft.kind)
            .ok_or_else(|| DecompositionError::InvalidKind(draft.kind.clone()))?;
        typed.push((kind, draft));
    }

    if config.enable_web_search {
        enforce_retrieval(&mut typed);
    }

    let ordered = reorder_research_first(typed);

    let mut plan = Plan::new(main_question, config.locale.clone(), config.max_rounds);
    for (kind, draft) in ordered {
        plan.tasks.push(Task::new(
            draft.question,
            draft.description,
            kind,
            draft.requires_retrieval,
            0,
        ));
    }
    Ok(plan)
}

/// Infer a kind for drafts the generator left blank: retrieval implies
/// research, everything else defaults to analysis.
fn repair_missing_kinds(drafts: &mut [DraftTask]) {
    for draft in drafts.iter_mut() {
        if draft.kind.trim().is_empty() {
            draft.kind = if draft.requires_retrieval {
                "research".to_string()
            } else {
                "analysis".to_string()
            };
        }
    }
}

/// Ensure at least one research task will actually retrieve when web search
/// is on. Falls back to converting the first task into a research task when
/// the plan has none.
fn enforce_retrieval(typed: &mut [(TaskKind, DraftTask)]) {
    let has_retrieval = typed
        .iter()
        .any(|(kind, draft)| *kind == TaskKind::Research && draft.requires_retrieval);
    if has_retrieval {
        return;
    }

    if let Some((_, draft)) = typed
        .iter_mut()
        .find(|(kind, _)| *kind == TaskKind::Research)
    {
        draft.requires_retrieval = true;
    } else if let Some((kind, draft)) = typed.first_mut() {
        *kind = TaskKind::Research;
        draft.requires_retrieval = true;
    }
}

/// Stable partition: all research tasks first, relative order preserved
/// within each group.
fn reorder_research_first(typed: Vec<(TaskKind, DraftTask)>) -> Vec<(TaskKind, DraftTask)> {
    let (research, dependent): (Vec<_>, Vec<_>) = typed
        .into_iter()
        .partition(|(kind, _)| *kind == TaskKind::Research);

    let mut ordered = research;
    ordered.extend(dependent);
    ordered
}
