//! Sufficiency Judge Loop.
//!
//! After each dispatch round the external judge is asked whether the
//! gathered evidence answers the main question. The loop is bounded by the
//! plan's remaining-rounds counter, checked *before* consulting the judge:
//! once the counter reaches 0 the result is sufficient no matter what the
//! judge returns, and any proposals are discarded. Malformed judge output is
//! also absorbed as sufficient, so the pipeline always makes forward
//! progress.

use std::collections::HashSet;

use research_orchestrator_sdk::{
    log_round_complete, log_warning, JudgeContractError, JudgeRequest, JudgeVerdict,
    SufficiencyJudge, MAX_JUDGE_PROPOSALS,
};

use crate::orchestrator::types::{normalize_question, Plan, Task, TaskKind};

/// Outcome of one judge iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JudgeDecision {
    /// Evidence is sufficient (or the round budget is exhausted); hand the
    /// plan to the aggregator
    Sufficient,

    /// New tasks were appended as a fresh generation; dispatch again
    Expanded { added: usize },
}

/// Consult the judge and, if evidence is insufficient, merge its proposals
/// into the plan as a new generation.
///
/// Never fails: transport errors and contract violations degrade to
/// `Sufficient`.
pub async fn evaluate_and_expand(plan: &mut Plan, judge: &dyn SufficiencyJudge) -> JudgeDecision {
    // Hard termination guarantee, not best-effort: exhausted budget wins
    // over whatever the judge would return
    if plan.rounds_remaining == 0 {
        return JudgeDecision::Sufficient;
    }

    let request = JudgeRequest {
        main_question: plan.main_question.clone(),
        findings: plan.findings(),
        rounds_remaining: plan.rounds_remaining,
    };

    let verdict = match judge.evaluate(&request).await {
        Ok(verdict) => verdict,
        Err(error) => {
            log_warning!(
                "Judge invocation failed ({}), treating evidence as sufficient",
                error
            );
            return JudgeDecision::Sufficient;
        }
    };

    if let Err(violation) = check_contract(&verdict) {
        log_warning!(
            "Judge contract violation ({}), treating evidence as sufficient",
            violation
        );
        return JudgeDecision::Sufficient;
    }

    if !verdict.need_more {
        return JudgeDecision::Sufficient;
    }

    let fresh = dedup_proposals(plan, &verdict.new_questions);
    if fresh.is_empty() {
        log_warning!("All judge proposals duplicate existing tasks, terminating round loop");
        return JudgeDecision::Sufficient;
    }

    plan.generation += 1;
    plan.rounds_remaining -= 1;

    let generation = plan.generation;
    let added = fresh.len();
    for question in fresh {
        // Judge proposals are bare questions; follow-up rounds gather
        // missing evidence, so they become research tasks with retrieval
        plan.tasks.push(Task::new(
            question,
            "Gather additional evidence toward the main question",
            TaskKind::Research,
            true,
            generation,
        ));
    }

    log_round_complete!(plan.generation, plan.rounds_remaining, added);

    JudgeDecision::Expanded { added }
}

fn check_contract(verdict: &JudgeVerdict) -> Result<(), JudgeContractError> {
    if verdict.new_questions.len() > MAX_JUDGE_PROPOSALS {
        return Err(JudgeContractError::TooManyProposals {
            returned: verdict.new_questions.len(),
            limit: MAX_JUDGE_PROPOSALS,
        });
    }
    Ok(())
}

/// Drop proposals whose normalized text matches an existing task or an
/// earlier proposal in the same batch, preserving order.
fn dedup_proposals(plan: &Plan, proposals: &[String]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut fresh = Vec::new();

    for proposal in proposals {
        let trimmed = proposal.trim();
        if trimmed.is_empty() {
            continue;
        }
        let normalized = normalize_question(trimmed);
        if plan.contains_question(&normalized) || !seen.insert(normalized) {
            continue;
        }
        fresh.push(trimmed.to_string());
    }

    fresh
}
