//! Human Feedback Gate.
//!
//! The only point where the pipeline may suspend for unbounded real time.
//! Suspension is explicit state persistence: the plan is serialized to a YAML
//! state file and the process is free to exit; `resume` rebuilds the plan
//! from that file and applies a feedback command. This keeps review
//! re-entrant: resumption is a pure data transformation plus one optional
//! gateway call, not a blocked thread.

use anyhow::{Context, Result};
use chrono::Local;
use std::path::{Path, PathBuf};
use tokio::fs;

use research_orchestrator_sdk::{
    log_plan_suspended, log_state_file, FeedbackProtocolError, QuestionDecomposer,
};

use crate::orchestrator::config::OrchestratorConfig;
use crate::orchestrator::decompose;
use crate::orchestrator::types::Plan;

/// The fixed command vocabulary accepted by the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackCommand {
    /// Accept the plan as-is
    Approve,

    /// Revise the plan with free-text instructions; `approve` signals final
    /// approval alongside the edit, skipping a second review round
    Edit { revision: String, approve: bool },

    /// Discard the plan; nothing executes and nothing is aggregated
    Abort,
}

impl FeedbackCommand {
    /// Parse raw feedback input. Anything outside the vocabulary is an
    /// `InvalidCommand` and leaves the gate suspended.
    pub fn parse(input: &str) -> Result<Self, FeedbackProtocolError> {
        let trimmed = input.trim();
        let lowered = trimmed.to_ascii_lowercase();

        if lowered == "approve" {
            return Ok(FeedbackCommand::Approve);
        }
        if lowered == "abort" {
            return Ok(FeedbackCommand::Abort);
        }
        if let Some(rest) = strip_keyword(trimmed, "edit") {
            if rest.is_empty() {
                return Err(FeedbackProtocolError::InvalidCommand(trimmed.to_string()));
            }
            return Ok(FeedbackCommand::Edit {
                revision: rest.to_string(),
                approve: false,
            });
        }

        Err(FeedbackProtocolError::InvalidCommand(trimmed.to_string()))
    }
}

/// Strip a leading keyword (case-insensitive) and an optional `:` separator.
fn strip_keyword<'a>(input: &'a str, keyword: &str) -> Option<&'a str> {
    let lowered = input.to_ascii_lowercase();
    if !lowered.starts_with(keyword) {
        return None;
    }
    let rest = &input[keyword.len()..];
    if !rest.is_empty() && !rest.starts_with(' ') && !rest.starts_with(':') {
        return None;
    }
    Some(rest.trim_start_matches(':').trim())
}

/// Handle to a suspended review: where the plan state was written.
#[derive(Debug, Clone)]
pub struct SuspendedReview {
    pub state_file: PathBuf,
}

/// Persist the plan and suspend the pipeline for review.
///
/// No dispatcher work may occur while suspended; the caller is expected to
/// return control to the operator after this call.
pub async fn submit_for_review(plan: &Plan, state_dir: &Path) -> Result<SuspendedReview> {
    let state_file = save_plan_state(plan, state_dir).await?;

    println!("\n{}", "=".repeat(80));
    println!("PLAN AWAITING REVIEW: {}", plan.main_question);
    println!("{}", "=".repeat(80));
    for (i, task) in plan.tasks.iter().enumerate() {
        println!("  {}. [{}] {}", i + 1, task.kind, task.question);
    }
    println!(
        "\nResume with: --plan-file {} and one of --approve / --edit <revision> / --abort",
        state_file.display()
    );

    log_plan_suspended!(state_file.display());

    Ok(SuspendedReview { state_file })
}

/// Serialize the plan to a timestamped YAML state file.
pub async fn save_plan_state(plan: &Plan, state_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(state_dir)
        .await
        .with_context(|| format!("Failed to create state directory: {}", state_dir.display()))?;

    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let state_file = state_dir.join(format!("plan_{}.yaml", timestamp));
    let yaml = serde_yaml::to_string(plan)?;
    fs::write(&state_file, yaml)
        .await
        .with_context(|| format!("Failed to write plan state file: {}", state_file.display()))?;

    log_state_file!(state_file.display(), "Plan state for review/resume");

    Ok(state_file)
}

/// Deserialize a plan from a state file written by [`save_plan_state`].
pub async fn load_plan_state(state_file: &Path) -> Result<Plan> {
    let content = fs::read_to_string(state_file)
        .await
        .with_context(|| format!("Failed to read plan state file: {}", state_file.display()))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse plan state from: {}", state_file.display()))
}

/// What a resume produced.
#[derive(Debug)]
pub enum ResumeOutcome {
    /// The plan is approved; dispatching may begin
    Approved(Plan),

    /// The plan was revised and re-submitted for review
    Suspended(Plan, SuspendedReview),

    /// The plan was discarded
    Aborted,
}

/// Apply a feedback command to a (possibly just-deserialized) plan.
///
/// `Approve` on an already-approved plan is a no-op. `Edit` re-invokes the
/// decomposition gateway with the revision as a hint; the revised plan
/// replaces the task list and resets `generation` to 0.
pub async fn resume(
    plan: Plan,
    command: FeedbackCommand,
    generator: &dyn QuestionDecomposer,
    config: &OrchestratorConfig,
) -> Result<ResumeOutcome> {
    match command {
        FeedbackCommand::Approve => {
            let mut plan = plan;
            plan.approve();
            Ok(ResumeOutcome::Approved(plan))
        }
        FeedbackCommand::Edit { revision, approve } => {
            let mut revised = decompose::decompose(
                generator,
                config,
                &plan.main_question,
                Some(revision.as_str()),
                None,
            )
            .await
            .context("Re-decomposition for plan edit failed")?;

            if approve {
                revised.approve();
                Ok(ResumeOutcome::Approved(revised))
            } else {
                let review = submit_for_review(&revised, &config.state_dir).await?;
                Ok(ResumeOutcome::Suspended(revised, review))
            }
        }
        FeedbackCommand::Abort => Ok(ResumeOutcome::Aborted),
    }
}
