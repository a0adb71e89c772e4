//! Workflow orchestration for the research pipeline.
//!
//! Drives the full control flow: optional background investigation →
//! decomposition gateway → human feedback gate → dispatch/judge loop →
//! aggregation. One orchestration thread owns the [`Plan`] for the whole
//! run; the feedback gate is the only unbounded suspension point, realized
//! by persisting the plan and returning [`WorkflowOutcome::Suspended`] so
//! the process can exit and a later invocation can resume.

use anyhow::{Context, Result};
use chrono::Local;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;

use research_orchestrator_sdk::{
    log_file_saved, log_info, log_plan_resumed, log_stage_complete, log_stage_start, log_warning,
    QuestionDecomposer, ReportAggregator, ReportRequest, SearchProvider, SufficiencyJudge,
};

use crate::citations::collect_citations;
use crate::orchestrator::config::OrchestratorConfig;
use crate::orchestrator::decompose;
use crate::orchestrator::dispatch::{self, CapabilitySet};
use crate::orchestrator::feedback::{self, FeedbackCommand, ResumeOutcome};
use crate::orchestrator::judge::{self, JudgeDecision};
use crate::orchestrator::types::Plan;

/// External collaborators wired into one orchestration run.
#[derive(Clone)]
pub struct OrchestratorBoundaries {
    pub decomposer: Arc<dyn QuestionDecomposer>,
    pub judge: Arc<dyn SufficiencyJudge>,
    pub capabilities: CapabilitySet,
    pub aggregator: Arc<dyn ReportAggregator>,

    /// Search provider for background investigation; `None` disables it
    pub search: Option<Arc<dyn SearchProvider>>,
}

/// Terminal states of one workflow invocation.
#[derive(Debug)]
pub enum WorkflowOutcome {
    /// The full pipeline ran; the report was written
    Completed { report_path: PathBuf },

    /// The plan awaits human review in the given state file
    Suspended { state_file: PathBuf },

    /// The plan was discarded at the feedback gate
    Aborted,
}

/// Run the pipeline for a fresh question.
///
/// Returns `Suspended` at the feedback gate unless `auto_approve` is set;
/// resume with [`resume_research_workflow`].
pub async fn run_research_workflow(
    main_question: &str,
    config: &OrchestratorConfig,
    boundaries: &OrchestratorBoundaries,
) -> Result<WorkflowOutcome> {
    if main_question.trim().is_empty() {
        anyhow::bail!("Research question must not be empty");
    }

    let background = if config.enable_background_investigation {
        background_investigation(main_question, config, boundaries).await
    } else {
        None
    };

    log_stage_start!("decompose");
    let mut plan = decompose::decompose(
        boundaries.decomposer.as_ref(),
        config,
        main_question,
        None,
        background.as_deref(),
    )
    .await
    .context("Fatal planning failure")?;
    log_stage_complete!("decompose");

    println!("Decomposed into {} sub-tasks", plan.tasks.len());

    if config.auto_approve {
        plan.approve();
        return execute_approved_plan(plan, config, boundaries).await;
    }

    let review = feedback::submit_for_review(&plan, &config.state_dir).await?;
    Ok(WorkflowOutcome::Suspended {
        state_file: review.state_file,
    })
}

/// Resume a suspended plan with a feedback command.
pub async fn resume_research_workflow(
    state_file: &Path,
    command: FeedbackCommand,
    config: &OrchestratorConfig,
    boundaries: &OrchestratorBoundaries,
) -> Result<WorkflowOutcome> {
    let plan = feedback::load_plan_state(state_file).await?;
    log_plan_resumed!(state_file.display());

    match feedback::resume(plan, command, boundaries.decomposer.as_ref(), config).await? {
        ResumeOutcome::Approved(plan) => execute_approved_plan(plan, config, boundaries).await,
        ResumeOutcome::Suspended(_, review) => Ok(WorkflowOutcome::Suspended {
            state_file: review.state_file,
        }),
        ResumeOutcome::Aborted => {
            if let Err(error) = fs::remove_file(state_file).await {
                log_warning!(
                    "Failed to remove state file {}: {}",
                    state_file.display(),
                    error
                );
            }
            println!("Plan aborted; no tasks executed.");
            Ok(WorkflowOutcome::Aborted)
        }
    }
}

/// Dispatch/judge loop followed by aggregation. The loop terminates on a
/// sufficient verdict or round exhaustion, both surfaced as
/// [`JudgeDecision::Sufficient`].
async fn execute_approved_plan(
    mut plan: Plan,
    config: &OrchestratorConfig,
    boundaries: &OrchestratorBoundaries,
) -> Result<WorkflowOutcome> {
    log_stage_start!("dispatch");
    loop {
        dispatch::run_generation(&mut plan, &boundaries.capabilities, config).await?;

        match judge::evaluate_and_expand(&mut plan, boundaries.judge.as_ref()).await {
            JudgeDecision::Sufficient => break,
            JudgeDecision::Expanded { added } => {
                log_info!(
                    "Judge requested {} follow-up task(s); dispatching generation {}",
                    added,
                    plan.generation
                );
            }
        }
    }
    log_stage_complete!("dispatch");

    aggregate(&plan, config, boundaries).await
}

/// Hand the finalized task set to the aggregator and write the report.
async fn aggregate(
    plan: &Plan,
    config: &OrchestratorConfig,
    boundaries: &OrchestratorBoundaries,
) -> Result<WorkflowOutcome> {
    log_stage_start!("report");

    let request = ReportRequest {
        main_question: plan.main_question.clone(),
        locale: plan.locale.clone(),
        findings: plan.findings(),
        citations: collect_citations(plan),
    };
    let report = boundaries
        .aggregator
        .aggregate(&request)
        .await
        .context("Report aggregation failed")?;

    let report_path = match &config.output {
        Some(path) => path.clone(),
        None => {
            let timestamp = Local::now().format("%Y%m%d_%H%M%S");
            config.state_dir.join(format!("report_{}.md", timestamp))
        }
    };
    if let Some(parent) = report_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create report directory: {}", parent.display())
            })?;
        }
    }
    fs::write(&report_path, &report.content)
        .await
        .with_context(|| format!("Failed to write report: {}", report_path.display()))?;

    log_file_saved!(report_path.display());
    log_stage_complete!("report");

    println!("\n{}", "=".repeat(80));
    println!(
        "Research complete! Report saved to: {}",
        report_path.display()
    );
    println!("{}", "=".repeat(80));

    Ok(WorkflowOutcome::Completed { report_path })
}

/// Pre-decomposition web search on the main question. Failure degrades to
/// no context, never to a run failure.
async fn background_investigation(
    main_question: &str,
    config: &OrchestratorConfig,
    boundaries: &OrchestratorBoundaries,
) -> Option<String> {
    if !config.enable_web_search {
        return None;
    }
    let search = boundaries.search.as_ref()?;

    log_stage_start!("background");
    match search.search(main_question, config.max_search_results).await {
        Ok(results) if !results.is_empty() => {
            let joined = results
                .iter()
                .map(|result| {
                    format!(
                        "## {}\n\n{}",
                        result.title,
                        result.snippet.clone().unwrap_or_default()
                    )
                })
                .collect::<Vec<_>>()
                .join("\n\n");
            log_stage_complete!("background");
            Some(joined)
        }
        Ok(_) => None,
        Err(error) => {
            log_warning!("Background investigation failed: {}", error);
            None
        }
    }
}
