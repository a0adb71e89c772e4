//! Capability executors: research, analysis, processing.
//!
//! Each executor answers one sub-question from an immutable [`TaskInput`]
//! snapshot. The research executor retrieves evidence first; the analysis
//! executor reasons over already-gathered findings with no tools; the
//! processing executor handles the computational steps (derivations,
//! tabulations, projections) over the same findings.

use anyhow::{Context, Result};
use std::sync::Arc;

use research_orchestrator_sdk::{
    async_trait, log_warning, CapabilityExecutor, ExecutionOutcome, SearchProvider,
    SourceReference, TaskInput,
};

use crate::agents::client::ChatClient;

/// Format prior findings the way executors receive them.
fn completed_steps_block(input: &TaskInput) -> String {
    if input.completed.is_empty() {
        return String::new();
    }
    let mut block = String::from("# Completed Research Steps\n\n");
    for (i, step) in input.completed.iter().enumerate() {
        block.push_str(&format!(
            "## Completed Step {}: {}\n\n<finding>\n{}\n</finding>\n\n",
            i + 1,
            step.question,
            step.answer
        ));
    }
    block
}

fn current_step_block(input: &TaskInput) -> String {
    format!(
        "# Research Topic\n\n{}\n\n{}# Current Step\n\n## Question\n\n{}\n\n## Description\n\n{}\n\n## Locale\n\n{}",
        input.main_question,
        completed_steps_block(input),
        input.question,
        input.description,
        input.locale
    )
}

// ============================================================================
// Research
// ============================================================================

const RESEARCHER_SYSTEM_PROMPT: &str = r#"You are a researcher. Answer the current step's question using the search results provided, citing concrete facts and figures. Do NOT include inline citations; the sources are tracked separately. If the search results are empty, answer from general knowledge and say so."#;

/// Retrieval-and-synthesis executor for `research` tasks.
pub struct ResearchExecutor {
    chat: Arc<ChatClient>,
    search: Option<Arc<dyn SearchProvider>>,
    max_results: usize,
}

impl ResearchExecutor {
    pub fn new(
        chat: Arc<ChatClient>,
        search: Option<Arc<dyn SearchProvider>>,
        max_results: usize,
    ) -> Self {
        Self {
            chat,
            search,
            max_results,
        }
    }

    /// Retrieve evidence for the step. A failed search degrades to an empty
    /// evidence set; the step still runs in pure reasoning mode.
    async fn retrieve(&self, query: &str) -> Vec<SourceReference> {
        let Some(search) = &self.search else {
            return Vec::new();
        };
        match search.search(query, self.max_results).await {
            Ok(results) => results,
            Err(error) => {
                log_warning!("Search failed for '{}': {}", query, error);
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl CapabilityExecutor for ResearchExecutor {
    fn capability(&self) -> &'static str {
        "research"
    }

    async fn execute(&self, input: &TaskInput) -> Result<ExecutionOutcome> {
        let evidence = self.retrieve(&input.question).await;

        let mut prompt = current_step_block(input);
        if evidence.is_empty() {
            prompt.push_str("\n\n# Search Results\n\n(none available)");
        } else {
            prompt.push_str("\n\n# Search Results\n");
            for source in &evidence {
                prompt.push_str(&format!(
                    "\n## {}\n\n{}\n",
                    source.title,
                    source.snippet.clone().unwrap_or_default()
                ));
            }
        }

        let answer = self
            .chat
            .chat(RESEARCHER_SYSTEM_PROMPT, &prompt)
            .await
            .context("Research executor call failed")?;

        Ok(ExecutionOutcome { answer, evidence })
    }
}

// ============================================================================
// Analysis
// ============================================================================

const ANALYST_SYSTEM_PROMPT: &str = r#"You are an analyst performing reasoning without tools: cross-validate the completed findings, synthesize them, compare alternatives, and surface patterns relevant to the current step's question. Ground every claim in the findings provided."#;

/// Pure-reasoning executor for `analysis` tasks. No tools, no retrieval.
pub struct AnalysisExecutor {
    chat: Arc<ChatClient>,
}

impl AnalysisExecutor {
    pub fn new(chat: Arc<ChatClient>) -> Self {
        Self { chat }
    }
}

#[async_trait]
impl CapabilityExecutor for AnalysisExecutor {
    fn capability(&self) -> &'static str {
        "analysis"
    }

    async fn execute(&self, input: &TaskInput) -> Result<ExecutionOutcome> {
        let answer = self
            .chat
            .chat(ANALYST_SYSTEM_PROMPT, &current_step_block(input))
            .await
            .context("Analysis executor call failed")?;

        Ok(ExecutionOutcome {
            answer,
            evidence: Vec::new(),
        })
    }
}

// ============================================================================
// Processing
// ============================================================================

const PROCESSOR_SYSTEM_PROMPT: &str = r#"You handle the computational steps of a research plan: calculations, aggregations, projections and tabulations over the completed findings. Show the arithmetic you perform and present derived numbers in markdown tables where that aids readability."#;

/// Computation executor for `processing` tasks.
pub struct ProcessingExecutor {
    chat: Arc<ChatClient>,
}

impl ProcessingExecutor {
    pub fn new(chat: Arc<ChatClient>) -> Self {
        Self { chat }
    }
}

#[async_trait]
impl CapabilityExecutor for ProcessingExecutor {
    fn capability(&self) -> &'static str {
        "processing"
    }

    async fn execute(&self, input: &TaskInput) -> Result<ExecutionOutcome> {
        let answer = self
            .chat
            .chat(PROCESSOR_SYSTEM_PROMPT, &current_step_block(input))
            .await
            .context("Processing executor call failed")?;

        Ok(ExecutionOutcome {
            answer,
            evidence: Vec::new(),
        })
    }
}
