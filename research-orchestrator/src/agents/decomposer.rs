//! LLM-backed decomposition generator.
//!
//! Produces draft sub-tasks as strict JSON; the orchestrator's gateway owns
//! all validation, so this implementation only maps the wire shape onto
//! [`DraftTask`] and strips whatever fencing the model wrapped around it.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::sync::Arc;

use research_orchestrator_sdk::{
    async_trait, DecompositionRequest, DraftTask, QuestionDecomposer,
};

use crate::agents::client::ChatClient;

pub struct LlmDecomposer {
    chat: Arc<ChatClient>,
}

impl LlmDecomposer {
    pub fn new(chat: Arc<ChatClient>) -> Self {
        Self { chat }
    }

    fn system_prompt(&self, request: &DecompositionRequest) -> String {
        format!(
            r#"You are a research planning specialist. Decompose the user's research question into at most {max_tasks} focused sub-questions.

Each sub-question has a step_type describing the capability it needs:
- "research": gathers external evidence via web search
- "analysis": pure reasoning over evidence gathered by research steps
- "processing": computation over evidence gathered by research steps

Order research steps before the analysis/processing steps that depend on them.

Respond with a JSON object of this exact shape:
{{"questions": [{{"question": "...", "description": "what the answer should cover and why it matters", "step_type": "research", "need_search": true}}]}}

Write all text in locale {locale}."#,
            max_tasks = request.max_tasks,
            locale = request.locale,
        )
    }

    fn user_prompt(&self, request: &DecompositionRequest) -> String {
        let mut prompt = format!("# Research Question\n\n{}", request.main_question);

        if let Some(background) = &request.background_context {
            prompt.push_str(&format!(
                "\n\n# Background Investigation Results\n\n{}",
                background
            ));
        }
        if let Some(revision) = &request.revision_hint {
            prompt.push_str(&format!(
                "\n\n# Reviewer Revision Instructions\n\nRevise the decomposition according to:\n{}",
                revision
            ));
        }
        if request.strict {
            prompt.push_str(
                "\n\nIMPORTANT: Return ONLY the JSON object. No prose, no code fences, \
                 no extra keys, and never more sub-questions than the stated limit.",
            );
        }

        prompt
    }
}

#[async_trait]
impl QuestionDecomposer for LlmDecomposer {
    async fn decompose(&self, request: &DecompositionRequest) -> Result<Vec<DraftTask>> {
        let response = self
            .chat
            .chat(&self.system_prompt(request), &self.user_prompt(request))
            .await
            .context("Decomposition generator call failed")?;

        let payload: DecompositionPayload = serde_json::from_str(&extract_json(&response))
            .with_context(|| format!("Decomposer returned malformed JSON: {}", response))?;

        Ok(payload
            .questions
            .into_iter()
            .map(|question| DraftTask {
                question: question.question,
                description: question.description,
                kind: question.step_type,
                requires_retrieval: question.need_search,
            })
            .collect())
    }
}

/// Decomposer wire format.
#[derive(Debug, Deserialize)]
struct DecompositionPayload {
    #[serde(default)]
    questions: Vec<WireQuestion>,
}

#[derive(Debug, Deserialize)]
struct WireQuestion {
    question: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    step_type: String,
    #[serde(default)]
    need_search: bool,
}

/// Extract JSON content from markdown code blocks or surrounding prose.
pub fn extract_json(text: &str) -> String {
    if let Some(start) = text.find("```json") {
        let json_start = start + 7;
        let json_end = text[json_start..]
            .rfind("```")
            .map(|pos| pos + json_start)
            .unwrap_or(text.len());
        return text[json_start..json_end].trim().to_string();
    }
    if let Some(start) = text.find("```") {
        let json_start = start + 3;
        let json_end = text[json_start..]
            .rfind("```")
            .map(|pos| pos + json_start)
            .unwrap_or(text.len());
        return text[json_start..json_end].trim().to_string();
    }

    // Fall back to the outermost braces when the model added prose
    match (text.find('{'), text.rfind('}')) {
        (Some(open), Some(close)) if close > open => text[open..=close].to_string(),
        _ => text.trim().to_string(),
    }
}
