//! LLM-backed report aggregator.
//!
//! Receives the finalized task set and renders the externally visible
//! artifact. Failed tasks arrive with empty answers and are reported as
//! gaps rather than dropped, so a partially failed run still yields a
//! useful report.

use anyhow::{Context, Result};
use std::sync::Arc;

use research_orchestrator_sdk::{async_trait, Report, ReportAggregator, ReportRequest};

use crate::agents::client::ChatClient;

const REPORTER_SYSTEM_PROMPT: &str = r#"You write the final research report from a set of completed sub-task findings. Organize logically with headings, keep every claim grounded in the findings, and close with a References section listing each source as:
- [Source Title](URL)

with an empty line between entries. Findings marked as failed have no answer; note the gap briefly instead of speculating."#;

pub struct LlmReporter {
    chat: Arc<ChatClient>,
}

impl LlmReporter {
    pub fn new(chat: Arc<ChatClient>) -> Self {
        Self { chat }
    }

    fn user_prompt(&self, request: &ReportRequest) -> String {
        let mut prompt = format!(
            "# Main Question\n\n{}\n\n# Locale\n\n{}\n\n# Findings\n",
            request.main_question, request.locale
        );

        for (i, finding) in request.findings.iter().enumerate() {
            prompt.push_str(&format!(
                "\n## Finding {} ({})\n\nQuestion: {}\n\n{}\n",
                i + 1,
                finding.kind,
                finding.question,
                if finding.answer.is_empty() {
                    "(this task failed; no answer available)".to_string()
                } else {
                    finding.answer.clone()
                }
            ));
        }

        if !request.citations.is_empty() {
            prompt.push_str("\n# Sources\n");
            for citation in &request.citations {
                prompt.push_str(&format!("\n- [{}]({})", citation.title, citation.url));
            }
            prompt.push('\n');
        }

        prompt
    }
}

#[async_trait]
impl ReportAggregator for LlmReporter {
    async fn aggregate(&self, request: &ReportRequest) -> Result<Report> {
        let content = self
            .chat
            .chat(REPORTER_SYSTEM_PROMPT, &self.user_prompt(request))
            .await
            .context("Report aggregation call failed")?;

        Ok(Report { content })
    }
}
