//! LLM-backed sufficiency judge.
//!
//! The boundary contract is enforced by the orchestrator's judge loop; this
//! implementation reminds the model of the bounds and maps its JSON verdict
//! onto [`JudgeVerdict`].

use anyhow::{Context, Result};
use std::sync::Arc;

use research_orchestrator_sdk::{async_trait, JudgeRequest, JudgeVerdict, SufficiencyJudge};

use crate::agents::client::ChatClient;
use crate::agents::decomposer::extract_json;

pub struct LlmJudge {
    chat: Arc<ChatClient>,
}

impl LlmJudge {
    pub fn new(chat: Arc<ChatClient>) -> Self {
        Self { chat }
    }

    fn user_prompt(&self, request: &JudgeRequest) -> String {
        let mut prompt = format!(
            "# Main Question\n\n{}\n\n# Gathered Findings\n",
            request.main_question
        );
        for (i, finding) in request.findings.iter().enumerate() {
            prompt.push_str(&format!(
                "\n## Finding {} ({})\n\nQuestion: {}\n\nAnswer: {}\n\nSources: {}\n",
                i + 1,
                finding.kind,
                finding.question,
                if finding.answer.is_empty() {
                    "(task failed, no answer)"
                } else {
                    &finding.answer
                },
                finding.evidence.len()
            ));
        }
        prompt.push_str(&format!(
            "\n# Remaining Rounds\n\n{}\n",
            request.rounds_remaining
        ));
        prompt
    }
}

const JUDGE_SYSTEM_PROMPT: &str = r#"You decide whether gathered research findings are sufficient to answer a main question.

Respond with a JSON object of this exact shape:
{"need_more": false, "new_questions": []}

Set need_more to true only when a material evidence gap remains, and propose at most 3 new questions that would close it. When the remaining rounds counter is 0 you MUST return {"need_more": false, "new_questions": []}. Never repeat a question that was already asked."#;

#[async_trait]
impl SufficiencyJudge for LlmJudge {
    async fn evaluate(&self, request: &JudgeRequest) -> Result<JudgeVerdict> {
        let response = self
            .chat
            .chat(JUDGE_SYSTEM_PROMPT, &self.user_prompt(request))
            .await
            .context("Sufficiency judge call failed")?;

        let verdict: JudgeVerdict = serde_json::from_str(&extract_json(&response))
            .with_context(|| format!("Judge returned malformed JSON: {}", response))?;

        Ok(verdict)
    }
}
