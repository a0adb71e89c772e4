//! LLM/search-backed implementations of the orchestration boundary traits.
//!
//! The orchestration core only sees the traits in `research-orchestrator-sdk`.
//! This module supplies the production implementations (one shared chat
//! client behind the decomposer, judge, executors and reporter, plus a Tavily
//! search client for retrieval) and wires them into an
//! [`OrchestratorBoundaries`] value from the environment.

pub mod client;
pub mod decomposer;
pub mod executors;
pub mod judge;
pub mod reporter;
pub mod search;

use anyhow::Result;
use std::sync::Arc;

use research_orchestrator_sdk::{log_warning, SearchProvider};

use crate::orchestrator::{CapabilitySet, OrchestratorBoundaries, OrchestratorConfig};

pub use client::ChatClient;
pub use decomposer::LlmDecomposer;
pub use executors::{AnalysisExecutor, ProcessingExecutor, ResearchExecutor};
pub use judge::LlmJudge;
pub use reporter::LlmReporter;
pub use search::TavilySearchClient;

/// Wire the production boundary set from environment configuration.
///
/// Requires `LLM_API_KEY`; uses `TAVILY_API_KEY` when web search is enabled,
/// degrading to pure-reasoning research with a warning when it is absent.
pub fn boundaries_from_env(config: &OrchestratorConfig) -> Result<OrchestratorBoundaries> {
    let chat = Arc::new(ChatClient::from_env()?);

    let search: Option<Arc<dyn SearchProvider>> = if config.enable_web_search {
        match TavilySearchClient::from_env() {
            Ok(client) => Some(Arc::new(client)),
            Err(error) => {
                log_warning!("Web search unavailable: {}", error);
                None
            }
        }
    } else {
        None
    };

    let capabilities = CapabilitySet {
        research: Arc::new(ResearchExecutor::new(
            Arc::clone(&chat),
            search.clone(),
            config.max_search_results,
        )),
        analysis: Arc::new(AnalysisExecutor::new(Arc::clone(&chat))),
        processing: Arc::new(ProcessingExecutor::new(Arc::clone(&chat))),
    };

    Ok(OrchestratorBoundaries {
        decomposer: Arc::new(LlmDecomposer::new(Arc::clone(&chat))),
        judge: Arc::new(LlmJudge::new(Arc::clone(&chat))),
        capabilities,
        aggregator: Arc::new(LlmReporter::new(chat)),
        search,
    })
}
