//! Tavily web search client.
//!
//! Implements [`SearchProvider`] for research executors and the background
//! investigation step. Configured from `TAVILY_API_KEY`.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;

use research_orchestrator_sdk::{async_trait, SearchProvider, SourceReference};

const TAVILY_API_URL: &str = "https://api.tavily.com/search";

pub struct TavilySearchClient {
    client: Client,
    api_key: String,
}

impl TavilySearchClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
        }
    }

    pub fn from_env() -> Result<Self> {
        let api_key = env::var("TAVILY_API_KEY").context("TAVILY_API_KEY is not set")?;
        Ok(Self::new(api_key))
    }
}

#[async_trait]
impl SearchProvider for TavilySearchClient {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SourceReference>> {
        let request = TavilyRequest {
            api_key: self.api_key.clone(),
            query: query.to_string(),
            max_results,
            search_depth: "advanced".to_string(),
        };

        let response = self
            .client
            .post(TAVILY_API_URL)
            .json(&request)
            .send()
            .await
            .context("Search request failed")?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            anyhow::bail!("Search API returned {}: {}", status, body);
        }

        let parsed: TavilyResponse = serde_json::from_str(&body)
            .with_context(|| format!("Failed to parse search response: {}", body))?;

        Ok(parsed
            .results
            .into_iter()
            .map(|result| SourceReference {
                url: result.url,
                title: result.title,
                snippet: result.content,
            })
            .collect())
    }
}

#[derive(Debug, Serialize)]
struct TavilyRequest {
    api_key: String,
    query: String,
    max_results: usize,
    search_depth: String,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: Option<String>,
}
