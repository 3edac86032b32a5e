//! LLM-driven research
//!
//! Instead of handing raw search hits to the outline step, a Rig agent
//! searches DuckDuckGo through the `web_search` tool and answers with a
//! summary of topics, subtopics and references.

use async_trait::async_trait;
use rig::client::{CompletionClient as _, ProviderClient};
use rig::completion::Prompt;
use rig::providers::openai;
use std::time::Duration;
use tracing::{debug, info};

use super::{ensure_query, DuckDuckGoSearch, SearchClient, SearchError};
use crate::prompts::CoursePrompts;

/// Tool-call rounds the agent may take before it has to answer.
const MAX_TURNS: usize = 3;

/// Research strategy that lets an LLM drive the web search.
pub struct AgentResearch {
    api_key: String,
    model: String,
    temperature: f64,
    timeout: Duration,
    tool: DuckDuckGoSearch,
}

impl AgentResearch {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, tool: DuckDuckGoSearch) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            temperature: 0.0,
            timeout: Duration::from_secs(60),
            tool,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl SearchClient for AgentResearch {
    async fn search(&self, query: &str) -> Result<String, SearchError> {
        let query = ensure_query(query)?.to_string();
        info!(query = %query, model = %self.model, "Starting agent research");

        let client = openai::Client::from_val(self.api_key.clone().into());
        let agent = client
            .agent(&self.model)
            .preamble(CoursePrompts::research_agent_system())
            .temperature(self.temperature)
            .tool(self.tool.clone())
            .build();

        debug!(max_turns = MAX_TURNS, "Agent configured");

        let response = tokio::time::timeout(self.timeout, async {
            agent.prompt(&query).multi_turn(MAX_TURNS).await
        })
        .await
        .map_err(|_| SearchError::Timeout)?
        .map_err(|e| SearchError::ProviderError(format!("research agent failed: {}", e)))?;

        info!(chars = response.len(), "Agent research completed");
        Ok(response)
    }

    fn name(&self) -> &str {
        "agent"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_blank_query_is_rejected_before_any_call() {
        let research = AgentResearch::new("sk-test", "gpt-4o-mini", DuckDuckGoSearch::new(3));
        let err = research.search("  ").await.unwrap_err();
        assert!(matches!(err, SearchError::InvalidQuery));
    }

    #[test]
    fn test_builder_settings() {
        let research = AgentResearch::new("sk-test", "gpt-4o-mini", DuckDuckGoSearch::new(3))
            .with_temperature(0.2)
            .with_timeout(Duration::from_secs(5));
        assert_eq!(research.model, "gpt-4o-mini");
        assert!((research.temperature - 0.2).abs() < f64::EPSILON);
        assert_eq!(research.timeout, Duration::from_secs(5));
        assert_eq!(research.name(), "agent");
    }
}
