//! Google search through the Serper API
//!
//! Results are flattened to plain text the same way the usual Serper
//! wrappers do it: a direct answer wins outright, otherwise the knowledge
//! graph summary and organic snippets are joined with spaces.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use super::{ensure_query, SearchClient, SearchError};

const DEFAULT_BASE_URL: &str = "https://google.serper.dev";

/// Returned when Serper has nothing usable for the query.
pub const NO_RESULTS: &str = "No good Google Search Result was found";

/// Web search backed by `google.serper.dev`.
///
/// One instance is shared by every run; the inner `reqwest::Client` keeps a
/// connection pool, so it is built once and reused.
pub struct SerperSearch {
    /// Sent as the `X-API-KEY` header
    api_key: String,

    client: Client,

    /// API root, `https://google.serper.dev` unless overridden
    base_url: String,

    /// Number of organic results requested (`num`)
    max_results: usize,

    /// Per-request timeout applied by reqwest
    timeout: Duration,
}

impl SerperSearch {
    pub fn new(api_key: impl Into<String>, max_results: usize) -> Self {
        Self {
            api_key: api_key.into(),
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_results,
            timeout: Duration::from_secs(30),
        }
    }

    /// Point at a different host (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl SearchClient for SerperSearch {
    async fn search(&self, query: &str) -> Result<String, SearchError> {
        let query = ensure_query(query)?;
        info!(query = %query, "Performing Serper search");

        let request = SerperRequest {
            q: query,
            num: self.max_results,
        };

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .header("X-API-KEY", &self.api_key)
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::from_status(status, &body));
        }

        let body: SerperResponse = response
            .json()
            .await
            .map_err(|e| SearchError::ProviderError(format!("invalid response body: {}", e)))?;

        let text = body.into_text();
        debug!(chars = text.len(), "Serper search completed");
        Ok(text)
    }

    fn name(&self) -> &str {
        "serper"
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================
/// Body of `POST /search`.
#[derive(Debug, Serialize)]
struct SerperRequest<'a> {
    /// The query text
    q: &'a str,
    /// How many organic results to return
    num: usize,
}

/// The parts of a Serper response that end up in the research text.
///
/// Serper sends many more sections (people also ask, related searches, top
/// stories); serde skips them. Every section is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SerperResponse {
    /// Google's direct answer, when the query has one
    answer_box: Option<AnswerBox>,

    /// Entity panel for well-known topics
    knowledge_graph: Option<KnowledgeGraph>,

    /// Regular results, in rank order
    #[serde(default)]
    organic: Vec<OrganicResult>,
}

/// Direct answer box. The first populated field wins, in declaration order.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnswerBox {
    answer: Option<String>,
    snippet: Option<String>,
    /// Highlighted fragments of the snippet, used when nothing else is set
    snippet_highlighted: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct KnowledgeGraph {
    title: Option<String>,
    /// Entity kind, e.g. "Programming language"
    #[serde(rename = "type")]
    entity_type: Option<String>,
    description: Option<String>,
}

/// One organic hit. Only the snippet is used; title and link are ignored.
#[derive(Debug, Deserialize)]
struct OrganicResult {
    snippet: Option<String>,
}

impl SerperResponse {
    fn into_text(self) -> String {
        if let Some(answer) = self.answer_box.and_then(AnswerBox::into_text) {
            return answer;
        }

        let mut snippets = Vec::new();

        if let Some(graph) = self.knowledge_graph {
            if let (Some(title), Some(entity_type)) = (&graph.title, &graph.entity_type) {
                snippets.push(format!("{}: {}.", title, entity_type));
            }
            if let Some(description) = graph.description {
                snippets.push(description);
            }
        }

        snippets.extend(self.organic.into_iter().filter_map(|r| r.snippet));

        if snippets.is_empty() {
            return NO_RESULTS.to_string();
        }
        snippets.join(" ")
    }
}

impl AnswerBox {
    fn into_text(self) -> Option<String> {
        if let Some(answer) = self.answer {
            return Some(answer);
        }
        if let Some(snippet) = self.snippet {
            return Some(snippet.replace('\n', " "));
        }
        self.snippet_highlighted
            .filter(|parts| !parts.is_empty())
            .map(|parts| parts.join(" "))
    }
}
