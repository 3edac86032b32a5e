//! # Search Module
//!
//! The research step talks to the web through the [`SearchClient`] trait.
//! Three interchangeable strategies implement it:
//!
//! - [`SerperSearch`] - Google results through the Serper API (needs a key)
//! - [`DuckDuckGoSearch`] - DuckDuckGo HTML results (no key)
//! - [`AgentResearch`] - an LLM agent that calls DuckDuckGo as a tool and
//!   summarizes what it found
//!
//! Which one runs is decided by [`SearchProvider`] in the configuration.

mod agent;
mod duckduckgo;
mod serper;

pub use agent::AgentResearch;
pub use duckduckgo::DuckDuckGoSearch;
pub use serper::SerperSearch;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::Config;

// =============================================================================
// ERRORS
// =============================================================================
/// Failure of a single search call.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("search query must not be empty")]
    InvalidQuery,

    #[error("search request timed out")]
    Timeout,

    #[error("search provider rejected the credentials (HTTP {0})")]
    AuthFailure(u16),

    #[error("search provider error: {0}")]
    ProviderError(String),

    #[error("search failed: {0}")]
    Unknown(String),
}

impl SearchError {
    /// Short label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SearchError::InvalidQuery => "invalid_query",
            SearchError::Timeout => "timeout",
            SearchError::AuthFailure(_) => "auth_failure",
            SearchError::ProviderError(_) => "provider_error",
            SearchError::Unknown(_) => "unknown",
        }
    }

    /// Map a non-success HTTP status to an error.
    pub(crate) fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        match status.as_u16() {
            401 | 403 => SearchError::AuthFailure(status.as_u16()),
            code => SearchError::ProviderError(format!("HTTP {}: {}", code, body.trim())),
        }
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SearchError::Timeout
        } else {
            SearchError::Unknown(e.to_string())
        }
    }
}

// =============================================================================
// SEARCH CLIENT TRAIT
// =============================================================================
/// A single web-search call: a text query in, unstructured result text out.
///
/// Implementations never retry.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Run `query` against the provider and return its raw text.
    async fn search(&self, query: &str) -> Result<String, SearchError>;

    /// Provider name for logs.
    fn name(&self) -> &str;
}

/// Trim `query`, rejecting it when nothing is left.
pub(crate) fn ensure_query(query: &str) -> Result<&str, SearchError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(SearchError::InvalidQuery);
    }
    Ok(query)
}

/// A single search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Render hits as a numbered markdown list for the completion prompt.
pub(crate) fn format_results(query: &str, results: &[SearchResult]) -> String {
    if results.is_empty() {
        return format!("No results found for: {}", query);
    }

    let formatted = results
        .iter()
        .enumerate()
        .map(|(i, r)| format!("{}. **{}**\n   URL: {}\n   {}\n", i + 1, r.title, r.url, r.snippet))
        .collect::<Vec<_>>()
        .join("\n");

    format!("## Search Results for: {}\n\n{}", query, formatted)
}

// =============================================================================
// PROVIDER SELECTION
// =============================================================================
/// Which search strategy backs the research step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchProvider {
    #[default]
    Serper,
    DuckDuckGo,
    Agent,
}

impl SearchProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchProvider::Serper => "serper",
            SearchProvider::DuckDuckGo => "duckduckgo",
            SearchProvider::Agent => "agent",
        }
    }
}

impl fmt::Display for SearchProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "serper" | "serp" | "google" => Ok(SearchProvider::Serper),
            "duckduckgo" | "ddg" => Ok(SearchProvider::DuckDuckGo),
            "agent" => Ok(SearchProvider::Agent),
            other => Err(format!(
                "unknown search provider '{}' (expected serper, duckduckgo or agent)",
                other
            )),
        }
    }
}

/// Build the search client selected by `config.search_provider`.
pub fn build_search_client(config: &Config) -> Arc<dyn SearchClient> {
    let timeout = Duration::from_secs(config.search_timeout_secs);

    let duckduckgo = || {
        DuckDuckGoSearch::new(config.max_search_results)
            .with_base_url(config.duckduckgo_base_url.clone())
            .with_timeout(timeout)
    };

    match config.search_provider {
        SearchProvider::Serper => Arc::new(
            SerperSearch::new(config.serper_api_key.clone(), config.max_search_results)
                .with_base_url(config.serper_base_url.clone())
                .with_timeout(timeout),
        ),
        SearchProvider::DuckDuckGo => Arc::new(duckduckgo()),
        SearchProvider::Agent => Arc::new(
            AgentResearch::new(
                config.openai_api_key.clone(),
                config.model.clone(),
                duckduckgo(),
            )
            .with_temperature(config.temperature)
            .with_timeout(Duration::from_secs(config.completion_timeout_secs)),
        ),
    }
}
