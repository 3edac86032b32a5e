//! DuckDuckGo search via the HTML endpoint
//!
//! DuckDuckGo has no free web search API, so results are scraped from
//! `html.duckduckgo.com`. The same type doubles as the `web_search` tool for
//! [`AgentResearch`](super::AgentResearch).

use async_trait::async_trait;
use rig::completion::ToolDefinition;
use rig::tool::Tool;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{ensure_query, format_results, SearchClient, SearchError, SearchResult};

const DEFAULT_BASE_URL: &str = "https://html.duckduckgo.com";

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Web search backed by DuckDuckGo's HTML results page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuckDuckGoSearch {
    max_results: usize,
    base_url: String,
    timeout: Duration,
}

impl DuckDuckGoSearch {
    pub fn new(max_results: usize) -> Self {
        Self {
            max_results,
            base_url: DEFAULT_BASE_URL.to_string(),
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

    /// Fetch and parse the results page for `query`.
    pub async fn fetch_results(&self, query: &str) -> Result<Vec<SearchResult>, SearchError> {
        let query = ensure_query(query)?;

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        let url = format!("{}/html/?q={}", self.base_url, urlencoding::encode(query));
        debug!(url = %url, "Fetching search results");

        let response = client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::from_status(status, &body));
        }

        let body = response.text().await?;
        let results = parse_results(&body, self.max_results);

        if results.is_empty() {
            warn!(query = %query, "No search results found");
        } else {
            info!(query = %query, count = results.len(), "Search completed");
        }

        Ok(results)
    }
}

#[async_trait]
impl SearchClient for DuckDuckGoSearch {
    async fn search(&self, query: &str) -> Result<String, SearchError> {
        let results = self.fetch_results(query).await?;
        Ok(format_results(query.trim(), &results))
    }

    fn name(&self) -> &str {
        "duckduckgo"
    }
}

// =============================================================================
// HTML PARSING
// =============================================================================
/// Extract result anchors (`result__a`) and their snippets.
fn parse_results(html: &str, max_results: usize) -> Vec<SearchResult> {
    let mut results = Vec::new();
    let mut seen_urls = HashSet::new();

    for block in html.split("class=\"result__a\"").skip(1) {
        if results.len() >= max_results {
            break;
        }

        let Some(href) = attribute(block, "href") else {
            continue;
        };
        let Some(url) = resolve_href(href) else {
            continue;
        };
        if url.contains("duckduckgo.com") || !seen_urls.insert(url.clone()) {
            continue;
        }

        let title = anchor_text(block)
            .filter(|t| !t.is_empty())
            .or_else(|| extract_domain(&url))
            .unwrap_or_else(|| "Result".to_string());

        let snippet = block
            .find("class=\"result__snippet\"")
            .and_then(|pos| anchor_text(&block[pos..]))
            .unwrap_or_default();

        results.push(SearchResult { title, url, snippet });
    }

    results
}

/// Value of the first `name="..."` attribute in `segment`.
fn attribute<'a>(segment: &'a str, name: &str) -> Option<&'a str> {
    let marker = format!("{}=\"", name);
    let start = segment.find(&marker)? + marker.len();
    let end = segment[start..].find('"')?;
    Some(&segment[start..start + end])
}

/// Turn a result link into the target URL, unwrapping DuckDuckGo redirects.
fn resolve_href(href: &str) -> Option<String> {
    let href = decode_entities(href);

    if let Some(pos) = href.find("uddg=") {
        let encoded = &href[pos + 5..];
        let encoded = encoded.split('&').next().unwrap_or(encoded);
        return urlencoding::decode(encoded)
            .ok()
            .map(|url| url.into_owned())
            .filter(|url| url.starts_with("http"));
    }

    if let Some(rest) = href.strip_prefix("//") {
        return Some(format!("https://{}", rest));
    }

    href.starts_with("http").then_some(href)
}

/// Text between the end of the opening tag and the next `</a>`, tags stripped.
fn anchor_text(segment: &str) -> Option<String> {
    let start = segment.find('>')? + 1;
    let end = segment[start..].find("</a>")? + start;
    Some(decode_entities(&strip_tags(&segment[start..end])).trim().to_string())
}

fn strip_tags(fragment: &str) -> String {
    let mut text = String::with_capacity(fragment.len());
    let mut in_tag = false;
    for c in fragment.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text
}

fn decode_entities(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Extract the domain name from a URL.
fn extract_domain(url: &str) -> Option<String> {
    url.split("//")
        .nth(1)?
        .split('/')
        .next()
        .map(|s| s.to_string())
}

// =============================================================================
// RIG TOOL IMPLEMENTATION
// =============================================================================
/// Input arguments for the `web_search` tool.
#[derive(Debug, Deserialize, Serialize)]
pub struct SearchArgs {
    pub query: String,
}

impl Tool for DuckDuckGoSearch {
    const NAME: &'static str = "web_search";

    type Args = SearchArgs;
    type Output = String;
    type Error = SearchError;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Search the web using DuckDuckGo. Use this to find course material, syllabi and references for a topic.".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query to find information about"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        let results = self.fetch_results(&args.query).await?;
        Ok(format_results(args.query.trim(), &results))
    }
}
