//! # Configuration Module
//!
//! Loads settings from environment variables (and a `.env` file when
//! present). Every field has a default except the two provider secrets.

use anyhow::{Context, Result};
use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use crate::completion::CompletionConfig;
use crate::search::SearchProvider;

// =============================================================================
// CONFIGURATION STRUCT
// =============================================================================
/// Runtime configuration for the course workflow and its HTTP server.
///
/// `Debug` output redacts both API keys, so a config can be logged with
/// `?config` safely.
#[derive(Clone)]
pub struct Config {
    /// OpenAI API key, used for outline completion and agent research.
    pub openai_api_key: String,

    /// Serper API key, used by the `serper` search provider.
    pub serper_api_key: String,

    /// Model used for completions (default: gpt-4o-mini)
    pub model: String,

    /// Sampling temperature (0.0 = deterministic)
    pub temperature: f64,

    /// Transport-level retries for completion calls
    pub max_retries: u32,

    /// Search strategy for the research step
    pub search_provider: SearchProvider,

    /// Maximum number of search results to request
    pub max_search_results: usize,

    /// Per-call search timeout in seconds
    pub search_timeout_secs: u64,

    /// Per-attempt completion timeout in seconds
    pub completion_timeout_secs: u64,

    /// Bound on a whole generation run in seconds; 0 disables it
    pub request_timeout_secs: u64,

    /// Address the HTTP server listens on
    pub bind_addr: SocketAddr,

    /// Serper API root, without a trailing slash.
    ///
    /// Only changed to point the client at a local mock server.
    pub serper_base_url: String,

    /// Host serving DuckDuckGo's HTML results page (`/html/?q=`).
    pub duckduckgo_base_url: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("serper_api_key", &redact(&self.serper_api_key))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_retries", &self.max_retries)
            .field("search_provider", &self.search_provider)
            .field("max_search_results", &self.max_search_results)
            .field("search_timeout_secs", &self.search_timeout_secs)
            .field("completion_timeout_secs", &self.completion_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("bind_addr", &self.bind_addr)
            .field("serper_base_url", &self.serper_base_url)
            .field("duckduckgo_base_url", &self.duckduckgo_base_url)
            .finish()
    }
}

/// Show whether a secret is set without showing it.
fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            serper_api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.0,
            max_retries: 3,
            search_provider: SearchProvider::Serper,
            max_search_results: 5,
            search_timeout_secs: 30,
            completion_timeout_secs: 60,
            request_timeout_secs: 120,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            serper_base_url: "https://google.serper.dev".to_string(),
            duckduckgo_base_url: "https://html.duckduckgo.com".to_string(),
        }
    }
}

// =============================================================================
// CONFIGURATION LOADING
// =============================================================================
impl Config {
    /// Load configuration from the process environment.
    ///
    /// A `.env` file in the working directory is read first if it exists.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(val) = lookup("OPENAI_API_KEY") {
            config.openai_api_key = val;
        }

        if let Some(val) = lookup("SERP_API_KEY") {
            config.serper_api_key = val;
        }

        if let Some(val) = lookup("OPENAI_MODEL") {
            config.model = val;
        }

        if let Some(val) = lookup("TEMPERATURE") {
            config.temperature = val
                .parse()
                .context("TEMPERATURE must be a valid floating-point number (e.g., 0.0)")?;
        }

        if let Some(val) = lookup("MAX_RETRIES") {
            config.max_retries = val
                .parse()
                .context("MAX_RETRIES must be a non-negative integer")?;
        }

        if let Some(val) = lookup("SEARCH_PROVIDER") {
            config.search_provider = val.parse().map_err(anyhow::Error::msg)?;
        }

        if let Some(val) = lookup("MAX_SEARCH_RESULTS") {
            config.max_search_results = val
                .parse()
                .context("MAX_SEARCH_RESULTS must be a valid positive integer")?;
        }

        if let Some(val) = lookup("SEARCH_TIMEOUT_SECS") {
            config.search_timeout_secs = val
                .parse()
                .context("SEARCH_TIMEOUT_SECS must be a whole number of seconds")?;
        }

        if let Some(val) = lookup("COMPLETION_TIMEOUT_SECS") {
            config.completion_timeout_secs = val
                .parse()
                .context("COMPLETION_TIMEOUT_SECS must be a whole number of seconds")?;
        }

        if let Some(val) = lookup("REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = val
                .parse()
                .context("REQUEST_TIMEOUT_SECS must be a whole number of seconds")?;
        }

        if let Some(val) = lookup("BIND_ADDR") {
            config.bind_addr = val
                .parse()
                .with_context(|| format!("BIND_ADDR is not a socket address: {}", val))?;
        }

        if let Some(val) = lookup("SERPER_BASE_URL") {
            config.serper_base_url = val;
        }

        if let Some(val) = lookup("DUCKDUCKGO_BASE_URL") {
            config.duckduckgo_base_url = val;
        }

        Ok(config)
    }

    /// Validate the configuration before building the workflow.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.temperature) {
            anyhow::bail!(
                "Temperature must be between 0.0 and 2.0, got: {}",
                self.temperature
            );
        }

        if self.max_search_results == 0 {
            anyhow::bail!("MAX_SEARCH_RESULTS must be at least 1");
        }

        if self.model.is_empty() {
            anyhow::bail!("OPENAI_MODEL cannot be empty");
        }

        if self.openai_api_key.is_empty() {
            anyhow::bail!("OPENAI_API_KEY is not set");
        }

        if self.search_provider == SearchProvider::Serper && self.serper_api_key.is_empty() {
            anyhow::bail!(
                "SERP_API_KEY is not set (required by the serper search provider; \
                 set SEARCH_PROVIDER=duckduckgo to search without a key)"
            );
        }

        Ok(())
    }

    /// Settings for the completion client.
    pub fn completion_config(&self) -> CompletionConfig {
        CompletionConfig {
            model: self.model.clone(),
            temperature: self.temperature,
            max_retries: self.max_retries,
            timeout: Duration::from_secs(self.completion_timeout_secs),
        }
    }

    /// Overall bound for one generation run, if any.
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}
