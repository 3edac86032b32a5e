//! # Completion Module
//!
//! The outline step asks a language model for a JSON document through the
//! [`CompletionClient`] trait. [`OpenAiCompletion`] implements it with Rig's
//! OpenAI provider and adds transport-level retries: timeouts, rate limits
//! and unclassified provider failures are retried with exponential backoff,
//! credential and response-shape failures are not.
//!
//! Whether the returned text is valid JSON is not checked here; that belongs
//! to [`OutlineParser`](crate::outline::OutlineParser).

use async_trait::async_trait;
use rig::client::{CompletionClient as _, ProviderClient};
use rig::completion::Prompt;
use rig::providers::openai::Client;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Base delay for exponential backoff between attempts
const RETRY_BASE_DELAY_MS: u64 = 500;

// =============================================================================
// ERRORS
// =============================================================================
/// Failure of the provider call itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompletionError {
    #[error("completion request timed out")]
    Timeout,

    #[error("completion provider rejected the credentials: {0}")]
    AuthFailure(String),

    #[error("completion provider rate limited the request: {0}")]
    RateLimited(String),

    #[error("completion provider returned an unusable response: {0}")]
    MalformedResponse(String),

    #[error("completion failed: {0}")]
    Unknown(String),
}

impl CompletionError {
    /// Short label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            CompletionError::Timeout => "timeout",
            CompletionError::AuthFailure(_) => "auth_failure",
            CompletionError::RateLimited(_) => "rate_limited",
            CompletionError::MalformedResponse(_) => "malformed_response",
            CompletionError::Unknown(_) => "unknown",
        }
    }

    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CompletionError::Timeout | CompletionError::RateLimited(_) | CompletionError::Unknown(_)
        )
    }

    /// Classify a provider error message.
    ///
    /// Rig reports provider failures as formatted text, so the status code or
    /// the provider's error wording is all there is to go on. Status codes
    /// only count as whole tokens; rate-limit messages carry token counts and
    /// retry delays such as "199401" or "403ms".
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));
        let has_status = |codes: &[&str]| {
            lower
                .split(|c: char| !c.is_ascii_alphanumeric())
                .any(|token| codes.contains(&token))
        };

        if has_status(&["429"]) || has(&["rate limit", "rate_limit", "too many requests"]) {
            CompletionError::RateLimited(message.to_string())
        } else if has_status(&["401", "403"])
            || has(&["unauthorized", "invalid_api_key", "incorrect api key", "invalid api key"])
        {
            CompletionError::AuthFailure(message.to_string())
        } else if has(&["timed out", "timeout"]) {
            CompletionError::Timeout
        } else if has(&["deserializ", "decode", "invalid json", "no content", "empty response"]) {
            CompletionError::MalformedResponse(message.to_string())
        } else {
            CompletionError::Unknown(message.to_string())
        }
    }
}

// =============================================================================
// COMPLETION CLIENT TRAIT
// =============================================================================
/// A single language-model completion call.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send a system instruction and a user message, returning the raw text.
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, CompletionError>;

    /// Model identifier for logs.
    fn model(&self) -> &str;
}

/// Settings for [`OpenAiCompletion`].
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionConfig {
    pub model: String,
    /// Sampling temperature. Zero keeps structured output deterministic.
    pub temperature: f64,
    /// Extra attempts after the first one for transient failures.
    pub max_retries: u32,
    /// Upper bound for a single attempt.
    pub timeout: Duration,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.0,
            max_retries: 3,
            timeout: Duration::from_secs(60),
        }
    }
}

// =============================================================================
// OPENAI IMPLEMENTATION
// =============================================================================
/// OpenAI chat completion through rig-core.
pub struct OpenAiCompletion {
    client: Client,
    config: CompletionConfig,
}

impl OpenAiCompletion {
    pub fn new(api_key: impl Into<String>, config: CompletionConfig) -> Self {
        let api_key: String = api_key.into();
        Self {
            client: Client::from_val(api_key.into()),
            config,
        }
    }

    async fn complete_once(&self, system_prompt: &str, user_prompt: &str) -> Result<String, CompletionError> {
        let agent = self
            .client
            .agent(&self.config.model)
            .preamble(system_prompt)
            .temperature(self.config.temperature)
            .build();

        let prompt = user_prompt.to_string();
        let text = tokio::time::timeout(self.config.timeout, async { agent.prompt(&prompt).await })
            .await
            .map_err(|_| CompletionError::Timeout)?
            .map_err(|e| CompletionError::classify(&e.to_string()))?;

        if text.trim().is_empty() {
            return Err(CompletionError::MalformedResponse("empty response text".to_string()));
        }
        Ok(text)
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompletion {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, CompletionError> {
        info!(model = %self.config.model, "Requesting completion");

        let text = with_retries(
            self.config.max_retries,
            Duration::from_millis(RETRY_BASE_DELAY_MS),
            || self.complete_once(system_prompt, user_prompt),
        )
        .await?;

        debug!(chars = text.len(), "Completion received");
        Ok(text)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

/// Run `attempt` until it succeeds, fails permanently, or runs out of retries.
///
/// The delay doubles after every failed attempt starting at `base_delay`.
pub async fn with_retries<F, Fut>(
    max_retries: u32,
    base_delay: Duration,
    mut attempt: F,
) -> Result<String, CompletionError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<String, CompletionError>>,
{
    let mut last_error = CompletionError::Unknown("no attempts made".to_string());

    for n in 0..=max_retries {
        if n > 0 {
            let delay = base_delay * 2u32.saturating_pow(n - 1);
            debug!(attempt = n, delay_ms = delay.as_millis() as u64, "Retrying completion");
            tokio::time::sleep(delay).await;
        }

        match attempt().await {
            Ok(text) => return Ok(text),
            Err(e) if !e.is_retryable() => return Err(e),
            Err(e) => {
                warn!(attempt = n, kind = e.kind(), error = %e, "Completion attempt failed");
                last_error = e;
            }
        }
    }

    Err(last_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_classify_provider_messages() {
        assert_eq!(
            CompletionError::classify("CompletionError: ProviderError: 401 Unauthorized").kind(),
            "auth_failure"
        );
        assert_eq!(
            CompletionError::classify("Incorrect API key provided: sk-...").kind(),
            "auth_failure"
        );
        assert_eq!(
            CompletionError::classify("HTTP 429: Rate limit reached for gpt-4o-mini").kind(),
            "rate_limited"
        );
        assert_eq!(
            CompletionError::classify("operation timed out"),
            CompletionError::Timeout
        );
        assert_eq!(
            CompletionError::classify("JsonError: failed to deserialize response").kind(),
            "malformed_response"
        );
        assert_eq!(
            CompletionError::classify("connection reset by peer").kind(),
            "unknown"
        );
    }

    #[test]
    fn test_classify_ignores_digits_inside_numbers() {
        let message = "Rate limit reached for gpt-4o-mini on tokens per min (TPM): \
                       Limit 200000, Used 199401, Requested 1042. Please try again in 403ms.";
        assert_eq!(CompletionError::classify(message).kind(), "rate_limited");

        assert_eq!(
            CompletionError::classify("request 4011 failed after 1403ms").kind(),
            "unknown"
        );
        assert_eq!(
            CompletionError::classify("HTTP status 403: forbidden").kind(),
            "auth_failure"
        );
    }

    #[tokio::test]
    async fn test_digit_laden_rate_limit_is_retried() {
        let message = "HTTP 429: Rate limit reached. Used 199401, Requested 1042. \
                       Please try again in 403ms.";
        let calls = AtomicU32::new(0);
        let result = with_retries(3, Duration::from_millis(1), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Err(CompletionError::classify(message)) }
        })
        .await;

        assert_eq!(result.unwrap_err().kind(), "rate_limited");
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(CompletionError::Timeout.is_retryable());
        assert!(CompletionError::RateLimited("slow down".into()).is_retryable());
        assert!(CompletionError::Unknown("reset".into()).is_retryable());
        assert!(!CompletionError::AuthFailure("bad key".into()).is_retryable());
        assert!(!CompletionError::MalformedResponse("empty".into()).is_retryable());
    }

    #[test]
    fn test_default_config() {
        let config = CompletionConfig::default();
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.max_retries, 3);
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = AtomicU32::new(0);
        let result = with_retries(3, Duration::from_millis(1), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(CompletionError::RateLimited("429".into()))
                } else {
                    Ok("{}".to_string())
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "{}");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let result = with_retries(2, Duration::from_millis(1), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(CompletionError::Timeout) }
        })
        .await;

        assert_eq!(result.unwrap_err(), CompletionError::Timeout);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result = with_retries(3, Duration::from_millis(1), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(CompletionError::AuthFailure("401".into())) }
        })
        .await;

        assert_eq!(result.unwrap_err().kind(), "auth_failure");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
