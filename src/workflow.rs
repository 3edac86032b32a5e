//! Course generation workflow
//!
//! A fixed two-node graph:
//!
//! ```text
//! ┌────────────┐     ┌────────────┐     ┌────────────┐
//! │  research  │ ──▶ │  outline   │ ──▶ │  complete  │
//! │ (search)   │     │ (LLM JSON) │     │  (parse)   │
//! └────────────┘     └────────────┘     └────────────┘
//! ```
//!
//! Provider failures never abort a run. A failed search leaves a placeholder
//! in place of the research text, a failed completion leaves no outline text,
//! and either way the parser's fallback outline is what the caller gets.
//! The failures are recorded in [`WorkflowState::errors`] and logged.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::completion::{CompletionClient, OpenAiCompletion};
use crate::config::Config;
use crate::course::{CourseOutline, CourseRequest};
use crate::outline::OutlineParser;
use crate::prompts::CoursePrompts;
use crate::search::{build_search_client, SearchClient};

/// Research text used when the search step failed.
pub const RESEARCH_UNAVAILABLE: &str = "No research results were available for this topic.";

// =============================================================================
// STEPS
// =============================================================================
/// Position of a run in the workflow graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStep {
    /// Web research for the brief
    #[default]
    Research,
    /// Outline completion from research and brief
    Outline,
    /// Terminal
    Complete,
}

impl WorkflowStep {
    /// Get the next step in the workflow
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Research => Some(Self::Outline),
            Self::Outline => Some(Self::Complete),
            Self::Complete => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Research => "research",
            Self::Outline => "outline",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Violations of the step ordering.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition { from: WorkflowStep, to: WorkflowStep },

    #[error("step {expected} cannot run while the workflow is at {found}")]
    WrongStep {
        expected: WorkflowStep,
        found: WorkflowStep,
    },
}

// =============================================================================
// STATE
// =============================================================================
/// Mutable state of one run. Never shared between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub brief: String,
    pub target_audience: String,
    pub research_output: Option<String>,
    pub outline_output: Option<String>,
    step: WorkflowStep,
    /// Provider failures absorbed during the run
    pub errors: Vec<String>,
}

impl WorkflowState {
    pub fn new(brief: impl Into<String>, target_audience: impl Into<String>) -> Self {
        Self {
            brief: brief.into(),
            target_audience: target_audience.into(),
            research_output: None,
            outline_output: None,
            step: WorkflowStep::Research,
            errors: Vec::new(),
        }
    }

    pub fn step(&self) -> WorkflowStep {
        self.step
    }

    pub fn is_complete(&self) -> bool {
        self.step.is_terminal()
    }

    /// Move to `to`, which must be the step directly after the current one.
    pub fn advance(&mut self, to: WorkflowStep) -> Result<(), WorkflowError> {
        if self.step.next() != Some(to) {
            return Err(WorkflowError::InvalidTransition {
                from: self.step,
                to,
            });
        }
        debug!(from = %self.step, to = %to, "Workflow step transition");
        self.step = to;
        Ok(())
    }

    fn expect_step(&self, expected: WorkflowStep) -> Result<(), WorkflowError> {
        if self.step != expected {
            return Err(WorkflowError::WrongStep {
                expected,
                found: self.step,
            });
        }
        Ok(())
    }
}

impl From<&CourseRequest> for WorkflowState {
    fn from(request: &CourseRequest) -> Self {
        Self::new(request.brief.clone(), request.target_audience.clone())
    }
}

// =============================================================================
// WORKFLOW
// =============================================================================
/// The research → outline → complete pipeline.
///
/// Holds only shared, immutable clients, so one instance serves any number
/// of concurrent runs.
pub struct CourseWorkflow {
    search: Arc<dyn SearchClient>,
    completion: Arc<dyn CompletionClient>,
    request_timeout: Option<Duration>,
}

impl CourseWorkflow {
    pub fn new(search: Arc<dyn SearchClient>, completion: Arc<dyn CompletionClient>) -> Self {
        Self {
            search,
            completion,
            request_timeout: None,
        }
    }

    /// Build the workflow and its provider clients from configuration.
    pub fn from_config(config: &Config) -> Self {
        let search = build_search_client(config);
        let completion = Arc::new(OpenAiCompletion::new(
            config.openai_api_key.clone(),
            config.completion_config(),
        ));

        info!(
            search = search.name(),
            model = completion.model(),
            "Course workflow configured"
        );

        Self::new(search, completion).with_request_timeout(config.request_timeout())
    }

    /// Bound a whole run; `None` leaves it unbounded.
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Research step: search the brief and store the result text.
    pub async fn research_step(&self, state: &mut WorkflowState) -> Result<(), WorkflowError> {
        state.expect_step(WorkflowStep::Research)?;

        let query = CoursePrompts::research_query(&state.brief);
        let research = match self.search.search(&query).await {
            Ok(text) => {
                info!(provider = self.search.name(), chars = text.len(), "Research completed");
                text
            }
            Err(e) => {
                warn!(
                    provider = self.search.name(),
                    kind = e.kind(),
                    error = %e,
                    "Research failed, continuing without search results"
                );
                state.errors.push(format!("research: {}", e));
                RESEARCH_UNAVAILABLE.to_string()
            }
        };

        state.research_output = Some(research);
        state.advance(WorkflowStep::Outline)
    }

    /// Outline step: ask the model for the outline JSON.
    pub async fn outline_step(&self, state: &mut WorkflowState) -> Result<(), WorkflowError> {
        state.expect_step(WorkflowStep::Outline)?;

        let research = state
            .research_output
            .as_deref()
            .unwrap_or(RESEARCH_UNAVAILABLE);
        let brief = CoursePrompts::course_brief(&state.brief, &state.target_audience);
        let user_prompt = CoursePrompts::outline_user(research, &brief);

        match self
            .completion
            .complete(CoursePrompts::outline_system(), &user_prompt)
            .await
        {
            Ok(text) => {
                info!(model = self.completion.model(), chars = text.len(), "Outline generated");
                state.outline_output = Some(text);
            }
            Err(e) => {
                warn!(
                    model = self.completion.model(),
                    kind = e.kind(),
                    error = %e,
                    "Outline completion failed"
                );
                state.errors.push(format!("outline: {}", e));
            }
        }

        state.advance(WorkflowStep::Complete)
    }

    /// Drive `state` through the remaining steps until it is complete.
    pub async fn run(&self, mut state: WorkflowState) -> Result<WorkflowState, WorkflowError> {
        loop {
            match state.step() {
                WorkflowStep::Research => self.research_step(&mut state).await?,
                WorkflowStep::Outline => self.outline_step(&mut state).await?,
                WorkflowStep::Complete => return Ok(state),
            }
        }
    }

    /// Generate an outline for `request`. Always returns an outline.
    pub async fn generate(&self, request: &CourseRequest) -> CourseOutline {
        if let Some(duration) = &request.course_duration {
            debug!(course_duration = %duration, "course_duration is accepted but not used");
        }

        info!(
            brief = %request.brief,
            target_audience = %request.target_audience,
            "Starting course generation"
        );

        let run = self.run(WorkflowState::from(request));
        let result = match self.request_timeout {
            Some(limit) => match tokio::time::timeout(limit, run).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(timeout_ms = limit.as_millis() as u64, "Course generation timed out");
                    return CourseOutline::fallback(&request.target_audience);
                }
            },
            None => run.await,
        };

        match result {
            Ok(state) => {
                if !state.errors.is_empty() {
                    warn!(errors = ?state.errors, "Course generated with degraded steps");
                }
                OutlineParser::parse(state.outline_output.as_deref(), &state.target_audience)
            }
            Err(e) => {
                error!(error = %e, "Course workflow failed");
                CourseOutline::fallback(&request.target_audience)
            }
        }
    }

    /// Convenience wrapper over [`generate`](Self::generate).
    pub async fn generate_course(&self, brief: &str, target_audience: &str) -> CourseOutline {
        self.generate(&CourseRequest::new(brief, target_audience)).await
    }
}
