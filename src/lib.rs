//! # Course Outline Agent
//!
//! Turns a course brief and a target audience into a structured course
//! outline in two steps:
//!
//! 1. **Research** - a web search for the brief ([`search`])
//! 2. **Outline** - a language-model completion constrained to a JSON
//!    schema ([`completion`], [`prompts`])
//!
//! The JSON is then parsed with defaults for anything missing
//! ([`outline`]). [`workflow::CourseWorkflow`] wires the steps together and
//! [`server`] exposes them over HTTP.
//!
//! ```ignore
//! use course_outline_agent::{Config, CourseWorkflow};
//!
//! let config = Config::from_env()?;
//! config.validate()?;
//! let workflow = CourseWorkflow::from_config(&config);
//! let outline = workflow.generate_course("Intro to Python", "beginners").await;
//! println!("{}", serde_json::to_string_pretty(&outline)?);
//! ```

pub mod completion;
pub mod config;
pub mod course;
pub mod outline;
pub mod prompts;
pub mod search;
pub mod server;
pub mod workflow;

pub use completion::{CompletionClient, CompletionConfig, CompletionError, OpenAiCompletion};
pub use config::Config;
pub use course::{CourseOutline, CourseRequest, Lesson, Module};
pub use outline::{OutlineParser, ParseError};
pub use prompts::CoursePrompts;
pub use search::{SearchClient, SearchError, SearchProvider};
pub use workflow::{CourseWorkflow, WorkflowError, WorkflowState, WorkflowStep};
