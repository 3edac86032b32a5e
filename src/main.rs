//! # Course Outline Agent
//!
//! Command-line entry point.
//!
//! ## Quick Start
//! ```bash
//! cargo run -- generate --brief "Intro to Python" --audience beginners
//! cargo run -- serve --addr 127.0.0.1:8000
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use course_outline_agent::{server, Config, CourseRequest, CourseWorkflow, SearchProvider};

// =============================================================================
// CLI ARGUMENTS
// =============================================================================
#[derive(Parser, Debug)]
#[command(
    name = "course-outline-agent",
    version,
    about = "Generates structured course outlines from a brief using web research and an LLM",
    long_about = r#"
Course Outline Agent

Turns a short course brief and a target audience into a structured outline:
  1. Researches the topic with a web search
  2. Asks an LLM for a JSON outline built from the research
  3. Falls back to a default outline if anything goes wrong

REQUIRED ENVIRONMENT:
  OPENAI_API_KEY   completion provider key
  SERP_API_KEY     Serper key (only for SEARCH_PROVIDER=serper, the default)

EXAMPLES:
  course-outline-agent generate --brief "Intro to Python" --audience beginners
  course-outline-agent --verbose generate -b "Microfinance basics" -a "NGO staff" -p duckduckgo
  course-outline-agent serve --addr 127.0.0.1:8000
"#
)]
struct Cli {
    /// Enable verbose/debug logging
    #[arg(short = 'v', long = "verbose", global = true, default_value = "false")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the course generation HTTP API
    Serve {
        /// Listen address (overrides BIND_ADDR)
        #[arg(long)]
        addr: Option<SocketAddr>,
    },

    /// Generate a single outline and print it as JSON
    Generate {
        /// Course brief
        #[arg(short = 'b', long)]
        brief: String,

        /// Target audience
        #[arg(short = 'a', long)]
        audience: String,

        /// Course duration (accepted but not used by the workflow)
        #[arg(short = 'd', long)]
        duration: Option<String>,

        /// Search provider: serper, duckduckgo or agent (overrides SEARCH_PROVIDER)
        #[arg(short = 'p', long)]
        provider: Option<SearchProvider>,

        /// Model to use (overrides OPENAI_MODEL)
        #[arg(short = 'm', long)]
        model: Option<String>,
    },
}

// =============================================================================
// MAIN FUNCTION
// =============================================================================
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    let mut config = Config::from_env().context("Failed to load configuration")?;

    match cli.command {
        Command::Serve { addr } => {
            if let Some(addr) = addr {
                config.bind_addr = addr;
            }
            config.validate()?;

            let workflow = Arc::new(CourseWorkflow::from_config(&config));
            server::serve(config.bind_addr, workflow).await
        }
        Command::Generate {
            brief,
            audience,
            duration,
            provider,
            model,
        } => {
            if let Some(provider) = provider {
                config.search_provider = provider;
            }
            if let Some(model) = model {
                info!(model = %model, "Using model from command line");
                config.model = model;
            }
            if let Err(e) = config.validate() {
                error!(error = %e, "Invalid configuration");
                return Err(e);
            }

            let mut request = CourseRequest::new(brief, audience);
            request.course_duration = duration;

            let workflow = CourseWorkflow::from_config(&config);
            let outline = workflow.generate(&request).await;

            println!("{}", serde_json::to_string_pretty(&outline)?);
            Ok(())
        }
    }
}

// =============================================================================
// LOGGING INITIALIZATION
// =============================================================================
/// Install the global tracing subscriber.
///
/// `--verbose` forces debug; otherwise `RUST_LOG` applies, defaulting to info.
fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set logging subscriber: {}", e))?;

    Ok(())
}
