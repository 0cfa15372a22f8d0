//! rulegraph CLI binary: a console conversation that diagnoses why a
//! YouTrack automation rule produced an observed behavior.
//!
//! Configuration comes entirely from the environment (optionally seeded from
//! `.env` or `~/.config/rulegraph/config.toml`):
//!
//! - `YOUTRACK_BASE_URL`, `YOUTRACK_TOKEN`: the instance to inspect.
//! - `OPENAI_API_KEY`, optional `OPENAI_BASE_URL`, `OPENAI_MODEL`
//!   (default `gpt-4o-mini`).
//! - `RULEGRAPH_MAX_ITERATIONS`: LLM request ceiling per run (default 200).

mod logging;

use std::sync::Arc;

use async_openai::config::OpenAIConfig;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use rulegraph::agent::{AgentConfig, AgentRuntime};
use rulegraph::events::RunEvent;
use rulegraph::interact::UserInteraction;
use rulegraph::llm::ChatOpenAI;
use rulegraph::tools::{BuildRuleLinkTool, CapabilitySet, GetWorkflowRulesTool};
use rulegraph::youtrack::YoutrackClient;
use rulegraph::AgentError;

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const SUGGEST_TEMPERATURE: f32 = 0.2;

/// Console prompt/response: prints the message, reads one line from stdin.
struct ConsoleInteraction;

#[async_trait]
impl UserInteraction for ConsoleInteraction {
    async fn show_message(&self, text: &str) -> Result<String, AgentError> {
        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(format!("\n{}\n> ", text).as_bytes())
            .await
            .map_err(|e| AgentError::ExecutionFailed(format!("console write failed: {}", e)))?;
        stdout
            .flush()
            .await
            .map_err(|e| AgentError::ExecutionFailed(format!("console flush failed: {}", e)))?;
        read_line().await
    }
}

async fn read_line() -> Result<String, AgentError> {
    let mut line = String::new();
    let mut reader = BufReader::new(tokio::io::stdin());
    let n = reader
        .read_line(&mut line)
        .await
        .map_err(|e| AgentError::ExecutionFailed(format!("console read failed: {}", e)))?;
    if n == 0 {
        return Err(AgentError::ExecutionFailed("input stream closed".into()));
    }
    Ok(line.trim().to_string())
}

fn required_env(key: &str) -> Result<String, AgentError> {
    std::env::var(key)
        .map_err(|_| AgentError::Configuration(format!("environment variable {} is not set", key)))
}

fn max_iterations() -> u32 {
    std::env::var("RULEGRAPH_MAX_ITERATIONS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or_else(|| AgentConfig::default().max_iterations)
}

fn build_llm() -> Result<ChatOpenAI, AgentError> {
    required_env("OPENAI_API_KEY")?;
    let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
    let client = match std::env::var("OPENAI_BASE_URL") {
        Ok(base) => {
            ChatOpenAI::with_config(OpenAIConfig::new().with_api_base(base), model)
        }
        Err(_) => ChatOpenAI::new(model),
    };
    Ok(client.with_temperature(SUGGEST_TEMPERATURE))
}

async fn run() -> Result<(), AgentError> {
    let youtrack_base = required_env("YOUTRACK_BASE_URL")?;
    let youtrack_token = required_env("YOUTRACK_TOKEN")?;
    let llm = Arc::new(build_llm()?);

    let youtrack = Arc::new(YoutrackClient::new(&youtrack_base, youtrack_token));
    let capabilities = CapabilitySet::new("youtrack")
        .with_tool(Arc::new(GetWorkflowRulesTool::new(youtrack)))
        .with_tool(Arc::new(BuildRuleLinkTool::new(&youtrack_base)));

    let runtime = AgentRuntime::new(
        llm,
        vec![capabilities],
        Arc::new(ConsoleInteraction),
        AgentConfig {
            max_iterations: max_iterations(),
            ..AgentConfig::default()
        },
    )?
    .with_event_sink(Arc::new(|event| {
        if let RunEvent::ToolCalled { tool } = event {
            eprintln!("Tool called: {}", tool);
        }
    }));

    println!("Describe the behavior you observed (one line):");
    print!("> ");
    use std::io::Write as _;
    std::io::stdout()
        .flush()
        .map_err(|e| AgentError::ExecutionFailed(format!("console flush failed: {}", e)))?;
    let message = read_line().await?;

    let explanation = runtime.run(message).await?;
    println!("\nAccepted explanation:\n\n{}", explanation.render());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    config::load_and_apply("rulegraph", None::<&std::path::Path>).ok();
    logging::init()?;

    if let Err(e) = run().await {
        eprintln!("rulegraph: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
