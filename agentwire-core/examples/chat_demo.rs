//! Chat demo: one buffered answer, then a streamed one
//!
//! Loads an agent from a YAML or JSON config file (default `agent.yaml`) and
//! talks to whatever provider it names. Ctrl-C cancels a running stream.
//!
//! Run with: cargo run --example chat_demo -- path/to/agent.yaml "your question"

use agentwire_core::config::{load_from_json, load_from_yaml};
use agentwire_core::protocol::{Message, Options};
use agentwire_core::{Agent, CancellationToken};
use anyhow::Context;
use futures::StreamExt;
use std::io::Write;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let path = args.next().unwrap_or_else(|| "agent.yaml".to_string());
    let question = args
        .next()
        .unwrap_or_else(|| "Explain backpressure in one paragraph.".to_string());

    let config = if path.ends_with(".json") {
        load_from_json(&path)
    } else {
        load_from_yaml(&path)
    }
    .with_context(|| format!("loading {}", path))?;
    let agent = Agent::from_config(&config)?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let response = agent
        .chat(&cancel, vec![Message::user(question.clone())], Options::new())
        .await?;
    println!("{}\n", response.content().unwrap_or_default());

    let mut stream = agent
        .chat_stream(&cancel, vec![Message::user(question)], Options::new())
        .await?;
    let mut stdout = std::io::stdout();
    while let Some(chunk) = stream.next().await {
        if let Some(text) = chunk?.content() {
            write!(stdout, "{}", text)?;
            stdout.flush()?;
        }
    }
    println!();

    let health = agent.client().health();
    tracing::info!(healthy = health.healthy, "done");
    Ok(())
}
