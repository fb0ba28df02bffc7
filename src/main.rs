//! CLI driver for the prospecting panel.
//!
//! Bootstraps agent sessions, runs one debate on the given topic, streams
//! panel events to the terminal, and prints the final report as JSON.
//!
//! ```bash
//! PANEL_API_BASE=http://kb.local/api/v1/agents \
//! PANEL_API_TOKEN=... \
//! orepanel "copper potential of the northern fault zone"
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use orepanel::config::{default_registry, PanelConfig};
use orepanel::{
    DebateConfig, FinishContent, HttpTransport, PanelEvent, PanelOrchestrator,
};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Debate topic fanned out to the panel
    topic: String,

    /// Maximum host evaluations (overrides PANEL_MAX_ROUNDS)
    #[arg(long)]
    max_rounds: Option<u32>,

    /// Path to a reference-material file appended to every prompt
    #[arg(long)]
    reference_file: Option<std::path::PathBuf>,

    /// Priority instruction sent to the host after the debate ends
    #[arg(long)]
    intervene: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let config = PanelConfig::default();

    let reference_material = match &args.reference_file {
        Some(path) => Some(std::fs::read_to_string(path)?),
        None => None,
    };

    let transport = Arc::new(HttpTransport::with_timeout(
        &config.api_base,
        &config.api_token,
        Duration::from_secs(config.request_timeout_secs),
    ));
    let debate_config = DebateConfig {
        max_rounds: args.max_rounds.unwrap_or(config.max_rounds),
        reference_material,
    };
    let mut orchestrator =
        PanelOrchestrator::new(transport, default_registry(), debate_config);

    // Stream events to the terminal while the debate runs.
    let mut events = orchestrator.subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                PanelEvent::MessagePosted { role, content, .. } => {
                    println!("[{}] {}", role, content);
                }
                PanelEvent::AgentCallFailed { agent, error, .. } => {
                    eprintln!("[!] {} failed: {}", agent, error);
                }
                PanelEvent::FollowUpIssued { target, question, .. } => {
                    println!("[host -> {}] {}", target, question);
                }
                PanelEvent::GeospatialReady { payload, .. } => {
                    println!("[map] {}", payload.summary_line());
                }
                PanelEvent::SessionsRefreshed { succeeded, total, .. } => {
                    println!("[sessions] {}/{} agents ready", succeeded, total);
                }
                PanelEvent::DebateConcluded { phase, rounds, .. } => {
                    println!("[done] {} after {} rounds", phase, rounds);
                }
            }
        }
    });

    orchestrator.refresh_sessions().await?;
    let outcome = orchestrator.start_debate(&args.topic).await?;

    match &outcome.report {
        Some(FinishContent::Report(payload)) => {
            println!("{}", serde_json::to_string_pretty(payload)?);
        }
        Some(FinishContent::Text(text)) => println!("{}", text),
        None => {
            if let Some(raw) = &outcome.raw_host_text {
                println!("{}", raw);
            }
        }
    }

    if let Some(instruction) = &args.intervene {
        orchestrator.intervene(instruction).await?;
    }

    drop(orchestrator);
    let _ = printer.await;
    Ok(())
}
