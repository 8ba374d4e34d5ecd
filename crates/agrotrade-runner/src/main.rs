//! Negotiation runner entry point for the Agrotrade simulation.
//!
//! The runner loads a scenario, asks an LLM to speak for every party, and
//! drives the central party's negotiations with each counterparty in turn.
//!
//! # Architecture
//!
//! ```text
//! Scenario YAML --> Market --> Scheduler --> Prompt Engine --> LLM Backend --> Parser
//!                                  ^                                             |
//!                                  +------------------ Reply --------------------+
//! ```
//!
//! A failing or slow backend never aborts the run: the scheduler records the
//! fault and moves on to the next counterparty.

mod config;
mod error;
mod llm;
mod negotiator;
mod parse;
mod prompt;
mod sink;

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use agrotrade_core::{Report, SimulationConfig, run_negotiations};

use crate::config::RunnerConfig;
use crate::llm::create_backend;
use crate::negotiator::LlmNegotiator;
use crate::prompt::PromptEngine;
use crate::sink::TranscriptLog;

/// Application entry point.
///
/// Initializes logging, loads the runner and scenario configuration, sets
/// up the LLM backend and prompt templates, runs every negotiation and
/// prints the final report.
///
/// # Errors
///
/// Returns an error if initialization fails. Negotiation faults are
/// reported in the outcomes instead.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = RunnerConfig::from_env()?;

    // Initialize structured logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }

    let run_id = Uuid::now_v7();
    info!(%run_id, "agrotrade-runner starting");

    let mut scenario = match &config.scenario_path {
        Some(path) => SimulationConfig::from_file(path)
            .with_context(|| format!("loading scenario {}", path.display()))?,
        None => SimulationConfig::default(),
    };
    if let Some(timeout_ms) = config.turn_timeout_ms {
        scenario.negotiation.turn_timeout_ms = Some(timeout_ms);
    }
    info!(
        scenario = ?scenario.scenario,
        central = %scenario.central.id,
        counterparties = scenario.counterparties.len(),
        max_iterations = scenario.negotiation.max_iterations,
        turn_timeout_ms = ?scenario.negotiation.turn_timeout_ms,
        "scenario loaded"
    );

    let mut market = scenario.build_market()?;
    let expected_total = market.ledger().total_balance();

    let prompts = PromptEngine::new(&config.templates_dir)?;
    info!(templates_dir = config.templates_dir, "prompt templates loaded");

    let backend = create_backend(&config.backend);
    info!(
        backend = backend.name(),
        model = config.backend.model,
        api_url = config.backend.api_url,
        "LLM backend configured"
    );

    let mut sink = match &config.transcript_path {
        Some(path) => TranscriptLog::to_file(path, run_id)
            .with_context(|| format!("opening transcript {}", path.display()))?,
        None => TranscriptLog::log_only(),
    };

    let mut negotiator = LlmNegotiator::new(backend, &prompts);
    let summary = run_negotiations(
        &mut market,
        &mut negotiator,
        &prompts,
        &mut sink,
        &scenario.negotiation,
    )
    .await;

    match market.ledger().verify_conservation_strict(expected_total) {
        agrotrade_ledger::ConservationResult::Balanced => {
            info!(total = %expected_total, "money supply conserved, no negative holdings");
        }
        agrotrade_ledger::ConservationResult::Anomaly(anomaly) => {
            error!(%anomaly, "ledger invariant broken during the run");
        }
    }

    println!("{}", Report::new(market.ledger(), &summary));
    info!(%run_id, "agrotrade-runner finished");
    Ok(())
}
