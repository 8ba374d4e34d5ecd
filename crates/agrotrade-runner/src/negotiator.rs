//! The LLM-backed negotiator.
//!
//! Each turn renders the party's prompt, calls the configured backend and
//! parses the answer into a [`Reply`]. The scheduler bounds the call with
//! its own timeout; backend errors surface as negotiator faults.

use std::future::Future;
use std::time::Instant;

use tracing::{debug, warn};

use agrotrade_core::{Negotiator, NegotiatorError, Reply, TurnContext};

use crate::llm::LlmBackend;
use crate::parse::parse_reply;
use crate::prompt::PromptEngine;

/// Negotiator that asks an LLM to speak for every party.
pub struct LlmNegotiator<'a> {
    backend: LlmBackend,
    prompts: &'a PromptEngine,
}

impl<'a> LlmNegotiator<'a> {
    /// Create a negotiator over a backend and the shared prompt engine.
    pub const fn new(backend: LlmBackend, prompts: &'a PromptEngine) -> Self {
        Self { backend, prompts }
    }
}

impl Negotiator for LlmNegotiator<'_> {
    fn respond(
        &mut self,
        turn: &TurnContext<'_>,
    ) -> impl Future<Output = Result<Reply, NegotiatorError>> + Send {
        async move {
            let prompt = self.prompts.render_turn(turn)?;
            let started = Instant::now();
            let raw = self.backend.complete(&prompt).await.map_err(|err| {
                warn!(party = %turn.party, backend = self.backend.name(), error = %err, "LLM call failed");
                err
            })?;
            debug!(
                party = %turn.party,
                elapsed_ms = started.elapsed().as_millis(),
                "LLM reply received"
            );
            Ok(parse_reply(&raw, turn.tool_using))
        }
    }
}
