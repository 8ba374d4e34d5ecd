//! The negotiator capability and a scripted implementation.
//!
//! During each turn the scheduler presents the active party with a
//! [`TurnContext`] and awaits a [`Reply`]. The [`Negotiator`] trait
//! abstracts how replies are produced: an LLM backend, a scripted bot for
//! tests, or anything else.

use std::collections::{BTreeMap, VecDeque};
use std::future::Future;

use agrotrade_types::{ErrorKind, NegotiationAction, PartyId, Role, Scenario};

use crate::command::CommandError;
use crate::transcript::TranscriptEntry;

// ---------------------------------------------------------------------------
// Turn context and reply
// ---------------------------------------------------------------------------

/// Everything a negotiator sees when asked to speak.
#[derive(Debug, Clone, Copy)]
pub struct TurnContext<'a> {
    /// The party that must reply.
    pub party: &'a PartyId,
    /// Its role.
    pub role: Role,
    /// The counterparty of the current negotiation.
    pub counterparty: &'a PartyId,
    /// The active scenario.
    pub scenario: Scenario,
    /// Whether the party may attach a structured action.
    pub tool_using: bool,
    /// The rendered role prompt for this turn.
    pub role_prompt: &'a str,
    /// The transcript so far, opening line included.
    pub transcript: &'a [TranscriptEntry],
}

/// Whether a role may attach structured actions in a scenario.
///
/// Counterparties selling a commodity only talk; everyone else may act.
pub const fn uses_tools(scenario: Scenario, role: Role) -> bool {
    !matches!((scenario, role), (Scenario::Commodity, Role::Counterparty))
}

/// A negotiator's answer to one turn.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reply {
    /// Free text spoken by the party.
    pub text: String,
    /// An optional structured action, or the reason it could not be parsed.
    pub action: Option<Result<NegotiationAction, CommandError>>,
}

impl Reply {
    /// A text-only reply.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            action: None,
        }
    }

    /// A reply carrying a structured action.
    pub fn with_action(text: impl Into<String>, action: NegotiationAction) -> Self {
        Self {
            text: text.into(),
            action: Some(Ok(action)),
        }
    }
}

// ---------------------------------------------------------------------------
// Negotiator
// ---------------------------------------------------------------------------

/// Errors a negotiator can report for a turn.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NegotiatorError {
    /// The backing service failed.
    #[error("negotiator backend error: {message}")]
    Backend {
        /// Description of the failure.
        message: String,
    },

    /// The negotiator has nothing to say for this party.
    #[error("no reply available for '{0}'")]
    Exhausted(PartyId),
}

impl NegotiatorError {
    /// Map this error onto the shared error taxonomy.
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::UnexpectedFailure
    }
}

/// A source of negotiation replies.
///
/// Implementations receive a read-only [`TurnContext`] and return the
/// party's reply. The scheduler awaits each call inline; no market state
/// changes while a reply is pending.
pub trait Negotiator {
    /// Produce the reply of `turn.party`.
    ///
    /// # Errors
    ///
    /// Returns [`NegotiatorError`] when no reply could be produced. The
    /// scheduler records the failure and keeps the run going.
    fn respond(
        &mut self,
        turn: &TurnContext<'_>,
    ) -> impl Future<Output = Result<Reply, NegotiatorError>> + Send;
}

// ---------------------------------------------------------------------------
// Scripted negotiator
// ---------------------------------------------------------------------------

/// A negotiator that replays queued replies per party.
///
/// Used in tests and offline runs. A party with an empty queue fails
/// with [`NegotiatorError::Exhausted`].
#[derive(Debug, Clone, Default)]
pub struct ScriptedNegotiator {
    scripts: BTreeMap<PartyId, VecDeque<Result<Reply, NegotiatorError>>>,
    calls: u32,
}

impl ScriptedNegotiator {
    /// Create a negotiator with no scripted replies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for a party.
    #[must_use]
    pub fn reply(mut self, party: &str, reply: Reply) -> Self {
        self.queue(party).push_back(Ok(reply));
        self
    }

    /// Queue a text-only reply for a party.
    #[must_use]
    pub fn say(self, party: &str, text: &str) -> Self {
        self.reply(party, Reply::text(text))
    }

    /// Queue a failure for a party.
    #[must_use]
    pub fn fail(mut self, party: &str, error: NegotiatorError) -> Self {
        self.queue(party).push_back(Err(error));
        self
    }

    /// Number of `respond` calls served so far.
    pub const fn calls(&self) -> u32 {
        self.calls
    }

    fn queue(&mut self, party: &str) -> &mut VecDeque<Result<Reply, NegotiatorError>> {
        self.scripts.entry(PartyId::from(party)).or_default()
    }
}

impl Negotiator for ScriptedNegotiator {
    fn respond(
        &mut self,
        turn: &TurnContext<'_>,
    ) -> impl Future<Output = Result<Reply, NegotiatorError>> + Send {
        self.calls = self.calls.saturating_add(1);
        let next = self
            .scripts
            .get_mut(turn.party)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Err(NegotiatorError::Exhausted(turn.party.clone())));
        async move { next }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_use_by_scenario_and_role() {
        assert!(uses_tools(Scenario::Commodity, Role::Central));
        assert!(!uses_tools(Scenario::Commodity, Role::Counterparty));
        assert!(uses_tools(Scenario::Inputs, Role::Counterparty));
    }

    #[tokio::test]
    async fn scripted_replies_replay_in_order_per_party() {
        let mut negotiator = ScriptedNegotiator::new()
            .say("Fz1", "Quero R$18 por kg.")
            .say("Fz1", "Aceito.");
        let party = PartyId::from("Fz1");
        let turn = TurnContext {
            party: &party,
            role: Role::Counterparty,
            counterparty: &party,
            scenario: Scenario::Commodity,
            tool_using: false,
            role_prompt: "",
            transcript: &[],
        };

        let first = negotiator.respond(&turn).await;
        assert!(matches!(first, Ok(reply) if reply.text.contains("R$18")));
        let second = negotiator.respond(&turn).await;
        assert!(matches!(second, Ok(reply) if reply.text == "Aceito."));
        let third = negotiator.respond(&turn).await;
        assert!(matches!(third, Err(NegotiatorError::Exhausted(_))));
        assert_eq!(negotiator.calls(), 3);
    }
}
