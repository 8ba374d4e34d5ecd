//! The negotiation scheduler.
//!
//! [`run_negotiations`] drives a small state machine over the counterparties
//! in configuration order:
//!
//! - [`SchedulerState::SelectNext`] opens the next negotiation with a fresh
//!   transcript and a zeroed turn counter, or moves to `Done`.
//! - [`SchedulerState::Turn`] renders the role prompt, awaits one reply,
//!   executes any attached action and hands the finalized text to
//!   [`decide`].
//! - [`SchedulerState::Done`] returns the run summary.
//!
//! Negotiations never overlap. Every negotiator call is awaited before the
//! market is touched again.

use tracing::{debug, info, warn};

use agrotrade_market::{Actor, Market};
use agrotrade_types::{
    ErrorKind, NegotiationAction, PartyId, Role, Scenario, TerminationReason, TransactionRecord,
};

use crate::command::find_transaction_command;
use crate::config::NegotiationConfig;
use crate::decision::{Decision, TurnPolicy, decide};
use crate::negotiator::{Negotiator, NegotiatorError, Reply, TurnContext, uses_tools};
use crate::prompt::{PromptContext, RolePrompts};
use crate::transcript::{Speaker, Transcript, TranscriptEntry, TranscriptSink};

// ---------------------------------------------------------------------------
// States and results
// ---------------------------------------------------------------------------

/// Scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Pick the next counterparty.
    SelectNext,
    /// The given role speaks next.
    Turn(Role),
    /// Every counterparty has been handled.
    Done,
}

/// How one negotiation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiationOutcome {
    /// The counterparty negotiated with.
    pub counterparty: PartyId,
    /// Why the negotiation ended.
    pub reason: TerminationReason,
    /// Turns taken.
    pub iterations: u32,
    /// Trades settled during this negotiation.
    pub settlements: Vec<TransactionRecord>,
    /// The full transcript.
    pub transcript: Vec<TranscriptEntry>,
}

/// Outcomes of a whole run, in negotiation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// One outcome per counterparty.
    pub outcomes: Vec<NegotiationOutcome>,
}

impl RunSummary {
    /// The outcome for a counterparty.
    pub fn outcome(&self, counterparty: &PartyId) -> Option<&NegotiationOutcome> {
        self.outcomes
            .iter()
            .find(|outcome| &outcome.counterparty == counterparty)
    }

    /// Number of negotiations that ended with the given reason.
    pub fn count(&self, reason: TerminationReason) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.reason == reason)
            .count()
    }
}

// ---------------------------------------------------------------------------
// Per-negotiation state
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Negotiation {
    counterparty: PartyId,
    transcript: Transcript,
    iterations: u32,
    consecutive_failures: u32,
    settled_before: usize,
}

impl Negotiation {
    fn open(counterparty: PartyId, settled_before: usize) -> Self {
        Self {
            transcript: Transcript::opening(&counterparty),
            counterparty,
            iterations: 0,
            consecutive_failures: 0,
            settled_before,
        }
    }

    fn record(&mut self, entry: TranscriptEntry, sink: &mut dyn TranscriptSink) {
        sink.on_entry(&self.counterparty, &entry);
        self.transcript.push(entry);
    }
}

/// What one turn produced.
enum TurnResult {
    /// A finalized transcript line.
    Spoke(String),
    /// The negotiator failed.
    Faulted(String),
    /// The negotiator did not answer in time.
    TimedOut,
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Negotiate with every counterparty in turn.
///
/// Each negotiation starts with the opening line and the configured
/// opening speaker, and ends on agreement, withdrawal, the iteration cap,
/// a turn timeout, or too many consecutive negotiator faults. Any offer
/// still live at that point is discarded. Faults never abort the run; the
/// scheduler moves on to the next counterparty.
pub async fn run_negotiations<N: Negotiator>(
    market: &mut Market,
    negotiator: &mut N,
    prompts: &dyn RolePrompts,
    sink: &mut dyn TranscriptSink,
    config: &NegotiationConfig,
) -> RunSummary {
    let policy = config.policy_for(market.scenario());
    let mut queue = market.ledger().counterparties().to_vec().into_iter();
    let mut current: Option<Negotiation> = None;
    let mut summary = RunSummary::default();
    let mut state = SchedulerState::SelectNext;

    info!(
        scenario = ?market.scenario(),
        counterparties = queue.len(),
        max_iterations = config.max_iterations,
        ?policy,
        "Negotiations starting"
    );

    loop {
        state = match state {
            SchedulerState::SelectNext => match queue.next() {
                Some(counterparty) => {
                    info!(%counterparty, "Negotiation opened");
                    let mut negotiation =
                        Negotiation::open(counterparty, market.ledger().transactions().len());
                    if let Some(opening) = negotiation.transcript.latest().cloned() {
                        sink.on_entry(&negotiation.counterparty, &opening);
                    }
                    current = Some(negotiation);
                    SchedulerState::Turn(config.opening_speaker)
                }
                None => SchedulerState::Done,
            },
            SchedulerState::Turn(role) => match current.as_mut() {
                None => SchedulerState::SelectNext,
                Some(negotiation) => {
                    let decision =
                        step(market, negotiator, prompts, sink, config, policy, negotiation, role)
                            .await;
                    match decision {
                        Decision::Continue(next) => SchedulerState::Turn(next),
                        Decision::Terminate(reason) => {
                            if let Some(negotiation) = current.take() {
                                let outcome = close(market, negotiation, reason);
                                sink.on_outcome(&outcome);
                                summary.outcomes.push(outcome);
                            }
                            SchedulerState::SelectNext
                        }
                    }
                }
            },
            SchedulerState::Done => break,
        };
    }

    info!(
        negotiations = summary.outcomes.len(),
        agreements = summary.count(TerminationReason::Agreement),
        "Negotiations finished"
    );
    summary
}

/// Run one turn and decide what follows it.
#[allow(clippy::too_many_arguments)]
async fn step<N: Negotiator>(
    market: &mut Market,
    negotiator: &mut N,
    prompts: &dyn RolePrompts,
    sink: &mut dyn TranscriptSink,
    config: &NegotiationConfig,
    policy: TurnPolicy,
    negotiation: &mut Negotiation,
    role: Role,
) -> Decision {
    let party = match role {
        Role::Central => market.ledger().central().clone(),
        Role::Counterparty => negotiation.counterparty.clone(),
    };

    let result = take_turn(market, negotiator, prompts, config, negotiation, &party, role).await;

    let text = match result {
        TurnResult::Spoke(text) => {
            negotiation.consecutive_failures = 0;
            text
        }
        TurnResult::Faulted(text) => {
            negotiation.consecutive_failures = negotiation.consecutive_failures.saturating_add(1);
            warn!(
                %party,
                counterparty = %negotiation.counterparty,
                consecutive = negotiation.consecutive_failures,
                "Negotiator fault"
            );
            text
        }
        TurnResult::TimedOut => {
            warn!(%party, counterparty = %negotiation.counterparty, "Turn timed out");
            negotiation.iterations = negotiation.iterations.saturating_add(1);
            negotiation.record(
                TranscriptEntry {
                    speaker: Speaker::Moderator,
                    text: format!("Tempo esgotado aguardando {party}."),
                },
                sink,
            );
            return Decision::Terminate(TerminationReason::IterationLimit);
        }
    };

    debug!(%party, turn = negotiation.iterations.saturating_add(1), text = %text, "Turn finalized");
    let step = decide(
        negotiation.iterations,
        config.max_iterations,
        &text,
        market.offers().last_proposer(),
        role,
        policy,
    );
    negotiation.iterations = step.iterations;
    negotiation.record(
        TranscriptEntry {
            speaker: Speaker::Party { id: party, role },
            text,
        },
        sink,
    );

    if negotiation.consecutive_failures > config.max_consecutive_failures {
        Decision::Terminate(TerminationReason::CollaboratorFault)
    } else {
        step.decision
    }
}

/// Prompt, ask and finalize one reply.
async fn take_turn<N: Negotiator>(
    market: &mut Market,
    negotiator: &mut N,
    prompts: &dyn RolePrompts,
    config: &NegotiationConfig,
    negotiation: &Negotiation,
    party: &PartyId,
    role: Role,
) -> TurnResult {
    let scenario = market.scenario();
    let tool_using = uses_tools(scenario, role);

    let role_prompt = match market.ledger().account(party) {
        Ok(account) => prompts.role_prompt(&PromptContext {
            party,
            role,
            central: market.ledger().central(),
            counterparty: &negotiation.counterparty,
            scenario,
            tool_using,
            account,
            catalog: market.catalog(),
            offer: market.offers().active(),
        }),
        Err(err) => Err(NegotiatorError::Backend {
            message: err.to_string(),
        }),
    };
    let role_prompt = match role_prompt {
        Ok(prompt) => prompt,
        Err(err) => return TurnResult::Faulted(fault_text(&err)),
    };

    let turn = TurnContext {
        party,
        role,
        counterparty: &negotiation.counterparty,
        scenario,
        tool_using,
        role_prompt: &role_prompt,
        transcript: negotiation.transcript.entries(),
    };
    let reply = match config.turn_timeout() {
        Some(limit) => match tokio::time::timeout(limit, negotiator.respond(&turn)).await {
            Ok(reply) => reply,
            Err(_) => return TurnResult::TimedOut,
        },
        None => negotiator.respond(&turn).await,
    };

    match reply {
        Ok(reply) => {
            let actor = Actor {
                party,
                role,
                counterparty: &negotiation.counterparty,
            };
            TurnResult::Spoke(finalize(market, actor, scenario, tool_using, reply))
        }
        Err(err) => TurnResult::Faulted(fault_text(&err)),
    }
}

/// Execute the reply's action, if any, and append its outcome to the text.
fn finalize(
    market: &mut Market,
    actor: Actor<'_>,
    scenario: Scenario,
    tool_using: bool,
    reply: Reply,
) -> String {
    let Reply { text, action } = reply;

    if !tool_using {
        if action.is_some() {
            warn!(party = %actor.party, "Dropping action from a text-only party");
        }
        return text;
    }

    // Registration spelled out in free text by the buying central party.
    let action = action.or_else(|| {
        (scenario == Scenario::Commodity && actor.role == Role::Central)
            .then(|| find_transaction_command(&text))
            .flatten()
            .map(|parsed| parsed.map(NegotiationAction::RecordTransaction))
    });

    let result = match action {
        None => return text,
        Some(Err(err)) => format!("ERRO [{}]: {err}", err.kind()),
        Some(Ok(action)) => match market.execute(actor, &action) {
            Ok(outcome) => format!("SUCESSO: {outcome}"),
            Err(err) => {
                debug!(party = %actor.party, action = action.name(), error = %err, "Action rejected");
                format!("ERRO [{}]: {err}", err.kind())
            }
        },
    };

    if text.trim().is_empty() {
        result
    } else {
        format!("{text}\n{result}")
    }
}

fn fault_text(err: &NegotiatorError) -> String {
    format!("ERRO [{}]: {err}", ErrorKind::UnexpectedFailure)
}

/// End a negotiation: discard any live offer and collect its results.
fn close(market: &mut Market, negotiation: Negotiation, reason: TerminationReason) -> NegotiationOutcome {
    market.abandon();
    let settlements = market
        .ledger()
        .transactions()
        .get(negotiation.settled_before..)
        .map(<[TransactionRecord]>::to_vec)
        .unwrap_or_default();

    info!(
        counterparty = %negotiation.counterparty,
        %reason,
        iterations = negotiation.iterations,
        settlements = settlements.len(),
        "Negotiation closed"
    );

    NegotiationOutcome {
        counterparty: negotiation.counterparty,
        reason,
        iterations: negotiation.iterations,
        settlements,
        transcript: negotiation.transcript.entries().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use agrotrade_ledger::{Account, Ledger};
    use agrotrade_market::Catalog;
    use agrotrade_types::TransactionCommand;

    use super::*;
    use crate::negotiator::ScriptedNegotiator;
    use crate::prompt::BuiltinPrompts;
    use crate::transcript::NoOpSink;

    fn commodity_market(farmers: &[(&str, Decimal)]) -> Market {
        let mut ledger = Ledger::new(PartyId::from("Empresario"), Account::new(dec!(10000)));
        for (id, kg) in farmers {
            let opened = ledger.open_account(
                PartyId::from(*id),
                Account::new(Decimal::ZERO).with_stock("Soja", *kg),
            );
            assert!(opened.is_ok());
        }
        Market::new(
            Scenario::Commodity,
            Catalog::for_scenario(Scenario::Commodity),
            ledger,
        )
    }

    fn no_timeout() -> NegotiationConfig {
        NegotiationConfig {
            turn_timeout_ms: None,
            ..NegotiationConfig::default()
        }
    }

    #[tokio::test]
    async fn withdrawal_ends_negotiation_and_moves_on() {
        let mut market = commodity_market(&[("Fz1", dec!(500)), ("Fz2", dec!(700))]);
        let mut negotiator = ScriptedNegotiator::new()
            .say("Empresario", "Ofereço R$12 por kg.")
            .say("Fz1", "Muito pouco. Desisto da negociação.")
            .say("Empresario", "Desisto da negociação.");

        let summary = run_negotiations(
            &mut market,
            &mut negotiator,
            &BuiltinPrompts,
            &mut NoOpSink,
            &no_timeout(),
        )
        .await;

        assert_eq!(summary.outcomes.len(), 2);
        let first = summary.outcome(&PartyId::from("Fz1"));
        assert!(matches!(first, Some(o) if o.reason == TerminationReason::Abandoned && o.iterations == 2));
        let second = summary.outcome(&PartyId::from("Fz2"));
        assert!(matches!(second, Some(o) if o.reason == TerminationReason::Abandoned && o.iterations == 1));
    }

    #[tokio::test]
    async fn text_registration_settles_commodity_trade() {
        let mut market = commodity_market(&[("Fz1", dec!(500))]);
        let mut negotiator = ScriptedNegotiator::new()
            .say("Empresario", "Proponho R$15 por kg por 100kg.")
            .say("Fz1", "Fechado.")
            .say(
                "Empresario",
                "Registrando.\nComprador: Empresario, Vendedor: Fz1, Item: Soja, Quantidade: 100kg, Preço Total: R$1500",
            );

        let summary = run_negotiations(
            &mut market,
            &mut negotiator,
            &BuiltinPrompts,
            &mut NoOpSink,
            &no_timeout(),
        )
        .await;

        let outcome = summary.outcome(&PartyId::from("Fz1"));
        assert!(matches!(outcome, Some(o) if o.reason == TerminationReason::Agreement && o.settlements.len() == 1));
        let farmer = PartyId::from("Fz1");
        assert_eq!(market.ledger().get_balance(&farmer).ok(), Some(dec!(1500)));
        assert_eq!(market.ledger().get_stock(&farmer, "Soja").ok(), Some(dec!(400)));
    }

    #[tokio::test]
    async fn rejected_settlement_keeps_negotiating() {
        let mut market = commodity_market(&[("Fz1", dec!(50))]);
        let command = TransactionCommand {
            buyer: PartyId::from("Empresario"),
            seller: PartyId::from("Fz1"),
            item: "Soja".to_owned(),
            quantity: dec!(100),
            total_price: dec!(1500),
        };
        let mut negotiator = ScriptedNegotiator::new()
            .reply(
                "Empresario",
                Reply::with_action("", NegotiationAction::RecordTransaction(command)),
            )
            .say("Fz1", "Só tenho 50kg.")
            .say("Empresario", "Desisto da negociação.");

        let summary = run_negotiations(
            &mut market,
            &mut negotiator,
            &BuiltinPrompts,
            &mut NoOpSink,
            &no_timeout(),
        )
        .await;

        let outcome = summary.outcome(&PartyId::from("Fz1"));
        assert!(outcome.is_some());
        let Some(outcome) = outcome else { return };
        assert_eq!(outcome.reason, TerminationReason::Abandoned);
        assert!(outcome.settlements.is_empty());
        assert!(matches!(
            outcome.transcript.get(1),
            Some(entry) if entry.text.starts_with("ERRO [InsufficientStock]")
        ));
    }

    #[tokio::test]
    async fn text_only_party_actions_are_dropped() {
        let mut market = commodity_market(&[("Fz1", dec!(500))]);
        let mut negotiator = ScriptedNegotiator::new()
            .say("Empresario", "Olá.")
            .reply(
                "Fz1",
                Reply::with_action("Aceito.", NegotiationAction::Accept),
            )
            .say("Empresario", "Desisto da negociação.");

        let summary = run_negotiations(
            &mut market,
            &mut negotiator,
            &BuiltinPrompts,
            &mut NoOpSink,
            &no_timeout(),
        )
        .await;

        let outcome = summary.outcome(&PartyId::from("Fz1"));
        assert!(outcome.is_some());
        let Some(outcome) = outcome else { return };
        assert!(matches!(outcome.transcript.get(2), Some(entry) if entry.text == "Aceito."));
    }
}
