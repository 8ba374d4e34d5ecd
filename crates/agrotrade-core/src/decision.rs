//! The pure turn decision function.
//!
//! After every turn the scheduler calls [`decide`] with the iteration
//! count, the cap, the latest finalized text and the offer state. The
//! function never touches the market or the negotiator, so the whole
//! termination and turn-order policy is testable in isolation.

use serde::{Deserialize, Serialize};

use agrotrade_types::{Role, Scenario, TerminationReason};

/// Phrase that ends a negotiation in agreement.
pub const AGREEMENT_PHRASE: &str = "transação de compra/venda registrada com sucesso";

/// Phrase that ends a negotiation by withdrawal.
pub const WITHDRAWAL_PHRASE: &str = "desisto da negociação";

/// Who speaks next when no offer is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPolicy {
    /// Alternate with whoever spoke last.
    Alternate,
    /// Hand the turn to the counterparty so it can open an offer.
    OfferDriven,
}

impl TurnPolicy {
    /// The policy a scenario uses unless configured otherwise.
    pub const fn default_for(scenario: Scenario) -> Self {
        match scenario {
            Scenario::Commodity => Self::Alternate,
            Scenario::Inputs => Self::OfferDriven,
        }
    }
}

/// What happens after a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Continue with the given role speaking.
    Continue(Role),
    /// End the negotiation.
    Terminate(TerminationReason),
}

/// A decision plus the incremented iteration counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionStep {
    /// Iteration counter after this turn.
    pub iterations: u32,
    /// What happens next.
    pub decision: Decision,
}

/// Decide what follows a turn.
///
/// The counter is incremented first. Exceeding `cap` terminates with
/// [`TerminationReason::IterationLimit`] even if the text also holds a
/// terminal phrase. Otherwise the terminal phrases are matched
/// case-insensitively anywhere in `latest_text`. With no termination, a
/// live offer hands the turn to whoever did not propose last; with none,
/// `policy` picks the speaker.
pub fn decide(
    iterations: u32,
    cap: u32,
    latest_text: &str,
    offer_last_proposer: Option<Role>,
    last_speaker: Role,
    policy: TurnPolicy,
) -> DecisionStep {
    let iterations = iterations.saturating_add(1);
    let decision = if iterations > cap {
        Decision::Terminate(TerminationReason::IterationLimit)
    } else if let Some(reason) = terminal_phrase(latest_text) {
        Decision::Terminate(reason)
    } else {
        Decision::Continue(next_speaker(offer_last_proposer, last_speaker, policy))
    };
    DecisionStep {
        iterations,
        decision,
    }
}

/// Detect a terminal phrase, case-insensitively.
pub fn terminal_phrase(text: &str) -> Option<TerminationReason> {
    let lowered = text.to_lowercase();
    if lowered.contains(AGREEMENT_PHRASE) {
        Some(TerminationReason::Agreement)
    } else if lowered.contains(WITHDRAWAL_PHRASE) {
        Some(TerminationReason::Abandoned)
    } else {
        None
    }
}

const fn next_speaker(offer_last_proposer: Option<Role>, last_speaker: Role, policy: TurnPolicy) -> Role {
    match (offer_last_proposer, policy) {
        (Some(proposer), _) => proposer.other(),
        (None, TurnPolicy::OfferDriven) => Role::Counterparty,
        (None, TurnPolicy::Alternate) => last_speaker.other(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn continue_step(iterations: u32, text: &str) -> DecisionStep {
        decide(iterations, 10, text, None, Role::Central, TurnPolicy::Alternate)
    }

    #[test]
    fn increments_counter() {
        assert_eq!(continue_step(0, "olá").iterations, 1);
    }

    #[test]
    fn cap_terminates_exactly_when_exceeded() {
        assert_eq!(
            continue_step(9, "sem acordo").decision,
            Decision::Continue(Role::Counterparty)
        );
        assert_eq!(
            continue_step(10, "sem acordo").decision,
            Decision::Terminate(TerminationReason::IterationLimit)
        );
    }

    #[test]
    fn cap_wins_over_terminal_phrase() {
        let step = continue_step(10, "Transação de compra/venda registrada com sucesso");
        assert_eq!(step.decision, Decision::Terminate(TerminationReason::IterationLimit));
    }

    #[test]
    fn agreement_phrase_matches_any_case_and_context() {
        for text in [
            "SUCESSO: Transação de compra/venda registrada com sucesso: Fz1 -> Empresario",
            "ok, TRANSAÇÃO DE COMPRA/VENDA REGISTRADA COM SUCESSO.",
        ] {
            assert_eq!(
                continue_step(1, text).decision,
                Decision::Terminate(TerminationReason::Agreement)
            );
        }
    }

    #[test]
    fn withdrawal_phrase_matches_any_case() {
        assert_eq!(
            continue_step(3, "Sinto muito, DESISTO DA NEGOCIAÇÃO").decision,
            Decision::Terminate(TerminationReason::Abandoned)
        );
    }

    #[test]
    fn live_offer_goes_to_non_proposer() {
        for policy in [TurnPolicy::Alternate, TurnPolicy::OfferDriven] {
            let step = decide(2, 10, "contra-oferta", Some(Role::Central), Role::Central, policy);
            assert_eq!(step.decision, Decision::Continue(Role::Counterparty));
            let step = decide(2, 10, "proposta", Some(Role::Counterparty), Role::Counterparty, policy);
            assert_eq!(step.decision, Decision::Continue(Role::Central));
        }
    }

    #[test]
    fn no_offer_defaults_by_policy() {
        let driven = decide(1, 10, "olá", None, Role::Counterparty, TurnPolicy::OfferDriven);
        assert_eq!(driven.decision, Decision::Continue(Role::Counterparty));
        let alternate = decide(1, 10, "olá", None, Role::Counterparty, TurnPolicy::Alternate);
        assert_eq!(alternate.decision, Decision::Continue(Role::Central));
    }

    #[test]
    fn scenario_defaults() {
        assert_eq!(TurnPolicy::default_for(Scenario::Commodity), TurnPolicy::Alternate);
        assert_eq!(TurnPolicy::default_for(Scenario::Inputs), TurnPolicy::OfferDriven);
    }
}
