//! Role prompts handed to the negotiator each turn.
//!
//! The scheduler renders a fresh role prompt before every turn so the
//! party sees its current holdings. [`RolePrompts`] is the seam; the
//! runner plugs in template-based prompts, tests use [`BuiltinPrompts`].

use core::fmt::Write as _;

use agrotrade_ledger::Account;
use agrotrade_market::{Catalog, Offer};
use agrotrade_types::{PartyId, Role, Scenario};

use crate::decision::{AGREEMENT_PHRASE, WITHDRAWAL_PHRASE};
use crate::negotiator::NegotiatorError;

/// Inputs available when rendering a role prompt.
#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
    /// The party about to speak.
    pub party: &'a PartyId,
    /// Its role.
    pub role: Role,
    /// The central party.
    pub central: &'a PartyId,
    /// The counterparty of the current negotiation.
    pub counterparty: &'a PartyId,
    /// The active scenario.
    pub scenario: Scenario,
    /// Whether the party may attach structured actions.
    pub tool_using: bool,
    /// The speaking party's holdings.
    pub account: &'a Account,
    /// The item catalog.
    pub catalog: &'a Catalog,
    /// The live offer, if any.
    pub offer: Option<&'a Offer>,
}

/// Renders the role prompt for a turn.
pub trait RolePrompts {
    /// Render the prompt for `ctx.party`.
    ///
    /// # Errors
    ///
    /// A rendering failure counts as a negotiator fault for the turn.
    fn role_prompt(&self, ctx: &PromptContext<'_>) -> Result<String, NegotiatorError>;
}

/// Short fixed prompts, enough for scripted runs and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinPrompts;

impl RolePrompts for BuiltinPrompts {
    fn role_prompt(&self, ctx: &PromptContext<'_>) -> Result<String, NegotiatorError> {
        let goal = match (ctx.scenario, ctx.role) {
            (Scenario::Commodity, Role::Central) => "comprar soja pelo menor preço",
            (Scenario::Commodity, Role::Counterparty) => "vender sua soja pelo maior preço",
            (Scenario::Inputs, Role::Central) => "vender insumos e alugar máquinas com lucro",
            (Scenario::Inputs, Role::Counterparty) => "comprar insumos e plantar suas parcelas",
        };
        let mut prompt = format!(
            "Você é {}. Seu objetivo é {goal}. Saldo: R${:.2}.",
            ctx.party, ctx.account.balance
        );
        for (good, qty) in &ctx.account.stock {
            let _ = write!(prompt, " Estoque de {good}: {qty}.");
        }
        if let Some(offer) = ctx.offer {
            let _ = write!(
                prompt,
                " Oferta ativa: {} x {} por R${:.2}.",
                offer.quantity, offer.item, offer.price
            );
        }
        let _ = write!(
            prompt,
            " Para encerrar sem acordo diga \"{WITHDRAWAL_PHRASE}\". Um acordo registrado é confirmado com \"{AGREEMENT_PHRASE}\"."
        );
        Ok(prompt)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn builtin_prompt_mentions_balance_and_phrases() {
        let party = PartyId::from("Empresario");
        let fz = PartyId::from("Fz1");
        let account = Account::new(Decimal::new(10_000, 0));
        let catalog = Catalog::for_scenario(Scenario::Commodity);
        let ctx = PromptContext {
            party: &party,
            role: Role::Central,
            central: &party,
            counterparty: &fz,
            scenario: Scenario::Commodity,
            tool_using: true,
            account: &account,
            catalog: &catalog,
            offer: None,
        };
        let prompt = BuiltinPrompts.role_prompt(&ctx);
        assert!(matches!(
            &prompt,
            Ok(text) if text.contains("R$10000.00") && text.contains(WITHDRAWAL_PHRASE)
        ));
    }
}
