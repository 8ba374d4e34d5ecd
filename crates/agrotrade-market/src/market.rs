//! The [`Market`]: owned state of a run plus action dispatch.
//!
//! The market bundles the ledger, the catalog and the offer tracker so the
//! scheduler holds exactly one `&mut` handle. [`Market::execute`] is the
//! single entry point that turns a [`NegotiationAction`] into a state
//! change and an [`ActionOutcome`].

use core::fmt;

use rust_decimal::Decimal;
use tracing::{debug, warn};

use agrotrade_ledger::{Account, Ledger, LedgerError};
use agrotrade_types::{
    NegotiationAction, PartyId, PlantingOrder, Role, Scenario, TransactionCommand,
    TransactionRecord,
};

use crate::catalog::Catalog;
use crate::error::MarketError;
use crate::offer::{Offer, OfferTracker};
use crate::production::{self, Harvest};
use crate::settlement;

// ---------------------------------------------------------------------------
// Acting party
// ---------------------------------------------------------------------------

/// Who is acting, and against whom.
#[derive(Debug, Clone, Copy)]
pub struct Actor<'a> {
    /// The acting party.
    pub party: &'a PartyId,
    /// The acting party's role.
    pub role: Role,
    /// The counterparty of the current negotiation.
    pub counterparty: &'a PartyId,
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// The result of a successfully executed action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// A new offer is live.
    Proposed(Offer),
    /// The live offer's price changed.
    Countered(Offer),
    /// The live offer was discarded.
    Rejected(Offer),
    /// A commodity purchase was registered.
    Settled(TransactionRecord),
    /// An input was sold to a farmer. The negotiation carries on.
    Sold(TransactionRecord),
    /// A parcel was planted.
    Planted {
        /// The planted parcel.
        parcel: String,
        /// The seed planted.
        seed: String,
        /// Yield and pollution of the planting.
        harvest: Harvest,
    },
    /// Snapshot of the acting party's holdings.
    Inventory {
        /// The party queried.
        party: PartyId,
        /// The party's account.
        account: Account,
    },
}

impl fmt::Display for ActionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Proposed(offer) => write!(
                f,
                "Oferta enviada: {} x {} por R${:.2}. Aguarde a resposta.",
                offer.quantity, offer.item, offer.price
            ),
            Self::Countered(offer) => write!(
                f,
                "Contra-oferta de R${:.2} por {} x {} enviada.",
                offer.price, offer.quantity, offer.item
            ),
            Self::Rejected(offer) => write!(
                f,
                "A oferta de {} pelo item '{}' foi rejeitada e a negociação sobre ela foi encerrada.",
                offer.counterparty, offer.item
            ),
            Self::Settled(record) => write!(
                f,
                "Transação de compra/venda registrada com sucesso: {record}."
            ),
            Self::Sold(record) => write!(
                f,
                "Venda de {} x {} para {} por R${:.2} concluída.",
                record.quantity, record.item, record.buyer, record.total_price
            ),
            Self::Planted {
                parcel,
                seed,
                harvest,
            } => write!(
                f,
                "Parcela {parcel} plantada com {seed}. Produtividade: {}. Poluição gerada: {}.",
                harvest.productivity, harvest.pollution
            ),
            Self::Inventory { party, account } => {
                write!(f, "Inventário de {party}: saldo R${:.2}", account.balance)?;
                for (good, qty) in &account.stock {
                    write!(f, "; {good}: {qty}")?;
                }
                for (category, items) in &account.inventory {
                    write!(f, "; {}: [{}]", category.label(), items.join(", "))?;
                }
                for (parcel, state) in &account.parcels {
                    write!(f, "; parcela {parcel}: {state}")?;
                }
                Ok(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Market
// ---------------------------------------------------------------------------

/// Ledger, catalog and offer slot for one simulation run.
#[derive(Debug, Clone)]
pub struct Market {
    scenario: Scenario,
    catalog: Catalog,
    ledger: Ledger,
    offers: OfferTracker,
}

impl Market {
    /// Assemble a market from its parts. The offer slot starts idle.
    pub const fn new(scenario: Scenario, catalog: Catalog, ledger: Ledger) -> Self {
        Self {
            scenario,
            catalog,
            ledger,
            offers: OfferTracker::new(),
        }
    }

    /// The active scenario.
    pub const fn scenario(&self) -> Scenario {
        self.scenario
    }

    /// The item catalog.
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The ledger.
    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// The offer tracker.
    pub const fn offers(&self) -> &OfferTracker {
        &self.offers
    }

    /// Consume the market, returning the ledger.
    pub fn into_ledger(self) -> Ledger {
        self.ledger
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Validate and apply a trade.
    pub fn settle(&mut self, command: &TransactionCommand) -> Result<TransactionRecord, MarketError> {
        settlement::settle(&mut self.ledger, &self.catalog, self.scenario, command)
    }

    /// Open an offer between the central party and `counterparty`.
    ///
    /// The item must exist in the catalog and the counterparty in the
    /// ledger. The item name is stored in its catalog spelling.
    pub fn propose(
        &mut self,
        proposer: Role,
        counterparty: &PartyId,
        item: &str,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<Offer, MarketError> {
        if !self.ledger.contains(counterparty) {
            return Err(LedgerError::UnknownParty(counterparty.clone()).into());
        }
        let item = self.catalog.get(item)?.item.clone();
        self.offers
            .propose(proposer, counterparty.clone(), item, quantity, price)
            .cloned()
    }

    /// Replace the price of the live offer.
    pub fn counter(&mut self, party: Role, price: Decimal) -> Result<Offer, MarketError> {
        self.offers.counter(party, price).cloned()
    }

    /// Discard the live offer.
    pub fn reject(&mut self) -> Result<Offer, MarketError> {
        self.offers.reject()
    }

    /// Accept the live offer and settle it.
    ///
    /// On success the offer slot returns to idle. On failure the offer
    /// stays live and unchanged.
    pub fn accept(&mut self, party: Role) -> Result<TransactionRecord, MarketError> {
        let offer = self.offers.acceptable_by(party)?;
        let central = self.ledger.central().clone();
        let (buyer, seller) = match self.scenario.paying_role() {
            Role::Central => (central, offer.counterparty.clone()),
            Role::Counterparty => (offer.counterparty.clone(), central),
        };
        let command = TransactionCommand {
            buyer,
            seller,
            item: offer.item.clone(),
            quantity: offer.quantity,
            total_price: offer.price,
        };
        let record = self.settle(&command)?;
        self.offers.clear();
        Ok(record)
    }

    /// Settle a transaction command spelled out by the negotiation itself.
    ///
    /// Only the central party of the commodity scenario registers trades
    /// this way, and only between itself and the counterparty it is
    /// negotiating with. Every other trade goes through the offer tracker.
    pub fn record(
        &mut self,
        actor: Actor<'_>,
        command: &TransactionCommand,
    ) -> Result<TransactionRecord, MarketError> {
        let unauthorized = |reason| MarketError::UnauthorizedRecord {
            party: actor.party.clone(),
            reason,
        };
        if self.scenario != Scenario::Commodity {
            return Err(unauthorized("inputs are sold through offers only"));
        }
        if actor.role != Role::Central {
            return Err(unauthorized("only the central party registers purchases"));
        }
        let between_negotiators = [&command.buyer, &command.seller].contains(&actor.party)
            && [&command.buyer, &command.seller].contains(&actor.counterparty);
        if !between_negotiators {
            return Err(unauthorized("the trade must be with the current counterparty"));
        }
        self.settle(command)
    }

    /// Wrap a settlement in the outcome its scenario reports.
    const fn settled(&self, record: TransactionRecord) -> ActionOutcome {
        match self.scenario {
            Scenario::Commodity => ActionOutcome::Settled(record),
            Scenario::Inputs => ActionOutcome::Sold(record),
        }
    }

    /// Drop any live offer. Used when a negotiation terminates.
    pub fn abandon(&mut self) -> Option<Offer> {
        let dropped = self.offers.clear();
        if let Some(offer) = &dropped {
            warn!(
                counterparty = %offer.counterparty,
                item = %offer.item,
                "live offer abandoned at end of negotiation"
            );
        }
        dropped
    }

    /// Plant a parcel owned by `party`.
    pub fn plant(&mut self, party: &PartyId, order: &PlantingOrder) -> Result<Harvest, MarketError> {
        production::plant(&mut self.ledger, party, order)
    }

    /// Snapshot of a party's holdings.
    pub fn query_inventory(&self, party: &PartyId) -> Result<&Account, MarketError> {
        Ok(self.ledger.account(party)?)
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    /// Execute a structured action on behalf of `actor`.
    pub fn execute(
        &mut self,
        actor: Actor<'_>,
        action: &NegotiationAction,
    ) -> Result<ActionOutcome, MarketError> {
        debug!(party = %actor.party, action = action.name(), "executing action");
        match action {
            NegotiationAction::Propose {
                item,
                quantity,
                price,
            } => self
                .propose(actor.role, actor.counterparty, item, *quantity, *price)
                .map(ActionOutcome::Proposed),
            NegotiationAction::Counter { price } => self
                .counter(actor.role, *price)
                .map(ActionOutcome::Countered),
            NegotiationAction::Reject => self.reject().map(ActionOutcome::Rejected),
            NegotiationAction::Accept => {
                let record = self.accept(actor.role)?;
                Ok(self.settled(record))
            }
            NegotiationAction::RecordTransaction(command) => {
                let record = self.record(actor, command)?;
                Ok(self.settled(record))
            }
            NegotiationAction::Plant(order) => {
                self.plant(actor.party, order)
                    .map(|harvest| ActionOutcome::Planted {
                        parcel: order.parcel.clone(),
                        seed: order.seed.clone(),
                        harvest,
                    })
            }
            NegotiationAction::QueryInventory => {
                self.query_inventory(actor.party)
                    .map(|account| ActionOutcome::Inventory {
                        party: actor.party.clone(),
                        account: account.clone(),
                    })
            }
        }
    }
}
