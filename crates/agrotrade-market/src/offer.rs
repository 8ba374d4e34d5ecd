//! The offer tracker: at most one live offer at a time.
//!
//! ```text
//! Idle --propose--> Proposed --accept--> Idle (settled)
//!                   Proposed --reject--> Idle
//!                   Proposed --counter--> Proposed (price and proposer replaced)
//! ```
//!
//! Parties are identified by [`Role`]: the tracker only ever sees the
//! central party and the counterparty of the current negotiation. Strict
//! alternation is enforced by `counter`: the party that made the last
//! proposal may not counter it again.
//!
//! Settlement itself lives in [`crate::market`]. The tracker exposes
//! [`OfferTracker::acceptable_by`] so the caller can settle first and
//! only then [`OfferTracker::clear`] the offer. A failed settlement
//! leaves the offer live and unchanged.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use agrotrade_types::{PartyId, Role};

use crate::error::MarketError;

// ---------------------------------------------------------------------------
// Offer
// ---------------------------------------------------------------------------

/// A live proposal between the central party and one counterparty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    /// The counterparty the offer concerns.
    pub counterparty: PartyId,
    /// Catalog item.
    pub item: String,
    /// Quantity traded.
    pub quantity: Decimal,
    /// Proposed total price.
    pub price: Decimal,
    /// Who made the latest proposal or counter.
    pub last_proposer: Role,
}

/// The offer lifecycle state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum OfferState {
    /// No live offer.
    #[default]
    Idle,
    /// An offer awaits a reply.
    Proposed(Offer),
}

// ---------------------------------------------------------------------------
// OfferTracker
// ---------------------------------------------------------------------------

/// Owner of the single process-wide offer slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OfferTracker {
    state: OfferState,
}

impl OfferTracker {
    /// Create an idle tracker.
    pub const fn new() -> Self {
        Self {
            state: OfferState::Idle,
        }
    }

    /// Current state.
    pub const fn state(&self) -> &OfferState {
        &self.state
    }

    /// The live offer, if any.
    pub const fn active(&self) -> Option<&Offer> {
        match &self.state {
            OfferState::Idle => None,
            OfferState::Proposed(offer) => Some(offer),
        }
    }

    /// Who made the latest proposal on the live offer.
    pub fn last_proposer(&self) -> Option<Role> {
        self.active().map(|offer| offer.last_proposer)
    }

    /// Open a new offer.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::OfferAlreadyActive`] if an offer is live, and
    /// [`MarketError::InvalidQuantity`] or [`MarketError::InvalidPrice`] for
    /// non-positive values.
    pub fn propose(
        &mut self,
        proposer: Role,
        counterparty: PartyId,
        item: String,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<&Offer, MarketError> {
        if let OfferState::Proposed(live) = &self.state {
            return Err(MarketError::OfferAlreadyActive {
                item: live.item.clone(),
            });
        }
        ensure_positive_quantity(quantity)?;
        ensure_positive_price(price)?;
        self.state = OfferState::Proposed(Offer {
            counterparty,
            item,
            quantity,
            price,
            last_proposer: proposer,
        });
        self.active().ok_or(MarketError::NoActiveOffer)
    }

    /// Replace the price of the live offer.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NoActiveOffer`] if nothing is live,
    /// [`MarketError::ConsecutiveCounterNotAllowed`] if `party` made the last
    /// proposal and [`MarketError::InvalidPrice`] for non-positive prices.
    pub fn counter(&mut self, party: Role, price: Decimal) -> Result<&Offer, MarketError> {
        let OfferState::Proposed(offer) = &mut self.state else {
            return Err(MarketError::NoActiveOffer);
        };
        if offer.last_proposer == party {
            return Err(MarketError::ConsecutiveCounterNotAllowed(party));
        }
        ensure_positive_price(price)?;
        offer.price = price;
        offer.last_proposer = party;
        Ok(offer)
    }

    /// Check that `party` may accept the live offer, without changing state.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NoActiveOffer`] if nothing is live and
    /// [`MarketError::SelfAcceptance`] if `party` made the last proposal.
    pub fn acceptable_by(&self, party: Role) -> Result<&Offer, MarketError> {
        let offer = self.active().ok_or(MarketError::NoActiveOffer)?;
        if offer.last_proposer == party {
            return Err(MarketError::SelfAcceptance(party));
        }
        Ok(offer)
    }

    /// Discard the live offer.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NoActiveOffer`] if nothing is live.
    pub fn reject(&mut self) -> Result<Offer, MarketError> {
        self.clear().ok_or(MarketError::NoActiveOffer)
    }

    /// Return to `Idle`, yielding the offer that was live.
    pub fn clear(&mut self) -> Option<Offer> {
        match core::mem::take(&mut self.state) {
            OfferState::Idle => None,
            OfferState::Proposed(offer) => Some(offer),
        }
    }
}

fn ensure_positive_quantity(quantity: Decimal) -> Result<(), MarketError> {
    if quantity > Decimal::ZERO {
        Ok(())
    } else {
        Err(MarketError::InvalidQuantity(quantity))
    }
}

fn ensure_positive_price(price: Decimal) -> Result<(), MarketError> {
    if price > Decimal::ZERO {
        Ok(())
    } else {
        Err(MarketError::InvalidPrice(price))
    }
}
