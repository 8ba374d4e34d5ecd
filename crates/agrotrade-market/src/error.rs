//! Error types for the agrotrade-market crate.
//!
//! Every market operation validates before it mutates, so any of these
//! errors means the ledger and the offer tracker were left untouched.

use rust_decimal::Decimal;

use agrotrade_ledger::LedgerError;
use agrotrade_types::{Category, ErrorKind, PartyId, Role, Scenario};

/// Errors raised by settlement, offer tracking and production.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarketError {
    /// The central party is on the wrong side of the trade for the scenario.
    #[error("'{central}' must be the {expected} in the {scenario:?} scenario")]
    UnauthorizedBuyer {
        /// The central party.
        central: PartyId,
        /// The side the central party must take ("buyer" or "seller").
        expected: &'static str,
        /// The active scenario.
        scenario: Scenario,
    },

    /// The party may not register this transaction directly.
    #[error("'{party}' may not record this transaction: {reason}")]
    UnauthorizedRecord {
        /// The party attempting the registration.
        party: PartyId,
        /// Why the registration was refused.
        reason: &'static str,
    },

    /// Buyer and seller name the same party.
    #[error("'{0}' cannot trade with itself")]
    SelfTrade(PartyId),

    /// The item is not in the catalog.
    #[error("item '{0}' not found in the catalog")]
    UnknownItem(String),

    /// A planting input is absent from the party's inventory.
    #[error("{category:?} '{input}' not found in the inventory of '{party}'")]
    MissingInput {
        /// The planting party.
        party: PartyId,
        /// Inventory category searched.
        category: Category,
        /// The missing input.
        input: String,
    },

    /// Pesticide was requested without a rented sprayer.
    #[error("'{party}' must rent a 'pulverizador' to apply pesticide")]
    SprayerRequired {
        /// The planting party.
        party: PartyId,
    },

    /// The party countering also made the last proposal.
    #[error("the {0:?} party already made the last proposal; wait for a reply")]
    ConsecutiveCounterNotAllowed(Role),

    /// No offer is live.
    #[error("there is no active offer")]
    NoActiveOffer,

    /// An offer is already live.
    #[error("an offer for '{item}' is already active")]
    OfferAlreadyActive {
        /// Item of the live offer.
        item: String,
    },

    /// The party accepting also made the last proposal.
    #[error("the {0:?} party cannot accept its own proposal")]
    SelfAcceptance(Role),

    /// Quantities must be strictly positive.
    #[error("quantity must be positive, got {0}")]
    InvalidQuantity(Decimal),

    /// Prices must be strictly positive.
    #[error("price must be positive, got {0}")]
    InvalidPrice(Decimal),

    /// Discrete items trade in whole units only.
    #[error("'{item}' is sold in whole units, got quantity {quantity}")]
    FractionalQuantity {
        /// The item traded.
        item: String,
        /// The rejected quantity.
        quantity: Decimal,
    },

    /// A discrete-item trade exceeds the per-trade unit cap.
    #[error("'{item}' trades at most {max} units at a time, got {quantity}")]
    TooManyUnits {
        /// The item traded.
        item: String,
        /// The rejected quantity.
        quantity: Decimal,
        /// The cap.
        max: u32,
    },

    /// A ledger read or mutation failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl MarketError {
    /// Map this error onto the shared error taxonomy.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnauthorizedBuyer { .. } | Self::UnauthorizedRecord { .. } => {
                ErrorKind::UnauthorizedBuyer
            }
            Self::UnknownItem(_) => ErrorKind::ItemNotFound,
            Self::MissingInput { .. } => ErrorKind::MissingInput,
            Self::SprayerRequired { .. } => ErrorKind::SprayerRequired,
            Self::ConsecutiveCounterNotAllowed(_) => ErrorKind::ConsecutiveCounterNotAllowed,
            Self::NoActiveOffer => ErrorKind::NoActiveOffer,
            Self::OfferAlreadyActive { .. } => ErrorKind::OfferAlreadyActive,
            Self::SelfAcceptance(_) => ErrorKind::SelfAcceptance,
            Self::SelfTrade(_)
            | Self::InvalidQuantity(_)
            | Self::InvalidPrice(_)
            | Self::FractionalQuantity { .. }
            | Self::TooManyUnits { .. } => ErrorKind::MalformedCommand,
            Self::Ledger(inner) => inner.kind(),
        }
    }
}
