//! Enumeration types shared across the simulation.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Roles and scenarios
// ---------------------------------------------------------------------------

/// Which side of a negotiation a party plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The single central party (the Buyer role) present in every negotiation.
    Central,
    /// The counterparty currently being negotiated with.
    Counterparty,
}

impl Role {
    /// Return the opposite role.
    pub const fn other(self) -> Self {
        match self {
            Self::Central => Self::Counterparty,
            Self::Counterparty => Self::Central,
        }
    }
}

/// The economic setup the engine settles trades under.
///
/// The scenario fixes the settlement direction: in [`Scenario::Commodity`]
/// the central party pays counterparties for stock, in
/// [`Scenario::Inputs`] the central party sells inputs and rents machines
/// to counterparties, who pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// The central party buys a stocked commodity from each counterparty.
    Commodity,
    /// The central party sells farm inputs to each counterparty.
    Inputs,
}

impl Scenario {
    /// The role that pays in a settlement under this scenario.
    pub const fn paying_role(self) -> Role {
        match self {
            Self::Commodity => Role::Central,
            Self::Inputs => Role::Counterparty,
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog categories
// ---------------------------------------------------------------------------

/// Category of a catalog item.
///
/// Commodities are tracked as stock quantities; every other category is an
/// inventory of discrete units. Machines are rented, not consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Bulk good held as stock (e.g. soybeans by the kg).
    Commodity,
    /// Seed for planting a parcel.
    Seed,
    /// Fertilizer consumed when planting.
    Fertilizer,
    /// Pesticide consumed when planting; requires a sprayer.
    Pesticide,
    /// Rented machine package or sprayer.
    Machine,
}

impl Category {
    /// Whether items of this category are tracked as stock quantities.
    pub const fn is_stock(self) -> bool {
        matches!(self, Self::Commodity)
    }

    /// Lowercase label used in reports and prompts.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Commodity => "commodity",
            Self::Seed => "seed",
            Self::Fertilizer => "fertilizer",
            Self::Pesticide => "pesticide",
            Self::Machine => "rented_machine",
        }
    }
}

// ---------------------------------------------------------------------------
// Error kinds
// ---------------------------------------------------------------------------

/// Every failure a negotiation turn can surface in the transcript.
///
/// Each crate keeps its own error enum; all of them map onto this flat
/// taxonomy through a `kind()` method so diagnostics read the same no
/// matter which layer rejected the action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The paying party's balance is below the amount owed.
    InsufficientFunds,
    /// The seller's stock is below the traded quantity.
    InsufficientStock,
    /// The named party does not exist in the ledger.
    UnknownParty,
    /// The central party is not on the side of the trade its scenario requires.
    UnauthorizedBuyer,
    /// The item is not in the catalog or not in the party's inventory.
    ItemNotFound,
    /// The parcel already holds a crop.
    ParcelOccupied,
    /// The parcel does not belong to the party.
    ParcelNotFound,
    /// A planting input is absent from the party's inventory.
    MissingInput,
    /// Pesticide was requested without a rented sprayer.
    SprayerRequired,
    /// The same party tried to counter twice in a row.
    ConsecutiveCounterNotAllowed,
    /// An offer operation was attempted with no live offer.
    NoActiveOffer,
    /// A proposal was attempted while another offer is live.
    OfferAlreadyActive,
    /// A party tried to accept its own proposal.
    SelfAcceptance,
    /// A structured command could not be parsed or has invalid values.
    MalformedCommand,
    /// Catch-all for collaborator faults.
    UnexpectedFailure,
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{self:?}")
    }
}

// ---------------------------------------------------------------------------
// Termination
// ---------------------------------------------------------------------------

/// Why a single negotiation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// A settlement-success phrase was observed.
    Agreement,
    /// A withdrawal phrase was observed.
    Abandoned,
    /// The per-negotiation turn counter exceeded its cap, or a turn timed out.
    IterationLimit,
    /// The negotiator failed repeatedly and the negotiation was aborted.
    CollaboratorFault,
}

impl core::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let label = match self {
            Self::Agreement => "agreement reached",
            Self::Abandoned => "abandoned",
            Self::IterationLimit => "iteration limit",
            Self::CollaboratorFault => "collaborator fault",
        };
        f.write_str(label)
    }
}
