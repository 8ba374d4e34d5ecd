//! The fixed vocabulary of structured negotiation actions.
//!
//! A tool-using negotiator may attach one of these to its reply. The
//! scheduler executes it against the market before the reply text is
//! finalized into the transcript.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::PartyId;

/// A structured action a party can take during its turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NegotiationAction {
    /// Open an offer for `quantity` units of `item` at total `price`.
    Propose {
        /// Catalog item.
        item: String,
        /// Quantity requested.
        quantity: Decimal,
        /// Proposed total price.
        price: Decimal,
    },
    /// Accept the live offer made by the other party.
    Accept,
    /// Reject and discard the live offer.
    Reject,
    /// Replace the price of the live offer.
    Counter {
        /// The new proposed total price.
        price: Decimal,
    },
    /// Plant a parcel using inputs from inventory.
    Plant(PlantingOrder),
    /// Report the acting party's inventory and parcels.
    QueryInventory,
    /// Register an agreed trade directly (commodity scenario).
    RecordTransaction(TransactionCommand),
}

impl NegotiationAction {
    /// Short name used in logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Propose { .. } => "propose",
            Self::Accept => "accept",
            Self::Reject => "reject",
            Self::Counter { .. } => "counter",
            Self::Plant(_) => "plant",
            Self::QueryInventory => "query_inventory",
            Self::RecordTransaction(_) => "record_transaction",
        }
    }
}

/// Inputs for a planting action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlantingOrder {
    /// Parcel to plant.
    pub parcel: String,
    /// Seed item taken from inventory.
    pub seed: String,
    /// Rented machine package used (not consumed).
    pub machine: String,
    /// Optional fertilizer taken from inventory.
    #[serde(default)]
    pub fertilizer: Option<String>,
    /// Optional pesticide taken from inventory; needs a sprayer.
    #[serde(default)]
    pub pesticide: Option<String>,
}

/// A fully parsed transaction command.
///
/// Produced by the strict command parser from the text form
/// `Comprador: <id>, Vendedor: <id>, Item: <name>, Quantidade: <n>kg, Preço Total: <n>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionCommand {
    /// The paying party.
    pub buyer: PartyId,
    /// The party receiving payment.
    pub seller: PartyId,
    /// Catalog item traded.
    pub item: String,
    /// Quantity in kg.
    pub quantity: Decimal,
    /// Total price.
    pub total_price: Decimal,
}
