//! Core record structs: transaction records, catalog entries, parcel state.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::enums::Category;
use crate::ids::{PartyId, TransactionId};

// ---------------------------------------------------------------------------
// TransactionRecord
// ---------------------------------------------------------------------------

/// A settled trade, appended to the ledger's transaction log.
///
/// Records are immutable once appended. `buyer` is always the paying party
/// and `seller` the party receiving payment, whichever scenario produced
/// the trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Unique record identifier.
    pub id: TransactionId,
    /// The paying party.
    pub buyer: PartyId,
    /// The party receiving payment.
    pub seller: PartyId,
    /// Catalog item traded.
    pub item: String,
    /// Quantity traded (kg for commodities, units otherwise).
    pub quantity: Decimal,
    /// Total price paid for the whole quantity.
    pub total_price: Decimal,
    /// Wall-clock time the settlement was applied.
    pub recorded_at: DateTime<Utc>,
}

impl core::fmt::Display for TransactionRecord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{} -> {}: {} x {} por R${:.2}",
            self.seller, self.buyer, self.quantity, self.item, self.total_price
        )
    }
}

// ---------------------------------------------------------------------------
// CatalogEntry
// ---------------------------------------------------------------------------

/// One item in the static catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Item identifier (e.g. `"soja"`, `"pacote2"`).
    pub item: String,
    /// Category the item belongs to.
    pub category: Category,
    /// Reference price per unit; negotiated prices are free to differ.
    pub reference_price: Decimal,
}

// ---------------------------------------------------------------------------
// ParcelState
// ---------------------------------------------------------------------------

/// Planting state of a land parcel.
///
/// The transition `Empty -> Planted` is one-way within a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParcelState {
    /// Nothing planted.
    #[default]
    Empty,
    /// Planted with the named seed.
    Planted(String),
}

impl ParcelState {
    /// Whether the parcel can be planted.
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl core::fmt::Display for ParcelState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Empty => f.write_str("vazia"),
            Self::Planted(seed) => f.write_str(seed),
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn parcel_defaults_to_empty() {
        let parcel = ParcelState::default();
        assert!(parcel.is_empty());
        assert!(!ParcelState::Planted("soja".to_owned()).is_empty());
    }

    #[test]
    fn record_display_names_both_parties() {
        let record = TransactionRecord {
            id: TransactionId::new(),
            buyer: PartyId::from("Empresario"),
            seller: PartyId::from("Fz1"),
            item: "Soja".to_owned(),
            quantity: dec!(500),
            total_price: dec!(9500),
            recorded_at: Utc::now(),
        };
        let text = record.to_string();
        assert!(text.contains("Fz1 -> Empresario"));
        assert!(text.contains("R$9500.00"));
    }
}
