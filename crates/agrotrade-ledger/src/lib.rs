//! Balances, stock, inventories and the append-only transaction log.
//!
//! The [`Ledger`] holds every piece of mutable economic state in a run:
//! cash balances, commodity stock, inventories of discrete items, land
//! parcels and cumulative production. It is an explicitly owned value;
//! the market and the scheduler receive it by `&mut`, never through a
//! global.
//!
//! # Architecture
//!
//! - [`ledger`] -- The [`Ledger`] and per-party [`Account`] state.
//! - [`transaction`] -- The [`TransactionBuilder`] for validated records.
//! - [`conservation`] -- Cash conservation checks across settlements.
//!
//! # Conservation Law
//!
//! Settlements only move cash between parties, so the sum of all balances
//! is invariant for a run:
//!
//! ```text
//! sum(balances after) == sum(balances before)
//! ```
//!
//! A violation produces a [`LedgerAnomaly`]. The ledger never panics; it
//! returns errors.
//!
//! # Usage
//!
//! ```
//! use agrotrade_ledger::{Account, Ledger};
//! use agrotrade_ledger::conservation::ConservationResult;
//! use agrotrade_types::PartyId;
//! use rust_decimal::Decimal;
//!
//! let central = PartyId::from("Empresario");
//! let farmer = PartyId::from("Fz1");
//! let mut ledger = Ledger::new(central.clone(), Account::new(Decimal::new(10_000, 0)));
//! ledger
//!     .open_account(farmer.clone(), Account::new(Decimal::ZERO).with_stock("Soja", Decimal::new(500, 0)))
//!     .ok();
//! let before = ledger.total_balance();
//!
//! ledger.debit(&central, Decimal::new(9_500, 0)).ok();
//! ledger.credit(&farmer, Decimal::new(9_500, 0)).ok();
//!
//! assert_eq!(ledger.verify_conservation(before), ConservationResult::Balanced);
//! ```

pub mod conservation;
pub mod ledger;
pub mod transaction;

// Re-export primary types at crate root.
pub use conservation::ConservationResult;
pub use ledger::{Account, Ledger};
pub use transaction::TransactionBuilder;

use rust_decimal::Decimal;

use agrotrade_types::{Category, ErrorKind, PartyId};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when reading or mutating the ledger.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// No account exists for the party.
    #[error("unknown party '{0}'")]
    UnknownParty(PartyId),

    /// An account already exists for the party.
    #[error("party '{0}' already has an account")]
    DuplicateParty(PartyId),

    /// A debit exceeds the party's balance.
    #[error("insufficient funds for '{party}': cost R${requested:.2}, balance R${available:.2}")]
    InsufficientFunds {
        /// The party being debited.
        party: PartyId,
        /// Amount requested.
        requested: Decimal,
        /// Balance at the time of the request.
        available: Decimal,
    },

    /// A stock adjustment would leave a negative quantity.
    #[error("insufficient stock of '{good}' for '{party}': requested {requested}, on hand {available}")]
    InsufficientStock {
        /// The party whose stock was adjusted.
        party: PartyId,
        /// The good being adjusted.
        good: String,
        /// Quantity that would be removed.
        requested: Decimal,
        /// Quantity on hand.
        available: Decimal,
    },

    /// An inventory item is not held by the party.
    #[error("item '{item}' ({category:?}) not found in the inventory of '{party}'")]
    ItemNotFound {
        /// The party whose inventory was searched.
        party: PartyId,
        /// Inventory category searched.
        category: Category,
        /// The missing item.
        item: String,
    },

    /// The parcel does not belong to the party.
    #[error("parcel '{parcel}' does not belong to '{party}'")]
    ParcelNotFound {
        /// The party named in the request.
        party: PartyId,
        /// The requested parcel.
        parcel: String,
    },

    /// The parcel is already planted.
    #[error("parcel '{parcel}' of '{party}' is already planted with {crop}")]
    ParcelOccupied {
        /// The owning party.
        party: PartyId,
        /// The occupied parcel.
        parcel: String,
        /// The crop already growing there.
        crop: String,
    },

    /// Monetary amounts and quantities must not be negative.
    #[error("amount must not be negative, got {amount}")]
    NegativeAmount {
        /// The invalid amount.
        amount: Decimal,
    },

    /// Quantity must be strictly positive.
    #[error("transaction quantity must be non-zero")]
    ZeroQuantity,

    /// A required field was not set on the builder.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// An arithmetic operation overflowed.
    #[error("arithmetic overflow: {0}")]
    Overflow(&'static str),
}

impl LedgerError {
    /// Map this error onto the shared error taxonomy.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownParty(_) => ErrorKind::UnknownParty,
            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Self::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            Self::ItemNotFound { .. } => ErrorKind::ItemNotFound,
            Self::ParcelNotFound { .. } => ErrorKind::ParcelNotFound,
            Self::ParcelOccupied { .. } => ErrorKind::ParcelOccupied,
            Self::NegativeAmount { .. } | Self::ZeroQuantity | Self::MissingField(_) => {
                ErrorKind::MalformedCommand
            }
            Self::DuplicateParty(_) | Self::Overflow(_) => ErrorKind::UnexpectedFailure,
        }
    }
}

// ---------------------------------------------------------------------------
// Anomaly type
// ---------------------------------------------------------------------------

/// A conservation violation detected by [`Ledger::verify_conservation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerAnomaly {
    /// Total cash expected across all accounts.
    pub expected_total: Decimal,
    /// Total cash actually found.
    pub actual_total: Decimal,
    /// Human-readable description of the anomaly.
    pub message: String,
}

impl core::fmt::Display for LedgerAnomaly {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.message)
    }
}
