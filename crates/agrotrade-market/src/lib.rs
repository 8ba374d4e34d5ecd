//! Market rules for the Agrotrade negotiation simulation.
//!
//! This crate is the logic layer between the ledger and the scheduler:
//! everything that validates and applies economic actions without doing
//! any I/O.
//!
//! # Modules
//!
//! - [`catalog`] -- Items, categories and reference prices ([`Catalog`])
//! - [`offer`] -- The single live offer and its state machine ([`OfferTracker`])
//! - [`settlement`] -- The transaction engine ([`settle`])
//! - [`production`] -- Planting and harvest scoring ([`plant`])
//! - [`market`] -- Owned run state and action dispatch ([`Market`])
//! - [`error`] -- Error types for every market operation ([`MarketError`])

pub mod catalog;
pub mod error;
pub mod market;
pub mod offer;
pub mod production;
pub mod settlement;

// Re-export primary types at crate root for convenience.
pub use catalog::{Catalog, SPRAYER};
pub use error::MarketError;
pub use market::{ActionOutcome, Actor, Market};
pub use offer::{Offer, OfferState, OfferTracker};
pub use production::{Harvest, plant, score};
pub use settlement::{MAX_UNITS_PER_TRADE, settle};
