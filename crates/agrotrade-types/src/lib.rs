//! Shared type definitions for the Agrotrade negotiation simulation.
//!
//! This crate is the single source of truth for the identifiers, enums and
//! records every other crate in the workspace exchanges.
//!
//! # Modules
//!
//! - [`ids`] -- Party names and transaction identifiers
//! - [`enums`] -- Roles, scenarios, catalog categories, error kinds, termination reasons
//! - [`structs`] -- Transaction records, catalog entries, parcel state
//! - [`actions`] -- The structured action vocabulary negotiators can emit

pub mod actions;
pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use actions::{NegotiationAction, PlantingOrder, TransactionCommand};
pub use enums::{Category, ErrorKind, Role, Scenario, TerminationReason};
pub use ids::{PartyId, TransactionId};
pub use structs::{CatalogEntry, ParcelState, TransactionRecord};
