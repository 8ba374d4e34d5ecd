//! The transaction engine: validates and applies a settlement.
//!
//! A settlement moves cash from the paying party to the receiving party
//! and moves goods the other way:
//!
//! - Stock categories (commodities) move by quantity from the seller's
//!   stock to the buyer's stock.
//! - Every other category appends `quantity` whole units to the buyer's
//!   inventory, at most [`MAX_UNITS_PER_TRADE`] per trade; machines land
//!   among the rented machines.
//!
//! The scenario fixes which side the central party takes. In the commodity
//! scenario it must be the buyer; in the inputs scenario it must be the
//! seller.
//!
//! # Atomicity
//!
//! Every precondition is checked before the first mutation, so a failed
//! settlement leaves the ledger exactly as it was. A conservation check
//! runs after every successful settlement and logs any anomaly.

use core::ops::Neg;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{error, info};

use agrotrade_ledger::{ConservationResult, Ledger, LedgerError, TransactionBuilder};
use agrotrade_types::{CatalogEntry, Role, Scenario, TransactionCommand, TransactionRecord};

use crate::catalog::Catalog;
use crate::error::MarketError;

/// Largest number of discrete units a single trade may move.
pub const MAX_UNITS_PER_TRADE: u32 = 100;

/// Validate and apply a trade.
///
/// # Errors
///
/// Returns [`MarketError`] for the first failed precondition, checked in
/// this order: central-party side, self-trade, unknown parties, catalog
/// item, quantity and price positivity, whole units within the cap, buyer funds, seller
/// stock.
pub fn settle(
    ledger: &mut Ledger,
    catalog: &Catalog,
    scenario: Scenario,
    command: &TransactionCommand,
) -> Result<TransactionRecord, MarketError> {
    let entry = validate(ledger, catalog, scenario, command)?;
    let before = ledger.total_balance();

    let record = TransactionBuilder::new(entry.item.clone())
        .buyer(command.buyer.clone())
        .seller(command.seller.clone())
        .quantity(command.quantity)
        .total_price(command.total_price)
        .build()?;

    ledger.debit(&command.buyer, command.total_price)?;
    ledger.credit(&command.seller, command.total_price)?;

    if entry.category.is_stock() {
        ledger.adjust_stock(&command.seller, &entry.item, command.quantity.neg())?;
        ledger.adjust_stock(&command.buyer, &entry.item, command.quantity)?;
    } else {
        let units = whole_units(&entry, command.quantity)?;
        for _ in 0..units {
            ledger.add_to_inventory(&command.buyer, entry.category, &entry.item)?;
        }
    }

    ledger.append(record.clone());

    if let ConservationResult::Anomaly(anomaly) = ledger.verify_conservation(before) {
        error!(%anomaly, "cash conservation violated by settlement");
    }

    info!(
        buyer = %record.buyer,
        seller = %record.seller,
        item = %record.item,
        quantity = %record.quantity,
        total_price = %record.total_price,
        "transaction settled"
    );
    Ok(record)
}

/// Check every precondition and return the resolved catalog entry.
fn validate(
    ledger: &Ledger,
    catalog: &Catalog,
    scenario: Scenario,
    command: &TransactionCommand,
) -> Result<CatalogEntry, MarketError> {
    let central = ledger.central();
    let (central_side, expected) = match scenario.paying_role() {
        Role::Central => (&command.buyer, "buyer"),
        Role::Counterparty => (&command.seller, "seller"),
    };
    if central_side != central {
        return Err(MarketError::UnauthorizedBuyer {
            central: central.clone(),
            expected,
            scenario,
        });
    }
    if command.buyer == command.seller {
        return Err(MarketError::SelfTrade(command.buyer.clone()));
    }
    for party in [&command.buyer, &command.seller] {
        if !ledger.contains(party) {
            return Err(LedgerError::UnknownParty(party.clone()).into());
        }
    }

    let entry = catalog.get(&command.item)?.clone();

    if command.quantity <= Decimal::ZERO {
        return Err(MarketError::InvalidQuantity(command.quantity));
    }
    if command.total_price <= Decimal::ZERO {
        return Err(MarketError::InvalidPrice(command.total_price));
    }
    if !entry.category.is_stock() {
        whole_units(&entry, command.quantity)?;
    }

    let available = ledger.get_balance(&command.buyer)?;
    if available < command.total_price {
        return Err(LedgerError::InsufficientFunds {
            party: command.buyer.clone(),
            requested: command.total_price,
            available,
        }
        .into());
    }

    if entry.category.is_stock() {
        let on_hand = ledger.get_stock(&command.seller, &entry.item)?;
        if on_hand < command.quantity {
            return Err(LedgerError::InsufficientStock {
                party: command.seller.clone(),
                good: entry.item,
                requested: command.quantity,
                available: on_hand,
            }
            .into());
        }
    }

    Ok(entry)
}

/// Convert a quantity of discrete items into a unit count.
fn whole_units(entry: &CatalogEntry, quantity: Decimal) -> Result<u32, MarketError> {
    let fractional = || MarketError::FractionalQuantity {
        item: entry.item.clone(),
        quantity,
    };
    if !quantity.fract().is_zero() {
        return Err(fractional());
    }
    let units = quantity.to_u32().ok_or_else(fractional)?;
    if units > MAX_UNITS_PER_TRADE {
        return Err(MarketError::TooManyUnits {
            item: entry.item.clone(),
            quantity,
            max: MAX_UNITS_PER_TRADE,
        });
    }
    Ok(units)
}
