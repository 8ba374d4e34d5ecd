//! The production engine: planting a parcel and scoring the harvest.
//!
//! Planting consumes one unit each of the seed and the optional fertilizer
//! and pesticide. The machine package is rented, not consumed. Yield and
//! pollution are fixed functions of the inputs:
//!
//! ```text
//! yield     = 50 + machine_bonus + fertilizer_bonus
//! pollution = seed_pollution
//!
//! with pesticide:
//!   yield     = (yield + pesticide_bonus) * seed_multiplier
//!   pollution = (pollution + pesticide_pollution) / 2   when a sprayer is rented
//! ```
//!
//! Unknown names score zero bonus and the fallback pollution.

use serde::{Deserialize, Serialize};
use tracing::info;

use agrotrade_ledger::{Ledger, LedgerError};
use agrotrade_types::{Category, ParcelState, PartyId, PlantingOrder};

use crate::catalog::SPRAYER;
use crate::error::MarketError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Yield of a parcel planted with no bonuses.
pub const BASE_YIELD: u32 = 50;

/// Pollution of a seed not listed in [`SEED_POLLUTION`].
pub const DEFAULT_SEED_POLLUTION: u32 = 15;

/// Pollution of a pesticide not listed in [`PESTICIDE_POLLUTION`].
pub const DEFAULT_PESTICIDE_POLLUTION: u32 = 50;

/// Yield bonus per machine package.
pub const MACHINE_BONUS: &[(&str, u32)] = &[("pacote1", 25), ("pacote2", 60), ("pacote3", 150)];

/// Yield bonus per fertilizer.
pub const FERTILIZER_BONUS: &[(&str, u32)] = &[
    ("fertilizante-comum", 50),
    ("fertilizante-premium", 120),
    ("fertilizante-super-premium", 250),
];

/// Yield bonus per pesticide.
pub const PESTICIDE_BONUS: &[(&str, u32)] = &[
    ("agrotoxico-comum", 200),
    ("agrotoxico-premium", 500),
    ("agrotoxico-super-premium", 1000),
];

/// Multiplier applied to the running yield when pesticide is used.
pub const SEED_MULTIPLIER: &[(&str, u32)] = &[("soja", 3), ("arroz", 2)];

/// Base pollution per seed.
pub const SEED_POLLUTION: &[(&str, u32)] = &[("soja", 30), ("arroz", 20), ("hortalica", 10)];

/// Pollution added per pesticide.
pub const PESTICIDE_POLLUTION: &[(&str, u32)] = &[
    ("agrotoxico-comum", 100),
    ("agrotoxico-premium", 150),
    ("agrotoxico-super-premium", 250),
];

fn lookup(table: &[(&str, u32)], name: &str) -> Option<u32> {
    table
        .iter()
        .find(|(key, _)| *key == name)
        .map(|&(_, value)| value)
}

// ---------------------------------------------------------------------------
// Harvest
// ---------------------------------------------------------------------------

/// Outcome of a planting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Harvest {
    /// Yield of this planting.
    pub productivity: u32,
    /// Pollution generated by this planting.
    pub pollution: u32,
}

/// Score a planting without touching any state.
///
/// `sprayer` tells whether the party has a sprayer among its rented
/// machines; it only matters when pesticide is applied.
///
/// # Errors
///
/// Returns [`LedgerError::Overflow`] (wrapped) on arithmetic overflow.
pub fn score(order: &PlantingOrder, sprayer: bool) -> Result<Harvest, MarketError> {
    let overflow = |what| MarketError::from(LedgerError::Overflow(what));

    let mut productivity = BASE_YIELD
        .checked_add(lookup(MACHINE_BONUS, &order.machine).unwrap_or(0))
        .and_then(|y| {
            let fertilizer = order.fertilizer.as_deref().and_then(|f| lookup(FERTILIZER_BONUS, f));
            y.checked_add(fertilizer.unwrap_or(0))
        })
        .ok_or_else(|| overflow("yield"))?;
    let mut pollution = lookup(SEED_POLLUTION, &order.seed).unwrap_or(DEFAULT_SEED_POLLUTION);

    if let Some(pesticide) = order.pesticide.as_deref() {
        let multiplier = lookup(SEED_MULTIPLIER, &order.seed).unwrap_or(1);
        productivity = productivity
            .checked_add(lookup(PESTICIDE_BONUS, pesticide).unwrap_or(0))
            .and_then(|y| y.checked_mul(multiplier))
            .ok_or_else(|| overflow("yield"))?;
        pollution = pollution
            .checked_add(
                lookup(PESTICIDE_POLLUTION, pesticide).unwrap_or(DEFAULT_PESTICIDE_POLLUTION),
            )
            .ok_or_else(|| overflow("pollution"))?;
        if sprayer {
            pollution = pollution.checked_div(2).ok_or_else(|| overflow("pollution"))?;
        }
    }

    Ok(Harvest {
        productivity,
        pollution,
    })
}

// ---------------------------------------------------------------------------
// Planting
// ---------------------------------------------------------------------------

/// Plant a parcel owned by `party`.
///
/// # Errors
///
/// Returns the first failed precondition, checked in this order: unknown
/// party, parcel not owned, parcel occupied, seed, machine package,
/// fertilizer and pesticide missing from inventory, pesticide without a
/// sprayer. Nothing is consumed when any check fails.
pub fn plant(
    ledger: &mut Ledger,
    party: &PartyId,
    order: &PlantingOrder,
) -> Result<Harvest, MarketError> {
    if let ParcelState::Planted(crop) = ledger.parcel(party, &order.parcel)? {
        return Err(LedgerError::ParcelOccupied {
            party: party.clone(),
            parcel: order.parcel.clone(),
            crop: crop.clone(),
        }
        .into());
    }

    let mut consumed: Vec<(Category, &str)> = vec![(Category::Seed, order.seed.as_str())];
    require(ledger, party, Category::Seed, &order.seed)?;
    require(ledger, party, Category::Machine, &order.machine)?;
    if let Some(fertilizer) = order.fertilizer.as_deref() {
        require(ledger, party, Category::Fertilizer, fertilizer)?;
        consumed.push((Category::Fertilizer, fertilizer));
    }
    let sprayer = ledger.has_item(party, Category::Machine, SPRAYER)?;
    if let Some(pesticide) = order.pesticide.as_deref() {
        require(ledger, party, Category::Pesticide, pesticide)?;
        if !sprayer {
            return Err(MarketError::SprayerRequired {
                party: party.clone(),
            });
        }
        consumed.push((Category::Pesticide, pesticide));
    }

    let harvest = score(order, sprayer)?;

    for (category, item) in consumed {
        ledger.remove_from_inventory(party, category, item)?;
    }
    ledger.mark_planted(party, &order.parcel, &order.seed)?;
    ledger.record_production(party, harvest.productivity, harvest.pollution)?;

    info!(
        party = %party,
        parcel = %order.parcel,
        seed = %order.seed,
        productivity = harvest.productivity,
        pollution = harvest.pollution,
        "parcel planted"
    );
    Ok(harvest)
}

fn require(
    ledger: &Ledger,
    party: &PartyId,
    category: Category,
    input: &str,
) -> Result<(), MarketError> {
    if ledger.has_item(party, category, input)? {
        Ok(())
    } else {
        Err(MarketError::MissingInput {
            party: party.clone(),
            category,
            input: input.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use agrotrade_ledger::Account;

    use super::*;

    fn farmer() -> PartyId {
        PartyId::from("Agricultor1")
    }

    fn ledger_with(items: &[(Category, &str)]) -> Ledger {
        let account = items.iter().fold(
            Account::new(Decimal::ZERO).with_parcel("P1").with_parcel("P2"),
            |account, &(category, item)| account.with_item(category, item),
        );
        let mut ledger = Ledger::new(PartyId::from("Empresario"), Account::default());
        assert!(ledger.open_account(farmer(), account).is_ok());
        ledger
    }

    fn order(seed: &str, machine: &str, fertilizer: Option<&str>, pesticide: Option<&str>) -> PlantingOrder {
        PlantingOrder {
            parcel: "P1".to_owned(),
            seed: seed.to_owned(),
            machine: machine.to_owned(),
            fertilizer: fertilizer.map(str::to_owned),
            pesticide: pesticide.map(str::to_owned),
        }
    }

    #[test]
    fn seed_and_machine_only() {
        let mut ledger = ledger_with(&[(Category::Seed, "soja"), (Category::Machine, "pacote1")]);
        let harvest = plant(&mut ledger, &farmer(), &order("soja", "pacote1", None, None));
        assert_eq!(
            harvest.ok(),
            Some(Harvest {
                productivity: 75,
                pollution: 30
            })
        );
        assert_eq!(ledger.has_item(&farmer(), Category::Seed, "soja").ok(), Some(false));
        assert_eq!(ledger.has_item(&farmer(), Category::Machine, "pacote1").ok(), Some(true));
    }

    #[test]
    fn replanting_same_parcel_fails() {
        let mut ledger = ledger_with(&[
            (Category::Seed, "soja"),
            (Category::Seed, "arroz"),
            (Category::Machine, "pacote1"),
        ]);
        assert!(plant(&mut ledger, &farmer(), &order("soja", "pacote1", None, None)).is_ok());
        let again = plant(&mut ledger, &farmer(), &order("arroz", "pacote1", None, None));
        assert!(matches!(
            again,
            Err(MarketError::Ledger(LedgerError::ParcelOccupied { .. }))
        ));
        assert_eq!(ledger.has_item(&farmer(), Category::Seed, "arroz").ok(), Some(true));
    }

    #[test]
    fn fertilizer_adds_bonus_and_is_consumed() {
        let mut ledger = ledger_with(&[
            (Category::Seed, "arroz"),
            (Category::Machine, "pacote3"),
            (Category::Fertilizer, "fertilizante-premium"),
        ]);
        let harvest = plant(
            &mut ledger,
            &farmer(),
            &order("arroz", "pacote3", Some("fertilizante-premium"), None),
        );
        assert_eq!(
            harvest.ok(),
            Some(Harvest {
                productivity: 320,
                pollution: 20
            })
        );
        assert_eq!(
            ledger.has_item(&farmer(), Category::Fertilizer, "fertilizante-premium").ok(),
            Some(false)
        );
    }

    #[test]
    fn pesticide_multiplies_yield_and_halves_pollution_with_sprayer() {
        let mut ledger = ledger_with(&[
            (Category::Seed, "soja"),
            (Category::Machine, "pacote2"),
            (Category::Machine, SPRAYER),
            (Category::Fertilizer, "fertilizante-comum"),
            (Category::Pesticide, "agrotoxico-premium"),
        ]);
        let harvest = plant(
            &mut ledger,
            &farmer(),
            &order(
                "soja",
                "pacote2",
                Some("fertilizante-comum"),
                Some("agrotoxico-premium"),
            ),
        );
        // (50 + 60 + 50 + 500) * 3 and (30 + 150) / 2
        assert_eq!(
            harvest.ok(),
            Some(Harvest {
                productivity: 1980,
                pollution: 90
            })
        );
        let totals = ledger
            .account(&farmer())
            .map(|a| (a.total_yield, a.total_pollution));
        assert_eq!(totals.ok(), Some((1980, 90)));
    }

    #[test]
    fn pesticide_without_sprayer_fails_without_consuming() {
        let mut ledger = ledger_with(&[
            (Category::Seed, "soja"),
            (Category::Machine, "pacote1"),
            (Category::Pesticide, "agrotoxico-comum"),
        ]);
        let result = plant(
            &mut ledger,
            &farmer(),
            &order("soja", "pacote1", None, Some("agrotoxico-comum")),
        );
        assert!(matches!(result, Err(MarketError::SprayerRequired { .. })));
        assert_eq!(ledger.has_item(&farmer(), Category::Seed, "soja").ok(), Some(true));
        assert_eq!(ledger.parcel(&farmer(), "P1").ok(), Some(&ParcelState::Empty));
    }

    #[test]
    fn missing_machine_named_in_error() {
        let mut ledger = ledger_with(&[(Category::Seed, "hortalica")]);
        let result = plant(&mut ledger, &farmer(), &order("hortalica", "pacote2", None, None));
        assert!(matches!(
            result,
            Err(MarketError::MissingInput { input, category: Category::Machine, .. }) if input == "pacote2"
        ));
    }

    #[test]
    fn foreign_parcel_rejected() {
        let mut ledger = ledger_with(&[(Category::Seed, "soja"), (Category::Machine, "pacote1")]);
        let mut foreign = order("soja", "pacote1", None, None);
        foreign.parcel = "P7".to_owned();
        let result = plant(&mut ledger, &farmer(), &foreign);
        assert!(matches!(
            result,
            Err(MarketError::Ledger(LedgerError::ParcelNotFound { .. }))
        ));
    }

    #[test]
    fn unknown_names_use_fallbacks() {
        let harvest = score(&order("milho", "trator", None, Some("veneno")), false);
        // (50 + 0) * 1, 15 + 50 without halving
        assert_eq!(
            harvest.ok(),
            Some(Harvest {
                productivity: 50,
                pollution: 65
            })
        );
    }
}
