//! The static item catalog.
//!
//! Each scenario starts from a default catalog; configuration may override
//! prices or add items before the run starts. The catalog is immutable for
//! the rest of the run.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use agrotrade_types::{Category, CatalogEntry, Scenario};

use crate::error::MarketError;

// ---------------------------------------------------------------------------
// Default contents
// ---------------------------------------------------------------------------

/// Item name of the sprayer machine required for pesticide.
pub const SPRAYER: &str = "pulverizador";

/// Default commodity catalog: (item, category, price per kg in cents).
const COMMODITY_ITEMS: &[(&str, Category, i64)] = &[("Soja", Category::Commodity, 1_500)];

/// Default input catalog: (item, category, unit price in cents).
const INPUT_ITEMS: &[(&str, Category, i64)] = &[
    ("soja", Category::Seed, 3_000),
    ("arroz", Category::Seed, 2_000),
    ("hortalica", Category::Seed, 1_000),
    ("fertilizante-comum", Category::Fertilizer, 3_000),
    ("fertilizante-premium", Category::Fertilizer, 6_000),
    ("fertilizante-super-premium", Category::Fertilizer, 9_000),
    ("agrotoxico-comum", Category::Pesticide, 3_000),
    ("agrotoxico-premium", Category::Pesticide, 6_000),
    ("agrotoxico-super-premium", Category::Pesticide, 9_000),
    ("pacote1", Category::Machine, 3_000),
    ("pacote2", Category::Machine, 6_000),
    ("pacote3", Category::Machine, 9_000),
    (SPRAYER, Category::Machine, 40_000),
];

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Mapping from item name to its category and reference price.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: BTreeMap<String, CatalogEntry>,
}

impl Catalog {
    /// Create an empty catalog.
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// The default catalog for a scenario.
    pub fn for_scenario(scenario: Scenario) -> Self {
        let items = match scenario {
            Scenario::Commodity => COMMODITY_ITEMS,
            Scenario::Inputs => INPUT_ITEMS,
        };
        items
            .iter()
            .map(|&(item, category, cents)| CatalogEntry {
                item: item.to_owned(),
                category,
                reference_price: Decimal::new(cents, 2),
            })
            .fold(Self::new(), Self::with_entry)
    }

    /// Add an entry, replacing any entry with the same item name.
    #[must_use]
    pub fn with_entry(mut self, entry: CatalogEntry) -> Self {
        self.insert(entry);
        self
    }

    /// Add an entry, replacing any entry with the same item name.
    pub fn insert(&mut self, entry: CatalogEntry) {
        self.entries.insert(entry.item.clone(), entry);
    }

    /// Look up an item.
    ///
    /// An exact name match wins; otherwise the first ASCII case-insensitive
    /// match is returned, so `"SOJA"` resolves to `"Soja"` when only that
    /// spelling exists.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::UnknownItem`] if nothing matches.
    pub fn get(&self, item: &str) -> Result<&CatalogEntry, MarketError> {
        self.entries
            .get(item)
            .or_else(|| {
                self.entries
                    .values()
                    .find(|entry| entry.item.eq_ignore_ascii_case(item))
            })
            .ok_or_else(|| MarketError::UnknownItem(item.to_owned()))
    }

    /// Iterate over entries in item-name order.
    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn input_catalog_has_reference_prices() {
        let catalog = Catalog::for_scenario(Scenario::Inputs);
        assert_eq!(catalog.len(), 13);
        let sprayer = catalog.get(SPRAYER);
        assert!(matches!(
            sprayer,
            Ok(entry) if entry.category == Category::Machine && entry.reference_price == dec!(400)
        ));
        let premium = catalog.get("fertilizante-premium");
        assert!(matches!(premium, Ok(entry) if entry.reference_price == dec!(60)));
    }

    #[test]
    fn commodity_catalog_holds_soja() {
        let catalog = Catalog::for_scenario(Scenario::Commodity);
        assert!(matches!(
            catalog.get("Soja"),
            Ok(entry) if entry.category == Category::Commodity && entry.reference_price == dec!(15)
        ));
    }

    #[test]
    fn lookup_falls_back_to_case_insensitive_match() {
        let catalog = Catalog::for_scenario(Scenario::Commodity);
        assert!(matches!(catalog.get("soja"), Ok(entry) if entry.item == "Soja"));
    }

    #[test]
    fn unknown_item_rejected() {
        let catalog = Catalog::for_scenario(Scenario::Inputs);
        assert!(matches!(catalog.get("trator"), Err(MarketError::UnknownItem(_))));
    }

    #[test]
    fn override_replaces_price() {
        let catalog = Catalog::for_scenario(Scenario::Inputs).with_entry(CatalogEntry {
            item: "pacote1".to_owned(),
            category: Category::Machine,
            reference_price: dec!(45),
        });
        assert_eq!(catalog.len(), 13);
        assert!(matches!(catalog.get("pacote1"), Ok(entry) if entry.reference_price == dec!(45)));
    }
}
