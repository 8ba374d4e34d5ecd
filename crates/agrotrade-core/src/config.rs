//! Scenario configuration loaded from YAML.
//!
//! A scenario file names the central party, the counterparties with their
//! starting holdings, optional catalog overrides and the negotiation
//! limits. Every field has a default; an empty file yields the commodity
//! scenario with three farmers.
//!
//! ```yaml
//! scenario: commodity
//! central:
//!   id: Empresario
//!   balance: 10000
//! counterparties:
//!   - id: Fz1
//!     stock: { Soja: 500 }
//! negotiation:
//!   max_iterations: 10
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

use agrotrade_ledger::{Account, Ledger, LedgerError};
use agrotrade_market::{Catalog, Market};
use agrotrade_types::{Category, CatalogEntry, PartyId, Role, Scenario};

use crate::decision::TurnPolicy;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configured parties could not be opened in the ledger.
    #[error("invalid party setup: {0}")]
    Ledger(#[from] LedgerError),
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

// ---------------------------------------------------------------------------
// Top level
// ---------------------------------------------------------------------------

/// Top-level scenario configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulationConfig {
    /// Which economic setup to run.
    #[serde(default = "default_scenario")]
    pub scenario: Scenario,

    /// The central party.
    #[serde(default = "default_central")]
    pub central: PartyConfig,

    /// Counterparties, negotiated with in this order.
    #[serde(default = "default_counterparties")]
    pub counterparties: Vec<PartyConfig>,

    /// Entries added to or replacing the scenario's default catalog.
    #[serde(default)]
    pub catalog: Vec<CatalogEntry>,

    /// Turn loop limits.
    #[serde(default)]
    pub negotiation: NegotiationConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            scenario: default_scenario(),
            central: default_central(),
            counterparties: default_counterparties(),
            catalog: Vec::new(),
            negotiation: NegotiationConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }

    /// Build the market: ledger with every account, plus the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Ledger`] if a party id is used twice.
    pub fn build_market(&self) -> Result<Market, ConfigError> {
        let mut ledger = Ledger::new(self.central.id.clone(), self.central.account());
        for party in &self.counterparties {
            ledger.open_account(party.id.clone(), party.account())?;
        }
        let catalog = self
            .catalog
            .iter()
            .cloned()
            .fold(Catalog::for_scenario(self.scenario), Catalog::with_entry);
        Ok(Market::new(self.scenario, catalog, ledger))
    }

    /// The turn policy in effect for this scenario.
    pub fn turn_policy(&self) -> TurnPolicy {
        self.negotiation.policy_for(self.scenario)
    }
}

// ---------------------------------------------------------------------------
// Parties
// ---------------------------------------------------------------------------

/// Starting state of one party.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PartyConfig {
    /// Party name.
    pub id: PartyId,

    /// Starting cash.
    #[serde(default)]
    pub balance: Decimal,

    /// Starting commodity stock.
    #[serde(default)]
    pub stock: BTreeMap<String, Decimal>,

    /// Parcels owned, all starting empty.
    #[serde(default)]
    pub parcels: Vec<String>,

    /// Starting inventory by category.
    #[serde(default)]
    pub inventory: BTreeMap<Category, Vec<String>>,
}

impl PartyConfig {
    /// A party holding only cash.
    pub fn new(id: &str, balance: Decimal) -> Self {
        Self {
            id: PartyId::from(id),
            balance,
            stock: BTreeMap::new(),
            parcels: Vec::new(),
            inventory: BTreeMap::new(),
        }
    }

    /// The ledger account this party starts with.
    pub fn account(&self) -> Account {
        let account = self
            .stock
            .iter()
            .fold(Account::new(self.balance), |acc, (good, qty)| {
                acc.with_stock(good.clone(), *qty)
            });
        let account = self
            .parcels
            .iter()
            .fold(account, |acc, parcel| acc.with_parcel(parcel.clone()));
        self.inventory.iter().fold(account, |acc, (category, items)| {
            items
                .iter()
                .fold(acc, |acc, item| acc.with_item(*category, item.clone()))
        })
    }
}

// ---------------------------------------------------------------------------
// Negotiation limits
// ---------------------------------------------------------------------------

/// Limits and ordering rules of the turn loop.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NegotiationConfig {
    /// Turns allowed per negotiation before it is cut off.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Who speaks first in every negotiation.
    #[serde(default = "default_opening_speaker")]
    pub opening_speaker: Role,

    /// Speaker selection when no offer is live. Defaults by scenario.
    #[serde(default)]
    pub turn_policy: Option<TurnPolicy>,

    /// Negotiator faults in a row tolerated before aborting a negotiation.
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,

    /// Bound on each negotiator call. `None` waits indefinitely.
    #[serde(default = "default_turn_timeout_ms")]
    pub turn_timeout_ms: Option<u64>,
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            opening_speaker: default_opening_speaker(),
            turn_policy: None,
            max_consecutive_failures: default_max_consecutive_failures(),
            turn_timeout_ms: default_turn_timeout_ms(),
        }
    }
}

impl NegotiationConfig {
    /// The configured turn policy, or the scenario's default.
    pub fn policy_for(&self, scenario: Scenario) -> TurnPolicy {
        self.turn_policy
            .unwrap_or_else(|| TurnPolicy::default_for(scenario))
    }

    /// The per-turn timeout as a [`Duration`].
    pub fn turn_timeout(&self) -> Option<Duration> {
        self.turn_timeout_ms.map(Duration::from_millis)
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_scenario() -> Scenario {
    Scenario::Commodity
}

fn default_central() -> PartyConfig {
    PartyConfig::new("Empresario", Decimal::new(10_000, 0))
}

fn default_counterparties() -> Vec<PartyConfig> {
    [("Fz1", 500), ("Fz2", 700), ("Fz3", 300)]
        .into_iter()
        .map(|(id, kg)| {
            let mut party = PartyConfig::new(id, Decimal::ZERO);
            party.stock.insert("Soja".to_owned(), Decimal::from(kg));
            party
        })
        .collect()
}

const fn default_max_iterations() -> u32 {
    10
}

const fn default_opening_speaker() -> Role {
    Role::Central
}

const fn default_max_consecutive_failures() -> u32 {
    3
}

#[allow(clippy::unnecessary_wraps)]
const fn default_turn_timeout_ms() -> Option<u64> {
    Some(120_000)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn empty_yaml_is_commodity_default() {
        let config = SimulationConfig::parse("");
        assert!(matches!(&config, Ok(c) if *c == SimulationConfig::default()));
        if let Ok(config) = config {
            assert_eq!(config.scenario, Scenario::Commodity);
            assert_eq!(config.central.balance, dec!(10000));
            let ids: Vec<&str> = config.counterparties.iter().map(|p| p.id.as_str()).collect();
            assert_eq!(ids, ["Fz1", "Fz2", "Fz3"]);
            assert_eq!(config.negotiation.max_iterations, 10);
            assert_eq!(config.turn_policy(), TurnPolicy::Alternate);
        }
    }

    #[test]
    fn parses_inputs_scenario() {
        let yaml = r"
scenario: inputs
central:
  id: Empresario
counterparties:
  - id: Agricultor1
    balance: 1000
    parcels: [P1, P2]
    inventory:
      seed: [soja]
catalog:
  - item: pacote1
    category: machine
    reference_price: 35
negotiation:
  max_consecutive_failures: 2
  turn_timeout_ms: null
";
        let config = SimulationConfig::parse(yaml);
        assert!(config.is_ok());
        let Ok(config) = config else { return };
        assert_eq!(config.turn_policy(), TurnPolicy::OfferDriven);
        assert_eq!(config.negotiation.max_consecutive_failures, 2);
        assert!(config.negotiation.turn_timeout().is_none());
        assert_eq!(config.central.balance, Decimal::ZERO);

        let market = config.build_market();
        assert!(market.is_ok());
        let Ok(market) = market else { return };
        let farmer = PartyId::from("Agricultor1");
        assert_eq!(market.ledger().get_balance(&farmer).ok(), Some(dec!(1000)));
        assert_eq!(market.ledger().has_item(&farmer, Category::Seed, "soja").ok(), Some(true));
        assert!(market.ledger().parcel(&farmer, "P2").is_ok());
        assert!(matches!(
            market.catalog().get("pacote1"),
            Ok(entry) if entry.reference_price == dec!(35)
        ));
    }

    #[test]
    fn duplicate_party_rejected() {
        let mut config = SimulationConfig::default();
        config.counterparties.push(PartyConfig::new("Fz1", Decimal::ZERO));
        assert!(matches!(config.build_market(), Err(ConfigError::Ledger(_))));
    }

    #[test]
    fn shipped_scenarios_build() {
        for yaml in [
            include_str!("../../../config/commodity.yaml"),
            include_str!("../../../config/inputs.yaml"),
        ] {
            let config = SimulationConfig::parse(yaml);
            assert!(config.is_ok());
            if let Ok(config) = config {
                assert!(config.build_market().is_ok());
            }
        }
    }

    #[test]
    fn invalid_yaml_reports_error() {
        let result = SimulationConfig::parse("scenario: [unclosed");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }
}
