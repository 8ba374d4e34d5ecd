//! The ledger: per-party accounts plus the append-only transaction log.
//!
//! # Design
//!
//! - **Owned state**: one [`Ledger`] per run, passed by reference.
//! - **Append-only log**: [`TransactionRecord`]s are never modified or removed.
//! - **Checked mutations**: every mutation validates before it writes, so a
//!   failed call leaves the ledger untouched.
//! - **Precision**: cash and stock use [`Decimal`] -- no floating point.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::debug;

use agrotrade_types::{Category, ParcelState, PartyId, TransactionRecord};

use crate::conservation::{verify_conservation, verify_conservation_strict, ConservationResult};
use crate::LedgerError;

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// Economic state of a single party.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Account {
    /// Cash balance.
    pub balance: Decimal,
    /// Commodity stock on hand, keyed by good.
    pub stock: BTreeMap<String, Decimal>,
    /// Discrete items owned, keyed by category. Duplicates are separate units.
    pub inventory: BTreeMap<Category, Vec<String>>,
    /// Land parcels owned and what is planted on them.
    pub parcels: BTreeMap<String, ParcelState>,
    /// Cumulative yield from planting.
    pub total_yield: u64,
    /// Cumulative pollution from planting.
    pub total_pollution: u64,
}

impl Account {
    /// Create an account holding only cash.
    pub fn new(balance: Decimal) -> Self {
        Self {
            balance,
            ..Self::default()
        }
    }

    /// Add commodity stock to a freshly created account.
    #[must_use]
    pub fn with_stock(mut self, good: impl Into<String>, quantity: Decimal) -> Self {
        self.stock.insert(good.into(), quantity);
        self
    }

    /// Add an empty parcel to a freshly created account.
    #[must_use]
    pub fn with_parcel(mut self, parcel: impl Into<String>) -> Self {
        self.parcels.insert(parcel.into(), ParcelState::Empty);
        self
    }

    /// Add one inventory unit to a freshly created account.
    #[must_use]
    pub fn with_item(mut self, category: Category, item: impl Into<String>) -> Self {
        self.inventory.entry(category).or_default().push(item.into());
        self
    }

    /// Whether the account holds at least one unit of `item` in `category`.
    pub fn holds(&self, category: Category, item: &str) -> bool {
        self.inventory
            .get(&category)
            .is_some_and(|items| items.iter().any(|held| held == item))
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// All mutable economic state of a simulation run.
///
/// The ledger knows which party is central; every other account is a
/// counterparty, enumerated in the order it was opened.
#[derive(Debug, Clone)]
pub struct Ledger {
    central: PartyId,
    accounts: BTreeMap<PartyId, Account>,
    /// Counterparties in the order their accounts were opened.
    counterparties: Vec<PartyId>,
    /// All settled transactions, in insertion order.
    transactions: Vec<TransactionRecord>,
}

impl Ledger {
    /// Create a ledger holding only the central party's account.
    pub fn new(central: PartyId, account: Account) -> Self {
        let mut accounts = BTreeMap::new();
        accounts.insert(central.clone(), account);
        Self {
            central,
            accounts,
            counterparties: Vec::new(),
            transactions: Vec::new(),
        }
    }

    /// Open a counterparty account.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::DuplicateParty`] if the party already exists.
    pub fn open_account(&mut self, party: PartyId, account: Account) -> Result<(), LedgerError> {
        if self.accounts.contains_key(&party) {
            return Err(LedgerError::DuplicateParty(party));
        }
        self.accounts.insert(party.clone(), account);
        self.counterparties.push(party);
        Ok(())
    }

    /// The central party.
    pub const fn central(&self) -> &PartyId {
        &self.central
    }

    /// Counterparties in their fixed enumeration order.
    pub fn counterparties(&self) -> &[PartyId] {
        &self.counterparties
    }

    /// Whether an account exists for the party.
    pub fn contains(&self, party: &PartyId) -> bool {
        self.accounts.contains_key(party)
    }

    /// Read-only view of a party's account.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UnknownParty`] if no account exists.
    pub fn account(&self, party: &PartyId) -> Result<&Account, LedgerError> {
        self.accounts
            .get(party)
            .ok_or_else(|| LedgerError::UnknownParty(party.clone()))
    }

    fn account_mut(&mut self, party: &PartyId) -> Result<&mut Account, LedgerError> {
        self.accounts
            .get_mut(party)
            .ok_or_else(|| LedgerError::UnknownParty(party.clone()))
    }

    // -----------------------------------------------------------------------
    // Cash
    // -----------------------------------------------------------------------

    /// Current cash balance of a party.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UnknownParty`] if no account exists.
    pub fn get_balance(&self, party: &PartyId) -> Result<Decimal, LedgerError> {
        Ok(self.account(party)?.balance)
    }

    /// Add cash to a party's balance and return the new balance.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NegativeAmount`] for negative amounts and
    /// [`LedgerError::UnknownParty`] if no account exists.
    pub fn credit(&mut self, party: &PartyId, amount: Decimal) -> Result<Decimal, LedgerError> {
        ensure_non_negative(amount)?;
        let account = self.account_mut(party)?;
        let updated = account
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::Overflow("credit"))?;
        account.balance = updated;
        debug!(party = %party, amount = %amount, balance = %updated, "credited");
        Ok(updated)
    }

    /// Remove cash from a party's balance and return the new balance.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InsufficientFunds`] if `amount` exceeds the
    /// balance, [`LedgerError::NegativeAmount`] for negative amounts and
    /// [`LedgerError::UnknownParty`] if no account exists.
    pub fn debit(&mut self, party: &PartyId, amount: Decimal) -> Result<Decimal, LedgerError> {
        ensure_non_negative(amount)?;
        let account = self.account_mut(party)?;
        if amount > account.balance {
            return Err(LedgerError::InsufficientFunds {
                party: party.clone(),
                requested: amount,
                available: account.balance,
            });
        }
        let updated = account
            .balance
            .checked_sub(amount)
            .ok_or(LedgerError::Overflow("debit"))?;
        account.balance = updated;
        debug!(party = %party, amount = %amount, balance = %updated, "debited");
        Ok(updated)
    }

    // -----------------------------------------------------------------------
    // Stock
    // -----------------------------------------------------------------------

    /// Quantity of a commodity a party holds (zero if never stocked).
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UnknownParty`] if no account exists.
    pub fn get_stock(&self, party: &PartyId, good: &str) -> Result<Decimal, LedgerError> {
        Ok(self
            .account(party)?
            .stock
            .get(good)
            .copied()
            .unwrap_or(Decimal::ZERO))
    }

    /// Apply a signed delta to a party's stock and return the new quantity.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InsufficientStock`] if the result would be
    /// negative and [`LedgerError::UnknownParty`] if no account exists.
    pub fn adjust_stock(
        &mut self,
        party: &PartyId,
        good: &str,
        delta: Decimal,
    ) -> Result<Decimal, LedgerError> {
        let account = self.account_mut(party)?;
        let current = account.stock.get(good).copied().unwrap_or(Decimal::ZERO);
        let updated = current
            .checked_add(delta)
            .ok_or(LedgerError::Overflow("adjust_stock"))?;
        if updated.is_sign_negative() && !updated.is_zero() {
            return Err(LedgerError::InsufficientStock {
                party: party.clone(),
                good: good.to_owned(),
                requested: delta.abs(),
                available: current,
            });
        }
        account.stock.insert(good.to_owned(), updated);
        debug!(party = %party, good, delta = %delta, stock = %updated, "stock adjusted");
        Ok(updated)
    }

    // -----------------------------------------------------------------------
    // Inventory
    // -----------------------------------------------------------------------

    /// Add one unit of `item` to a party's inventory.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UnknownParty`] if no account exists.
    pub fn add_to_inventory(
        &mut self,
        party: &PartyId,
        category: Category,
        item: &str,
    ) -> Result<(), LedgerError> {
        self.account_mut(party)?
            .inventory
            .entry(category)
            .or_default()
            .push(item.to_owned());
        debug!(party = %party, category = category.label(), item, "inventory item added");
        Ok(())
    }

    /// Remove exactly one unit of `item` from a party's inventory.
    ///
    /// Other units of the same item stay in place.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::ItemNotFound`] if the party holds no unit and
    /// [`LedgerError::UnknownParty`] if no account exists.
    pub fn remove_from_inventory(
        &mut self,
        party: &PartyId,
        category: Category,
        item: &str,
    ) -> Result<(), LedgerError> {
        let account = self.account_mut(party)?;
        let items = account.inventory.entry(category).or_default();
        let Some(position) = items.iter().position(|held| held == item) else {
            return Err(LedgerError::ItemNotFound {
                party: party.clone(),
                category,
                item: item.to_owned(),
            });
        };
        items.remove(position);
        debug!(party = %party, category = category.label(), item, "inventory item removed");
        Ok(())
    }

    /// Whether a party holds at least one unit of `item`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UnknownParty`] if no account exists.
    pub fn has_item(
        &self,
        party: &PartyId,
        category: Category,
        item: &str,
    ) -> Result<bool, LedgerError> {
        Ok(self.account(party)?.holds(category, item))
    }

    // -----------------------------------------------------------------------
    // Parcels and production
    // -----------------------------------------------------------------------

    /// Planting state of a parcel owned by a party.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::ParcelNotFound`] if the party does not own the
    /// parcel and [`LedgerError::UnknownParty`] if no account exists.
    pub fn parcel(&self, party: &PartyId, parcel: &str) -> Result<&ParcelState, LedgerError> {
        self.account(party)?
            .parcels
            .get(parcel)
            .ok_or_else(|| LedgerError::ParcelNotFound {
                party: party.clone(),
                parcel: parcel.to_owned(),
            })
    }

    /// Mark an empty parcel as planted with `seed`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::ParcelOccupied`] if something is already
    /// planted, [`LedgerError::ParcelNotFound`] if the party does not own
    /// the parcel and [`LedgerError::UnknownParty`] if no account exists.
    pub fn mark_planted(
        &mut self,
        party: &PartyId,
        parcel: &str,
        seed: &str,
    ) -> Result<(), LedgerError> {
        let account = self.account_mut(party)?;
        let state = account
            .parcels
            .get_mut(parcel)
            .ok_or_else(|| LedgerError::ParcelNotFound {
                party: party.clone(),
                parcel: parcel.to_owned(),
            })?;
        if let ParcelState::Planted(crop) = state {
            return Err(LedgerError::ParcelOccupied {
                party: party.clone(),
                parcel: parcel.to_owned(),
                crop: crop.clone(),
            });
        }
        *state = ParcelState::Planted(seed.to_owned());
        Ok(())
    }

    /// Accumulate yield and pollution onto a party's running totals.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Overflow`] on arithmetic overflow and
    /// [`LedgerError::UnknownParty`] if no account exists.
    pub fn record_production(
        &mut self,
        party: &PartyId,
        produced: u32,
        pollution: u32,
    ) -> Result<(), LedgerError> {
        let account = self.account_mut(party)?;
        let total_yield = account
            .total_yield
            .checked_add(u64::from(produced))
            .ok_or(LedgerError::Overflow("total_yield"))?;
        let total_pollution = account
            .total_pollution
            .checked_add(u64::from(pollution))
            .ok_or(LedgerError::Overflow("total_pollution"))?;
        account.total_yield = total_yield;
        account.total_pollution = total_pollution;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Transaction log
    // -----------------------------------------------------------------------

    /// Append a settled transaction to the log.
    pub fn append(&mut self, record: TransactionRecord) {
        self.transactions.push(record);
    }

    /// All settled transactions, in insertion order.
    pub fn transactions(&self) -> &[TransactionRecord] {
        &self.transactions
    }

    // -----------------------------------------------------------------------
    // Conservation
    // -----------------------------------------------------------------------

    /// Sum of every account's cash balance.
    pub fn total_balance(&self) -> Decimal {
        self.accounts
            .values()
            .fold(Decimal::ZERO, |acc, account| acc.saturating_add(account.balance))
    }

    /// Verify that total cash still equals `expected_total`.
    pub fn verify_conservation(&self, expected_total: Decimal) -> ConservationResult {
        verify_conservation(expected_total, self.accounts.values())
    }

    /// Verify conservation plus non-negative balances and stock.
    pub fn verify_conservation_strict(&self, expected_total: Decimal) -> ConservationResult {
        verify_conservation_strict(expected_total, &self.accounts)
    }

    /// Iterate over every account, central party included.
    pub fn accounts(&self) -> impl Iterator<Item = (&PartyId, &Account)> {
        self.accounts.iter()
    }
}

/// Reject negative monetary amounts.
fn ensure_non_negative(amount: Decimal) -> Result<(), LedgerError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(LedgerError::NegativeAmount { amount });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::TransactionBuilder;

    fn central() -> PartyId {
        PartyId::from("Empresario")
    }

    fn farmer() -> PartyId {
        PartyId::from("Fz1")
    }

    fn ledger() -> Ledger {
        let mut ledger = Ledger::new(central(), Account::new(dec!(10000)));
        let opened = ledger.open_account(
            farmer(),
            Account::new(Decimal::ZERO)
                .with_stock("Soja", dec!(500))
                .with_parcel("P1")
                .with_item(Category::Seed, "soja")
                .with_item(Category::Seed, "soja"),
        );
        assert!(opened.is_ok());
        ledger
    }

    #[test]
    fn counterparties_keep_opening_order() {
        let mut ledger = Ledger::new(central(), Account::new(Decimal::ZERO));
        for name in ["Fz3", "Fz1", "Fz2"] {
            assert!(ledger.open_account(PartyId::from(name), Account::default()).is_ok());
        }
        let names: Vec<&str> = ledger.counterparties().iter().map(PartyId::as_str).collect();
        assert_eq!(names, ["Fz3", "Fz1", "Fz2"]);
    }

    #[test]
    fn duplicate_account_rejected() {
        let mut ledger = ledger();
        let result = ledger.open_account(farmer(), Account::default());
        assert!(matches!(result, Err(LedgerError::DuplicateParty(_))));
        let result = ledger.open_account(central(), Account::default());
        assert!(matches!(result, Err(LedgerError::DuplicateParty(_))));
    }

    #[test]
    fn debit_beyond_balance_fails_without_mutation() {
        let mut ledger = ledger();
        let result = ledger.debit(&central(), dec!(10000.01));
        assert!(matches!(result, Err(LedgerError::InsufficientFunds { .. })));
        assert_eq!(ledger.get_balance(&central()).ok(), Some(dec!(10000)));
    }

    #[test]
    fn debit_of_exact_balance_leaves_zero() {
        let mut ledger = ledger();
        assert_eq!(ledger.debit(&central(), dec!(10000)).ok(), Some(Decimal::ZERO));
    }

    #[test]
    fn negative_credit_rejected() {
        let mut ledger = ledger();
        let result = ledger.credit(&farmer(), dec!(-1));
        assert!(matches!(result, Err(LedgerError::NegativeAmount { .. })));
    }

    #[test]
    fn unknown_party_reported() {
        let mut ledger = ledger();
        let ghost = PartyId::from("Fz9");
        assert!(matches!(ledger.get_balance(&ghost), Err(LedgerError::UnknownParty(_))));
        assert!(matches!(ledger.credit(&ghost, dec!(1)), Err(LedgerError::UnknownParty(_))));
    }

    #[test]
    fn stock_never_goes_negative() {
        let mut ledger = ledger();
        let result = ledger.adjust_stock(&farmer(), "Soja", dec!(-500.5));
        assert!(matches!(result, Err(LedgerError::InsufficientStock { .. })));
        assert_eq!(ledger.get_stock(&farmer(), "Soja").ok(), Some(dec!(500)));

        assert_eq!(
            ledger.adjust_stock(&farmer(), "Soja", dec!(-500)).ok(),
            Some(Decimal::ZERO)
        );
    }

    #[test]
    fn unstocked_good_reads_as_zero() {
        let ledger = ledger();
        assert_eq!(ledger.get_stock(&central(), "Soja").ok(), Some(Decimal::ZERO));
    }

    #[test]
    fn remove_from_inventory_takes_exactly_one_unit() {
        let mut ledger = ledger();
        assert!(ledger.remove_from_inventory(&farmer(), Category::Seed, "soja").is_ok());
        assert_eq!(ledger.has_item(&farmer(), Category::Seed, "soja").ok(), Some(true));
        assert!(ledger.remove_from_inventory(&farmer(), Category::Seed, "soja").is_ok());
        assert_eq!(ledger.has_item(&farmer(), Category::Seed, "soja").ok(), Some(false));

        let result = ledger.remove_from_inventory(&farmer(), Category::Seed, "soja");
        assert!(matches!(result, Err(LedgerError::ItemNotFound { .. })));
    }

    #[test]
    fn parcel_planting_is_one_way() {
        let mut ledger = ledger();
        assert!(ledger.mark_planted(&farmer(), "P1", "soja").is_ok());
        assert_eq!(
            ledger.parcel(&farmer(), "P1").ok(),
            Some(&ParcelState::Planted("soja".to_owned()))
        );
        let again = ledger.mark_planted(&farmer(), "P1", "arroz");
        assert!(matches!(again, Err(LedgerError::ParcelOccupied { .. })));
        let missing = ledger.mark_planted(&farmer(), "P9", "arroz");
        assert!(matches!(missing, Err(LedgerError::ParcelNotFound { .. })));
    }

    #[test]
    fn production_accumulates() {
        let mut ledger = ledger();
        assert!(ledger.record_production(&farmer(), 75, 30).is_ok());
        assert!(ledger.record_production(&farmer(), 110, 20).is_ok());
        let account = ledger.account(&farmer());
        assert_eq!(account.map(|a| (a.total_yield, a.total_pollution)).ok(), Some((185, 50)));
    }

    #[test]
    fn transfers_conserve_total_cash() {
        let mut ledger = ledger();
        let before = ledger.total_balance();
        assert!(ledger.debit(&central(), dec!(9500)).is_ok());
        assert!(ledger.credit(&farmer(), dec!(9500)).is_ok());
        assert_eq!(ledger.verify_conservation(before), ConservationResult::Balanced);
        assert_eq!(
            ledger.verify_conservation_strict(before),
            ConservationResult::Balanced
        );
    }

    #[test]
    fn appended_records_are_kept_in_order() {
        let mut ledger = ledger();
        for price in [dec!(10), dec!(20)] {
            let record = TransactionBuilder::new("Soja")
                .buyer(central())
                .seller(farmer())
                .quantity(dec!(1))
                .total_price(price)
                .build();
            assert!(record.is_ok());
            if let Ok(record) = record {
                ledger.append(record);
            }
        }
        let prices: Vec<Decimal> = ledger.transactions().iter().map(|r| r.total_price).collect();
        assert_eq!(prices, [dec!(10), dec!(20)]);
    }
}
