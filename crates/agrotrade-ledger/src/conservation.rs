//! Cash conservation checks for the ledger.
//!
//! Settlements only move cash from the paying party to the receiving
//! party, so for a whole run the check is:
//!
//! ```text
//! sum(balances now) == sum(balances at start)
//! ```
//!
//! The check holds by construction when every settlement debits and
//! credits the same amount. A violation produces a [`LedgerAnomaly`].

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use agrotrade_types::PartyId;

use crate::ledger::Account;
use crate::LedgerAnomaly;

/// The result of a conservation check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConservationResult {
    /// Total cash matches the expected total.
    Balanced,
    /// Cash was created or destroyed, or a balance went negative.
    Anomaly(LedgerAnomaly),
}

/// Verify that the summed balances of `accounts` equal `expected_total`.
pub fn verify_conservation<'a>(
    expected_total: Decimal,
    accounts: impl IntoIterator<Item = &'a Account>,
) -> ConservationResult {
    let mut actual_total = Decimal::ZERO;
    for account in accounts {
        actual_total = match actual_total.checked_add(account.balance) {
            Some(sum) => sum,
            None => {
                return ConservationResult::Anomaly(LedgerAnomaly {
                    expected_total,
                    actual_total,
                    message: "LEDGER_ANOMALY: arithmetic overflow while summing balances"
                        .to_owned(),
                });
            }
        };
    }

    if actual_total == expected_total {
        ConservationResult::Balanced
    } else {
        ConservationResult::Anomaly(LedgerAnomaly {
            expected_total,
            actual_total,
            message: format!(
                "LEDGER_ANOMALY: total cash is {actual_total}, expected {expected_total}"
            ),
        })
    }
}

/// Verify conservation, then check that no balance or stock is negative.
pub fn verify_conservation_strict(
    expected_total: Decimal,
    accounts: &BTreeMap<PartyId, Account>,
) -> ConservationResult {
    let result = verify_conservation(expected_total, accounts.values());
    let ConservationResult::Balanced = result else {
        return result;
    };

    let negative: Vec<&str> = accounts
        .iter()
        .filter(|(_, account)| {
            (account.balance.is_sign_negative() && !account.balance.is_zero())
                || account
                    .stock
                    .values()
                    .any(|qty| qty.is_sign_negative() && !qty.is_zero())
        })
        .map(|(party, _)| party.as_str())
        .collect();

    if negative.is_empty() {
        ConservationResult::Balanced
    } else {
        ConservationResult::Anomaly(LedgerAnomaly {
            expected_total,
            actual_total: expected_total,
            message: format!(
                "LEDGER_ANOMALY: negative holdings for {}",
                negative.join(", ")
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn empty_set_balances_at_zero() {
        let result = verify_conservation(Decimal::ZERO, core::iter::empty());
        assert_eq!(result, ConservationResult::Balanced);
    }

    #[test]
    fn matching_total_is_balanced() {
        let accounts = [Account::new(dec!(500)), Account::new(dec!(9500))];
        assert_eq!(
            verify_conservation(dec!(10000), accounts.iter()),
            ConservationResult::Balanced
        );
    }

    #[test]
    fn created_cash_is_an_anomaly() {
        let accounts = [Account::new(dec!(10000)), Account::new(dec!(9500))];
        let result = verify_conservation(dec!(10000), accounts.iter());
        assert!(matches!(
            &result,
            ConservationResult::Anomaly(anomaly)
                if anomaly.actual_total == dec!(19500) && anomaly.message.contains("LEDGER_ANOMALY")
        ));
    }

    #[test]
    fn strict_flags_negative_balance() {
        let mut accounts = BTreeMap::new();
        accounts.insert(PartyId::from("Empresario"), Account::new(dec!(-5)));
        accounts.insert(PartyId::from("Fz1"), Account::new(dec!(5)));
        let result = verify_conservation_strict(Decimal::ZERO, &accounts);
        assert!(matches!(
            &result,
            ConservationResult::Anomaly(anomaly) if anomaly.message.contains("Empresario")
        ));
    }

    #[test]
    fn strict_flags_negative_stock() {
        let mut accounts = BTreeMap::new();
        accounts.insert(
            PartyId::from("Fz2"),
            Account::new(Decimal::ZERO).with_stock("Soja", dec!(-1)),
        );
        let result = verify_conservation_strict(Decimal::ZERO, &accounts);
        assert!(matches!(result, ConservationResult::Anomaly(_)));
    }

    #[test]
    fn anomaly_display_shows_message() {
        let anomaly = LedgerAnomaly {
            expected_total: dec!(1),
            actual_total: dec!(2),
            message: "LEDGER_ANOMALY: test display".to_owned(),
        };
        assert!(anomaly.to_string().contains("test display"));
    }
}
