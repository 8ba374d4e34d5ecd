//! Transaction record builder and validation.
//!
//! Provides a [`TransactionBuilder`] that enforces the record invariants:
//! both parties named and distinct, a strictly positive quantity and a
//! non-negative total price. Builders validate inputs before producing a
//! [`TransactionRecord`].

use chrono::Utc;
use rust_decimal::Decimal;

use agrotrade_types::{PartyId, TransactionId, TransactionRecord};

use crate::LedgerError;

// ---------------------------------------------------------------------------
// Transaction builder
// ---------------------------------------------------------------------------

/// Builder for constructing validated [`TransactionRecord`] values.
///
/// # Examples
///
/// ```
/// use agrotrade_ledger::TransactionBuilder;
/// use agrotrade_types::PartyId;
/// use rust_decimal::Decimal;
///
/// let record = TransactionBuilder::new("Soja")
///     .buyer(PartyId::from("Empresario"))
///     .seller(PartyId::from("Fz1"))
///     .quantity(Decimal::new(500, 0))
///     .total_price(Decimal::new(9_500, 0))
///     .build();
///
/// assert!(record.is_ok());
/// ```
#[derive(Debug)]
pub struct TransactionBuilder {
    item: String,
    buyer: Option<PartyId>,
    seller: Option<PartyId>,
    quantity: Option<Decimal>,
    total_price: Option<Decimal>,
}

impl TransactionBuilder {
    /// Start building a record for the given catalog item.
    pub fn new(item: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            buyer: None,
            seller: None,
            quantity: None,
            total_price: None,
        }
    }

    /// Set the paying party.
    #[must_use]
    pub fn buyer(mut self, party: PartyId) -> Self {
        self.buyer = Some(party);
        self
    }

    /// Set the party receiving payment.
    #[must_use]
    pub fn seller(mut self, party: PartyId) -> Self {
        self.seller = Some(party);
        self
    }

    /// Set the traded quantity.
    #[must_use]
    pub const fn quantity(mut self, qty: Decimal) -> Self {
        self.quantity = Some(qty);
        self
    }

    /// Set the total price paid.
    #[must_use]
    pub const fn total_price(mut self, price: Decimal) -> Self {
        self.total_price = Some(price);
        self
    }

    /// Validate inputs and produce a [`TransactionRecord`].
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::MissingField`] if a required field is unset.
    /// Returns [`LedgerError::ZeroQuantity`] if the quantity is zero.
    /// Returns [`LedgerError::NegativeAmount`] if quantity or price is negative.
    /// Returns [`LedgerError::DuplicateParty`] if buyer and seller coincide.
    pub fn build(self) -> Result<TransactionRecord, LedgerError> {
        let buyer = self.buyer.ok_or(LedgerError::MissingField("buyer"))?;
        let seller = self.seller.ok_or(LedgerError::MissingField("seller"))?;
        let quantity = self.quantity.ok_or(LedgerError::MissingField("quantity"))?;
        let total_price = self
            .total_price
            .ok_or(LedgerError::MissingField("total_price"))?;

        if quantity.is_zero() {
            return Err(LedgerError::ZeroQuantity);
        }
        if quantity.is_sign_negative() {
            return Err(LedgerError::NegativeAmount { amount: quantity });
        }
        if total_price.is_sign_negative() {
            return Err(LedgerError::NegativeAmount {
                amount: total_price,
            });
        }
        if buyer == seller {
            return Err(LedgerError::DuplicateParty(buyer));
        }

        Ok(TransactionRecord {
            id: TransactionId::new(),
            buyer,
            seller,
            item: self.item,
            quantity,
            total_price,
            recorded_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn base() -> TransactionBuilder {
        TransactionBuilder::new("Soja")
            .buyer(PartyId::from("Empresario"))
            .seller(PartyId::from("Fz1"))
    }

    #[test]
    fn builder_produces_valid_record() {
        let result = base().quantity(dec!(500)).total_price(dec!(9500.00)).build();

        assert!(result.is_ok());
        if let Ok(record) = result {
            assert_eq!(record.item, "Soja");
            assert_eq!(record.buyer, PartyId::from("Empresario"));
            assert_eq!(record.seller, PartyId::from("Fz1"));
            assert_eq!(record.quantity, dec!(500));
            assert_eq!(record.total_price, dec!(9500.00));
        }
    }

    #[test]
    fn zero_quantity_rejected() {
        let result = base().quantity(Decimal::ZERO).total_price(dec!(10)).build();
        assert!(matches!(result, Err(LedgerError::ZeroQuantity)));
    }

    #[test]
    fn negative_quantity_rejected() {
        let result = base().quantity(dec!(-3)).total_price(dec!(10)).build();
        assert!(matches!(result, Err(LedgerError::NegativeAmount { .. })));
    }

    #[test]
    fn negative_price_rejected() {
        let result = base().quantity(dec!(3)).total_price(dec!(-10)).build();
        assert!(matches!(result, Err(LedgerError::NegativeAmount { .. })));
    }

    #[test]
    fn missing_price_rejected() {
        let result = base().quantity(dec!(3)).build();
        assert!(matches!(result, Err(LedgerError::MissingField("total_price"))));
    }

    #[test]
    fn self_trade_rejected() {
        let result = TransactionBuilder::new("Soja")
            .buyer(PartyId::from("Fz1"))
            .seller(PartyId::from("Fz1"))
            .quantity(dec!(1))
            .total_price(dec!(1))
            .build();
        assert!(matches!(result, Err(LedgerError::DuplicateParty(_))));
    }
}
