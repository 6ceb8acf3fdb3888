//! Margin ledger: total collateral vs. committed margin.
//!
//! `committed` is a logical reservation against pending conditional orders,
//! not a transferred amount. Free margin is what deposits, withdrawals, venue
//! transfers, and fees may draw on; the invariant `committed <= balance`
//! holds at every observable point.

use crate::types::Quote;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarginLedger {
    balance: Quote,
    committed: Quote,
}

impl Default for MarginLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MarginLedger {
    pub fn new() -> Self {
        Self {
            balance: Quote::zero(),
            committed: Quote::zero(),
        }
    }

    pub fn balance(&self) -> Quote {
        self.balance
    }

    pub fn committed(&self) -> Quote {
        self.committed
    }

    pub fn free_margin(&self) -> Quote {
        self.balance.sub(self.committed)
    }

    pub fn deposit(&mut self, amount: Quote) -> Result<(), LedgerError> {
        if amount.is_negative() || amount.is_zero() {
            return Err(LedgerError::NonPositiveAmount(amount));
        }
        self.balance = self.balance.add(amount);
        Ok(())
    }

    /// Withdrawals draw on free margin only; collateral reserved for pending
    /// conditional orders stays put.
    pub fn withdraw(&mut self, amount: Quote) -> Result<(), LedgerError> {
        if amount.is_negative() || amount.is_zero() {
            return Err(LedgerError::NonPositiveAmount(amount));
        }
        if amount > self.free_margin() {
            return Err(LedgerError::InsufficientFreeMargin {
                requested: amount,
                available: self.free_margin(),
            });
        }
        self.balance = self.balance.sub(amount);
        Ok(())
    }

    /// Reserve free margin against a conditional order.
    pub fn commit(&mut self, amount: Quote) -> Result<(), LedgerError> {
        if amount.is_negative() {
            return Err(LedgerError::NonPositiveAmount(amount));
        }
        if amount > self.free_margin() {
            return Err(LedgerError::InsufficientFreeMargin {
                requested: amount,
                available: self.free_margin(),
            });
        }
        self.committed = self.committed.add(amount);
        Ok(())
    }

    /// Release a reservation. The order registry guarantees a single release
    /// per order; the ledger does not deduplicate.
    pub fn release(&mut self, amount: Quote) {
        debug_assert!(amount <= self.committed, "release exceeds committed margin");
        let next = self.committed.sub(amount);
        self.committed = if next.is_negative() { Quote::zero() } else { next };
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(Quote),

    #[error("insufficient free margin: requested {requested}, available {available}")]
    InsufficientFreeMargin { requested: Quote, available: Quote },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn funded() -> MarginLedger {
        let mut ledger = MarginLedger::new();
        ledger.deposit(Quote::new(dec!(10000))).unwrap();
        ledger
    }

    #[test]
    fn deposit_withdraw() {
        let mut ledger = funded();
        assert_eq!(ledger.balance().value(), dec!(10000));

        ledger.withdraw(Quote::new(dec!(3000))).unwrap();
        assert_eq!(ledger.balance().value(), dec!(7000));
        assert_eq!(ledger.free_margin().value(), dec!(7000));
    }

    #[test]
    fn rejects_non_positive_amounts() {
        let mut ledger = funded();
        assert!(matches!(
            ledger.deposit(Quote::zero()),
            Err(LedgerError::NonPositiveAmount(_))
        ));
        assert!(matches!(
            ledger.withdraw(Quote::new(dec!(-5))),
            Err(LedgerError::NonPositiveAmount(_))
        ));
    }

    #[test]
    fn commit_reserves_free_margin() {
        let mut ledger = funded();
        ledger.commit(Quote::new(dec!(4000))).unwrap();

        assert_eq!(ledger.balance().value(), dec!(10000));
        assert_eq!(ledger.committed().value(), dec!(4000));
        assert_eq!(ledger.free_margin().value(), dec!(6000));
    }

    #[test]
    fn commit_fails_beyond_free_margin() {
        let mut ledger = funded();
        ledger.commit(Quote::new(dec!(8000))).unwrap();

        let result = ledger.commit(Quote::new(dec!(3000)));
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientFreeMargin { .. })
        ));
    }

    #[test]
    fn withdraw_cannot_touch_committed() {
        let mut ledger = funded();
        ledger.commit(Quote::new(dec!(8000))).unwrap();

        let result = ledger.withdraw(Quote::new(dec!(5000)));
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientFreeMargin { .. })
        ));

        ledger.withdraw(Quote::new(dec!(2000))).unwrap();
        assert_eq!(ledger.balance().value(), dec!(8000));
    }

    #[test]
    fn release_restores_free_margin() {
        let mut ledger = funded();
        ledger.commit(Quote::new(dec!(4000))).unwrap();
        ledger.release(Quote::new(dec!(4000)));

        assert_eq!(ledger.committed().value(), dec!(0));
        assert_eq!(ledger.free_margin().value(), dec!(10000));
    }
}
