// Collateral exchange boundary for the owner-only swap command. Different
// implementations can model an on-chain AMM route, an RFQ desk, or a CEX
// conversion; the account only sees amount-in -> amount-out.

use crate::types::Quote;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExchangeError {
    #[error("swap output {actual} below minimum {minimum}")]
    SlippageExceeded { actual: Quote, minimum: Quote },

    #[error("exchange unavailable")]
    Unavailable,
}

pub trait CollateralExchange {
    /// Swap `amount_in` of the account's collateral, failing if the output
    /// would land under `min_amount_out`.
    fn swap(&mut self, amount_in: Quote, min_amount_out: Quote) -> Result<Quote, ExchangeError>;
}

/// Fixed-rate exchange for tests and the simulation binary.
#[derive(Debug, Clone)]
pub struct MockExchange {
    rate: Decimal,
    healthy: bool,
}

impl MockExchange {
    pub fn new(rate: Decimal) -> Self {
        Self { rate, healthy: true }
    }

    pub fn at_par() -> Self {
        Self::new(dec!(1))
    }

    pub fn set_rate(&mut self, rate: Decimal) {
        self.rate = rate;
    }

    pub fn set_healthy(&mut self, healthy: bool) {
        self.healthy = healthy;
    }
}

impl CollateralExchange for MockExchange {
    fn swap(&mut self, amount_in: Quote, min_amount_out: Quote) -> Result<Quote, ExchangeError> {
        if !self.healthy {
            return Err(ExchangeError::Unavailable);
        }
        let out = amount_in.mul(self.rate);
        if out < min_amount_out {
            return Err(ExchangeError::SlippageExceeded {
                actual: out,
                minimum: min_amount_out,
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn swap_at_rate() {
        let mut exchange = MockExchange::new(dec!(0.99));
        let out = exchange
            .swap(Quote::new(dec!(1000)), Quote::new(dec!(980)))
            .unwrap();
        assert_eq!(out.value(), dec!(990));
    }

    #[test]
    fn swap_slippage_bound() {
        let mut exchange = MockExchange::new(dec!(0.9));
        let result = exchange.swap(Quote::new(dec!(1000)), Quote::new(dec!(950)));
        assert!(matches!(result, Err(ExchangeError::SlippageExceeded { .. })));
    }
}
