// Order-flow fee computation and the draw plan for collecting it.
//
// fee = |size * price| * rate, where rate is the configured bps clamped by the
// configuration-level cap. Collection draws free margin first; any shortfall
// is requested from the venue-side position margin, whose own solvency checks
// are the backstop. Committed margin is never eligible.

use crate::types::{Bps, Price, Quote, SignedSize};

/// Trade notional: |size| * price.
pub fn notional(size: SignedSize, price: Price) -> Quote {
    Quote::new(size.abs() * price.value())
}

/// Fee owed on a trade. The configured rate is clamped by `max_fee`.
pub fn compute_fee(size: SignedSize, price: Price, rate: Bps, max_fee: Bps) -> Quote {
    let effective = rate.min(max_fee);
    notional(size, price).mul(effective.as_fraction())
}

/// How a fee will be collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeDraw {
    /// Portion debited from the account's free margin.
    pub from_free_margin: Quote,
    /// Shortfall requested from the venue-side position margin.
    pub from_position_margin: Quote,
}

impl FeeDraw {
    pub fn total(&self) -> Quote {
        self.from_free_margin.add(self.from_position_margin)
    }
}

/// Split a fee across the two sources, free margin first.
pub fn plan_draw(fee: Quote, free_margin: Quote) -> FeeDraw {
    if free_margin >= fee {
        FeeDraw {
            from_free_margin: fee,
            from_position_margin: Quote::zero(),
        }
    } else {
        let from_free = if free_margin.is_negative() {
            Quote::zero()
        } else {
            free_margin
        };
        FeeDraw {
            from_free_margin: from_free,
            from_position_margin: fee.sub(from_free),
        }
    }
}
