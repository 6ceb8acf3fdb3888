//! External perpetuals venue boundary.
//!
//! The account composes calls to the venue and accounts for the result; all
//! trade-validity rules (min margin, leverage, liquidation) are the venue's
//! own and surface here as opaque errors. `SimVenue` is a deliberately small
//! stand-in used by the simulation binary and the test suites.

use crate::types::{MarketId, Price, Quote, SignedSize};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Venue-side view of one market position.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VenuePosition {
    pub margin: Quote,
    pub size: SignedSize,
}

impl VenuePosition {
    pub fn flat() -> Self {
        Self {
            margin: Quote::zero(),
            size: SignedSize::zero(),
        }
    }
}

/// A delayed order resting at the venue, waiting for its execution window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DelayedOrder {
    pub size_delta: SignedSize,
    pub desired_fill_price: Price,
    pub offchain: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VenueError {
    #[error("unknown market {0:?}")]
    UnknownMarket(MarketId),

    #[error("insufficient position margin in market {market:?}: requested {requested}, available {available}")]
    InsufficientMargin {
        market: MarketId,
        requested: Quote,
        available: Quote,
    },

    #[error("resulting margin below venue minimum for market {0:?}")]
    BelowMinimumMargin(MarketId),

    #[error("no position open in market {0:?}")]
    NoPosition(MarketId),

    #[error("no delayed order pending in market {0:?}")]
    NoDelayedOrder(MarketId),

    #[error("no price available for market {0:?}")]
    NoPrice(MarketId),
}

pub trait PerpsVenue {
    /// Move collateral into (positive) or out of (negative) a market position.
    fn modify_margin(&mut self, market: MarketId, delta: Quote) -> Result<(), VenueError>;

    /// Pull all position margin back to the account. Returns the amount freed.
    fn withdraw_all_margin(&mut self, market: MarketId) -> Result<Quote, VenueError>;

    fn submit_atomic_order(
        &mut self,
        market: MarketId,
        size_delta: SignedSize,
        desired_fill_price: Price,
    ) -> Result<(), VenueError>;

    fn submit_delayed_order(
        &mut self,
        market: MarketId,
        size_delta: SignedSize,
        desired_fill_price: Price,
        offchain: bool,
    ) -> Result<(), VenueError>;

    fn cancel_delayed_order(&mut self, market: MarketId, offchain: bool) -> Result<(), VenueError>;

    fn close_position(&mut self, market: MarketId, desired_fill_price: Price)
        -> Result<(), VenueError>;

    fn position(&self, market: MarketId) -> Result<VenuePosition, VenueError>;

    fn delayed_order(&self, market: MarketId) -> Result<Option<DelayedOrder>, VenueError>;

    /// The venue's own last-trade/asset price, used as the oracle fallback.
    fn asset_price(&self, market: MarketId) -> Result<Price, VenueError>;
}

/// In-memory venue with simplified solvency rules: position margin may never
/// go negative, and a market with an open position keeps at least
/// `min_margin_ratio` of notional as margin.
#[derive(Debug, Clone)]
pub struct SimVenue {
    markets: HashMap<MarketId, SimMarket>,
    min_margin_ratio: Decimal,
}

#[derive(Debug, Clone)]
struct SimMarket {
    position: VenuePosition,
    delayed: Option<DelayedOrder>,
    asset_price: Option<Price>,
}

impl SimVenue {
    pub fn new() -> Self {
        Self {
            markets: HashMap::new(),
            // 10% of notional, i.e. 10x max effective leverage
            min_margin_ratio: dec!(0.1),
        }
    }

    pub fn add_market(&mut self, market: MarketId, asset_price: Price) {
        self.markets.insert(
            market,
            SimMarket {
                position: VenuePosition::flat(),
                delayed: None,
                asset_price: Some(asset_price),
            },
        );
    }

    pub fn set_asset_price(&mut self, market: MarketId, price: Option<Price>) {
        if let Some(m) = self.markets.get_mut(&market) {
            m.asset_price = price;
        }
    }

    fn market(&self, market: MarketId) -> Result<&SimMarket, VenueError> {
        self.markets.get(&market).ok_or(VenueError::UnknownMarket(market))
    }

    fn market_mut(&mut self, market: MarketId) -> Result<&mut SimMarket, VenueError> {
        self.markets
            .get_mut(&market)
            .ok_or(VenueError::UnknownMarket(market))
    }

}

impl Default for SimVenue {
    fn default() -> Self {
        Self::new()
    }
}

impl PerpsVenue for SimVenue {
    fn modify_margin(&mut self, market: MarketId, delta: Quote) -> Result<(), VenueError> {
        let min_ratio = self.min_margin_ratio;
        let m = self.market_mut(market)?;

        let next = m.position.margin.add(delta);
        if next.is_negative() {
            return Err(VenueError::InsufficientMargin {
                market,
                requested: delta.abs(),
                available: m.position.margin,
            });
        }
        let required = match (m.position.size.is_zero(), m.asset_price) {
            (false, Some(price)) => {
                Quote::new(m.position.size.abs() * price.value() * min_ratio)
            }
            _ => Quote::zero(),
        };
        if next < required {
            return Err(VenueError::BelowMinimumMargin(market));
        }
        m.position.margin = next;
        Ok(())
    }

    fn withdraw_all_margin(&mut self, market: MarketId) -> Result<Quote, VenueError> {
        let m = self.market_mut(market)?;
        if !m.position.size.is_zero() {
            // margin backing an open position cannot be swept
            return Err(VenueError::BelowMinimumMargin(market));
        }
        let freed = m.position.margin;
        m.position.margin = Quote::zero();
        Ok(freed)
    }

    fn submit_atomic_order(
        &mut self,
        market: MarketId,
        size_delta: SignedSize,
        _desired_fill_price: Price,
    ) -> Result<(), VenueError> {
        let min_ratio = self.min_margin_ratio;
        let m = self.market_mut(market)?;

        let new_size = m.position.size.add(size_delta);
        let required = match (new_size.is_zero(), m.asset_price) {
            (false, Some(price)) => Quote::new(new_size.abs() * price.value() * min_ratio),
            _ => Quote::zero(),
        };
        if m.position.margin < required {
            return Err(VenueError::BelowMinimumMargin(market));
        }
        m.position.size = new_size;
        Ok(())
    }

    fn submit_delayed_order(
        &mut self,
        market: MarketId,
        size_delta: SignedSize,
        desired_fill_price: Price,
        offchain: bool,
    ) -> Result<(), VenueError> {
        let m = self.market_mut(market)?;
        m.delayed = Some(DelayedOrder {
            size_delta,
            desired_fill_price,
            offchain,
        });
        Ok(())
    }

    fn cancel_delayed_order(&mut self, market: MarketId, offchain: bool) -> Result<(), VenueError> {
        let m = self.market_mut(market)?;
        match m.delayed {
            Some(order) if order.offchain == offchain => {
                m.delayed = None;
                Ok(())
            }
            _ => Err(VenueError::NoDelayedOrder(market)),
        }
    }

    fn close_position(
        &mut self,
        market: MarketId,
        _desired_fill_price: Price,
    ) -> Result<(), VenueError> {
        let m = self.market_mut(market)?;
        if m.position.size.is_zero() {
            return Err(VenueError::NoPosition(market));
        }
        m.position.size = SignedSize::zero();
        Ok(())
    }

    fn position(&self, market: MarketId) -> Result<VenuePosition, VenueError> {
        Ok(self.market(market)?.position)
    }

    fn delayed_order(&self, market: MarketId) -> Result<Option<DelayedOrder>, VenueError> {
        Ok(self.market(market)?.delayed)
    }

    fn asset_price(&self, market: MarketId) -> Result<Price, VenueError> {
        self.market(market)?
            .asset_price
            .ok_or(VenueError::NoPrice(market))
    }
}
