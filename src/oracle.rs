// Price resolution for fee-relevant trades.
//
// Two sources: a primary external feed publishing (price, publish-time), and
// the venue's own asset price as fallback. The primary wins while its publish
// time sits inside the freshness window and its price is positive; otherwise
// the venue price is used and tagged as such. Resolution happens once per
// fee-relevant trade and is never cached.

use crate::types::{MarketId, Price, Timestamp};
use crate::venue::PerpsVenue;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A primary-feed observation: raw price plus when the source published it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeedUpdate {
    pub price: Decimal,
    pub publish_time: Timestamp,
}

impl FeedUpdate {
    pub fn new(price: Decimal, publish_time: Timestamp) -> Self {
        Self { price, publish_time }
    }

    pub fn is_fresh(&self, now: Timestamp, freshness_window_ms: i64) -> bool {
        let age = self.publish_time.age_millis(now);
        age >= 0 && age <= freshness_window_ms
    }
}

/// Which source a resolved price came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceSource {
    Primary,
    Fallback,
}

impl std::fmt::Display for PriceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriceSource::Primary => write!(f, "primary"),
            PriceSource::Fallback => write!(f, "fallback"),
        }
    }
}

impl std::error::Error for PriceSource {}

/// A resolved settlement price. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub price: Price,
    pub source: PriceSource,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    #[error("no valid price for market {market:?} from {source:?}")]
    InvalidPrice { market: MarketId, source: PriceSource },
}

/// Primary external price feed. Implementations may be backed by any oracle
/// network; the resolver only cares about (price, publish-time).
pub trait PriceFeed {
    fn latest(&self, market: MarketId) -> Option<FeedUpdate>;
}

/// Resolve a settlement price for `market`, preferring the primary feed.
pub fn resolve_price(
    feed: &dyn PriceFeed,
    venue: &dyn PerpsVenue,
    market: MarketId,
    now: Timestamp,
    freshness_window_ms: i64,
) -> Result<PriceQuote, OracleError> {
    if let Some(update) = feed.latest(market) {
        if update.is_fresh(now, freshness_window_ms) && update.price > Decimal::ZERO {
            let price = Price::new(update.price).ok_or(OracleError::InvalidPrice {
                market,
                source: PriceSource::Primary,
            })?;
            return Ok(PriceQuote {
                price,
                source: PriceSource::Primary,
            });
        }
    }

    let price = venue
        .asset_price(market)
        .map_err(|_| OracleError::InvalidPrice {
            market,
            source: PriceSource::Fallback,
        })?;
    Ok(PriceQuote {
        price,
        source: PriceSource::Fallback,
    })
}

/// Mock feed for tests and the simulation binary.
pub struct MockPriceFeed {
    updates: std::collections::HashMap<MarketId, FeedUpdate>,
    healthy: bool,
}

impl MockPriceFeed {
    pub fn new() -> Self {
        Self {
            updates: std::collections::HashMap::new(),
            healthy: true,
        }
    }

    pub fn set_update(&mut self, market: MarketId, price: Decimal, publish_time: Timestamp) {
        self.updates.insert(market, FeedUpdate::new(price, publish_time));
    }

    pub fn set_healthy(&mut self, healthy: bool) {
        self.healthy = healthy;
    }
}

impl Default for MockPriceFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl PriceFeed for MockPriceFeed {
    fn latest(&self, market: MarketId) -> Option<FeedUpdate> {
        if self.healthy {
            self.updates.get(&market).copied()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::venue::SimVenue;
    use rust_decimal_macros::dec;

    const BTC: MarketId = MarketId(1);
    const WINDOW: i64 = 60_000;

    fn venue_at(price: Decimal) -> SimVenue {
        let mut v = SimVenue::new();
        v.add_market(BTC, Price::new_unchecked(price));
        v
    }

    #[test]
    fn fresh_primary_wins() {
        let mut feed = MockPriceFeed::new();
        feed.set_update(BTC, dec!(50000), Timestamp::from_millis(10_000));
        let venue = venue_at(dec!(49000));

        let quote =
            resolve_price(&feed, &venue, BTC, Timestamp::from_millis(40_000), WINDOW).unwrap();
        assert_eq!(quote.source, PriceSource::Primary);
        assert_eq!(quote.price.value(), dec!(50000));
    }

    #[test]
    fn stale_primary_falls_back() {
        let mut feed = MockPriceFeed::new();
        feed.set_update(BTC, dec!(50000), Timestamp::from_millis(10_000));
        let venue = venue_at(dec!(49000));

        // 90s after publish, past the 60s window
        let quote =
            resolve_price(&feed, &venue, BTC, Timestamp::from_millis(100_000), WINDOW).unwrap();
        assert_eq!(quote.source, PriceSource::Fallback);
        assert_eq!(quote.price.value(), dec!(49000));
    }

    #[test]
    fn zero_primary_price_falls_back() {
        let mut feed = MockPriceFeed::new();
        feed.set_update(BTC, dec!(0), Timestamp::from_millis(10_000));
        let venue = venue_at(dec!(49000));

        let quote =
            resolve_price(&feed, &venue, BTC, Timestamp::from_millis(11_000), WINDOW).unwrap();
        assert_eq!(quote.source, PriceSource::Fallback);
    }

    #[test]
    fn missing_feed_falls_back() {
        let mut feed = MockPriceFeed::new();
        feed.set_healthy(false);
        let venue = venue_at(dec!(49000));

        let quote =
            resolve_price(&feed, &venue, BTC, Timestamp::from_millis(11_000), WINDOW).unwrap();
        assert_eq!(quote.source, PriceSource::Fallback);
    }

    #[test]
    fn both_sources_invalid_fails() {
        let mut feed = MockPriceFeed::new();
        feed.set_healthy(false);
        let mut venue = venue_at(dec!(49000));
        venue.set_asset_price(BTC, None);

        let result = resolve_price(&feed, &venue, BTC, Timestamp::from_millis(11_000), WINDOW);
        assert_eq!(
            result,
            Err(OracleError::InvalidPrice {
                market: BTC,
                source: PriceSource::Fallback
            })
        );
    }

    #[test]
    fn freshness_window_boundary() {
        let update = FeedUpdate::new(dec!(1), Timestamp::from_millis(1_000));
        assert!(update.is_fresh(Timestamp::from_millis(61_000), WINDOW));
        assert!(!update.is_fresh(Timestamp::from_millis(61_001), WINDOW));
        // publish time in the future is not fresh
        assert!(!update.is_fresh(Timestamp::from_millis(500), WINDOW));
    }
}
