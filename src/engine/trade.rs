//! Venue trading handlers and fee imposition.
//!
//! Handlers follow one shape: validate, call the venue, account for the
//! result, then impose the order-flow fee on qualifying trades. A venue
//! rejection anywhere propagates unchanged and no fee is charged.

use super::core::MarginAccount;
use super::results::AccountError;
use crate::events::{EventPayload, FeeImposedEvent};
use crate::fees::{compute_fee, plan_draw};
use crate::types::{MarketId, Price, Quote, SignedSize};
use tracing::debug;

impl MarginAccount {
    /// Move free margin into (positive) or out of (negative) a market.
    pub(super) fn perp_modify_margin(
        &mut self,
        market: MarketId,
        delta: Quote,
    ) -> Result<(), AccountError> {
        if delta.is_zero() {
            return Err(AccountError::InvalidParameter {
                reason: "venue margin delta must be nonzero".to_string(),
            });
        }

        if delta.is_negative() {
            self.venue.borrow_mut().modify_margin(market, delta)?;
            self.ledger.deposit(delta.abs())?;
        } else {
            self.ledger.withdraw(delta)?;
            self.venue.borrow_mut().modify_margin(market, delta)?;
        }
        Ok(())
    }

    pub(super) fn perp_withdraw_all_margin(&mut self, market: MarketId) -> Result<(), AccountError> {
        let freed = self.venue.borrow_mut().withdraw_all_margin(market)?;
        if !freed.is_zero() {
            self.ledger.deposit(freed)?;
        }
        Ok(())
    }

    pub(super) fn perp_submit_atomic_order(
        &mut self,
        market: MarketId,
        size_delta: SignedSize,
        desired_fill_price: Price,
    ) -> Result<(), AccountError> {
        self.venue
            .borrow_mut()
            .submit_atomic_order(market, size_delta, desired_fill_price)?;

        let quote = self.resolve_market_price(market)?;
        self.impose_trade_fee(market, size_delta, quote.price)
    }

    pub(super) fn perp_submit_delayed_order(
        &mut self,
        market: MarketId,
        size_delta: SignedSize,
        desired_fill_price: Price,
        offchain: bool,
    ) -> Result<(), AccountError> {
        self.venue
            .borrow_mut()
            .submit_delayed_order(market, size_delta, desired_fill_price, offchain)?;

        // delayed-type orders price the fee off the caller's fill bound
        // instead of resolving a fresh oracle price
        self.impose_trade_fee(market, size_delta, desired_fill_price)
    }

    pub(super) fn perp_cancel_delayed_order(
        &mut self,
        market: MarketId,
        offchain: bool,
    ) -> Result<(), AccountError> {
        Ok(self.venue.borrow_mut().cancel_delayed_order(market, offchain)?)
    }

    pub(super) fn perp_close_position(
        &mut self,
        market: MarketId,
        desired_fill_price: Price,
    ) -> Result<(), AccountError> {
        let position = self.venue.borrow().position(market)?;
        self.venue
            .borrow_mut()
            .close_position(market, desired_fill_price)?;

        let quote = self.resolve_market_price(market)?;
        self.impose_trade_fee(market, position.size, quote.price)
    }

    pub(super) fn perp_submit_close_delayed_order(
        &mut self,
        market: MarketId,
        desired_fill_price: Price,
        offchain: bool,
    ) -> Result<(), AccountError> {
        let position = self.venue.borrow().position(market)?;
        if position.size.is_zero() {
            return Err(AccountError::Venue(crate::venue::VenueError::NoPosition(
                market,
            )));
        }

        self.venue.borrow_mut().submit_delayed_order(
            market,
            position.size.negate(),
            desired_fill_price,
            offchain,
        )?;
        self.impose_trade_fee(market, position.size, desired_fill_price)
    }

    /// Compute and collect the order-flow fee for a qualifying trade: free
    /// margin first, then the venue-side position margin for any shortfall.
    /// A zero fee is a complete no-op.
    pub(super) fn impose_trade_fee(
        &mut self,
        market: MarketId,
        size: SignedSize,
        price: Price,
    ) -> Result<(), AccountError> {
        let (rate, max_fee, treasury) = {
            let config = self.config.borrow();
            (config.fee_rate, config.max_fee, config.treasury)
        };

        let fee = compute_fee(size, price, rate, max_fee);
        if fee.is_zero() {
            return Ok(());
        }

        let draw = plan_draw(fee, self.ledger.free_margin());
        if !draw.from_free_margin.is_zero() {
            self.ledger.withdraw(draw.from_free_margin)?;
        }
        if !draw.from_position_margin.is_zero() {
            // the venue's own solvency checks are the backstop here: if the
            // reduction would leave the position unsafe, the whole batch fails
            // and the snapshot restore undoes the free-margin debit above
            self.venue
                .borrow_mut()
                .modify_margin(market, draw.from_position_margin.negate())?;
        }

        debug!(?market, %fee, "fee imposed");
        self.push_event(EventPayload::FeeImposed(FeeImposedEvent {
            market,
            fee,
            from_free_margin: draw.from_free_margin,
            from_position_margin: draw.from_position_margin,
            treasury,
        }));
        Ok(())
    }
}
