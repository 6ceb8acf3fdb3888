//! Conditional order lifecycle: place, cancel, and keeper-driven fill.
//!
//! The registry's absent -> placed -> terminal transitions are what guarantee
//! each order's reservation is released exactly once. Fill order matters:
//! release before forwarding, so committed and spent margin never overlap.

use super::core::MarginAccount;
use super::results::AccountError;
use crate::conditional::{CancelReason, ConditionalKind, ConditionalOrder};
use crate::events::{
    ConditionalOrderCancelledEvent, ConditionalOrderFilledEvent, ConditionalOrderPlacedEvent,
    EventPayload,
};
use crate::types::{Address, MarketId, OrderId, Price, Quote, SignedSize};
use tracing::debug;

impl MarginAccount {
    #[allow(clippy::too_many_arguments)]
    pub(super) fn conditional_order_place(
        &mut self,
        market: MarketId,
        margin_delta: Quote,
        size_delta: SignedSize,
        target_price: Price,
        kind: ConditionalKind,
        desired_fill_price: Price,
        reduce_only: bool,
    ) -> Result<(), AccountError> {
        if size_delta.is_zero() {
            return Err(AccountError::ZeroSizeOrder);
        }
        if margin_delta.is_negative() {
            return Err(AccountError::InvalidParameter {
                reason: "conditional margin delta must not be negative".to_string(),
            });
        }

        self.ledger.commit(margin_delta)?;

        let id = self.orders.next_id();
        let task = self.keeper.borrow_mut().create_task(id)?;
        self.orders.insert(ConditionalOrder {
            id,
            market,
            margin_delta,
            size_delta,
            target_price,
            kind,
            desired_fill_price,
            reduce_only,
            task,
            placed_at: self.time(),
        });

        debug!(order = ?id, ?market, "conditional order placed");
        self.push_event(EventPayload::ConditionalOrderPlaced(
            ConditionalOrderPlacedEvent {
                order_id: id,
                market,
                margin_delta,
                size_delta,
                target_price,
            },
        ));
        Ok(())
    }

    pub(super) fn conditional_order_cancel(&mut self, id: OrderId) -> Result<(), AccountError> {
        let order = self.orders.remove(id).ok_or(AccountError::OrderNotFound(id))?;
        self.retire_order(&order, CancelReason::UserRequested)
    }

    /// Keeper-driven fill, reached from the public execution entry point.
    pub(super) fn fill_conditional_order(
        &mut self,
        caller: Address,
        id: OrderId,
    ) -> Result<(), AccountError> {
        if caller != self.keeper.borrow().executor() {
            return Err(AccountError::NotKeeper(caller));
        }

        let order = self
            .orders
            .get(id)
            .cloned()
            .ok_or(AccountError::OrderNotFound(id))?;

        // never trust the keeper's claim: re-verify against a fresh price
        let quote = self.resolve_market_price(order.market)?;
        if !order.can_execute_at(quote.price) {
            return Err(AccountError::TriggerNotMet {
                id,
                price: quote.price,
            });
        }

        let mut size_delta = order.size_delta;
        if order.reduce_only {
            let position = self.venue.borrow().position(order.market)?;
            if position.size.is_zero() || position.size.is_long() == size_delta.is_long() {
                // the keeper's pre-check failed: cancel instead of filling
                let order = self
                    .orders
                    .remove(id)
                    .ok_or(AccountError::OrderNotFound(id))?;
                return self.retire_order(&order, CancelReason::ReduceOnlyInvalid);
            }
            if size_delta.abs() > position.size.abs() {
                size_delta = position.size.negate();
            }
        }

        // terminal transition first, then release, then forward
        let order = self
            .orders
            .remove(id)
            .ok_or(AccountError::OrderNotFound(id))?;
        self.ledger.release(order.margin_delta);

        let keeper_fee = self.keeper.borrow().execution_fee();
        if !keeper_fee.is_zero() {
            self.ledger.withdraw(keeper_fee)?;
        }

        if !order.margin_delta.is_zero() {
            self.ledger.withdraw(order.margin_delta)?;
            self.venue
                .borrow_mut()
                .modify_margin(order.market, order.margin_delta)?;
        }
        self.venue.borrow_mut().submit_delayed_order(
            order.market,
            size_delta,
            order.desired_fill_price,
            true,
        )?;

        self.impose_trade_fee(order.market, size_delta, quote.price)?;
        self.keeper.borrow_mut().cancel_task(order.task)?;

        debug!(order = ?id, price = %quote.price, "conditional order filled");
        self.push_event(EventPayload::ConditionalOrderFilled(
            ConditionalOrderFilledEvent {
                order_id: id,
                market: order.market,
                fill_price: quote.price,
                price_source: quote.source,
                keeper_fee,
            },
        ));
        Ok(())
    }

    /// Shared cancellation path: release the reservation, drop the keeper
    /// task, record the reason.
    fn retire_order(
        &mut self,
        order: &ConditionalOrder,
        reason: CancelReason,
    ) -> Result<(), AccountError> {
        self.ledger.release(order.margin_delta);
        self.keeper.borrow_mut().cancel_task(order.task)?;

        debug!(order = ?order.id, ?reason, "conditional order cancelled");
        self.push_event(EventPayload::ConditionalOrderCancelled(
            ConditionalOrderCancelledEvent {
                order_id: order.id,
                market: order.market,
                reason,
            },
        ));
        Ok(())
    }
}
