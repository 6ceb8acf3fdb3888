// 10.0: every state change is forwarded to a shared relay for off-process
// monitoring. the relay must not fail silently: a failed relay call aborts
// the batch that produced the events, so monitoring gaps are visible.

use crate::conditional::CancelReason;
use crate::oracle::PriceSource;
use crate::types::{Address, Bps, MarketId, OrderId, Price, Quote, SignedSize, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub account: Address,
    pub timestamp: Timestamp,
    pub payload: EventPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    // collateral events
    Deposit(DepositEvent),
    Withdrawal(WithdrawalEvent),
    NativeWithdrawal(NativeWithdrawalEvent),
    CollateralSwapped(CollateralSwappedEvent),

    // identity events
    OwnershipTransferred(OwnershipTransferredEvent),
    DelegateAdded(DelegateAddedEvent),
    DelegateRemoved(DelegateRemovedEvent),

    // conditional order lifecycle
    ConditionalOrderPlaced(ConditionalOrderPlacedEvent),
    ConditionalOrderFilled(ConditionalOrderFilledEvent),
    ConditionalOrderCancelled(ConditionalOrderCancelledEvent),

    // fees
    FeeImposed(FeeImposedEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositEvent {
    pub from: Address,
    pub amount: Quote,
    pub new_balance: Quote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalEvent {
    pub to: Address,
    pub amount: Quote,
    pub new_balance: Quote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NativeWithdrawalEvent {
    pub to: Address,
    pub amount: Quote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollateralSwappedEvent {
    pub amount_in: Quote,
    pub amount_out: Quote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnershipTransferredEvent {
    pub old_owner: Address,
    pub new_owner: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegateAddedEvent {
    pub delegate: Address,
    pub fee: Bps,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegateRemovedEvent {
    pub delegate: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionalOrderPlacedEvent {
    pub order_id: OrderId,
    pub market: MarketId,
    pub margin_delta: Quote,
    pub size_delta: SignedSize,
    pub target_price: Price,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionalOrderFilledEvent {
    pub order_id: OrderId,
    pub market: MarketId,
    pub fill_price: Price,
    pub price_source: PriceSource,
    pub keeper_fee: Quote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionalOrderCancelledEvent {
    pub order_id: OrderId,
    pub market: MarketId,
    pub reason: CancelReason,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeImposedEvent {
    pub market: MarketId,
    pub fee: Quote,
    pub from_free_margin: Quote,
    pub from_position_margin: Quote,
    pub treasury: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    #[error("event relay unavailable")]
    Unavailable,
}

/// Shared relay port. Fire and forget, but failures surface to the caller.
pub trait EventRelay {
    fn relay(&mut self, event: Event) -> Result<(), RelayError>;
}

/// Recording relay for tests and the simulation binary.
#[derive(Debug)]
pub struct RecordingRelay {
    events: Vec<Event>,
    healthy: bool,
}

impl Default for RecordingRelay {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingRelay {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            healthy: true,
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn set_healthy(&mut self, healthy: bool) {
        self.healthy = healthy;
    }
}

impl EventRelay for RecordingRelay {
    fn relay(&mut self, event: Event) -> Result<(), RelayError> {
        if !self.healthy {
            return Err(RelayError::Unavailable);
        }
        self.events.push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn deposit_event(id: u64) -> Event {
        Event {
            id: EventId(id),
            account: Address(100),
            timestamp: Timestamp::from_millis(1000),
            payload: EventPayload::Deposit(DepositEvent {
                from: Address(1),
                amount: Quote::new(dec!(10000)),
                new_balance: Quote::new(dec!(10000)),
            }),
        }
    }

    #[test]
    fn recording_relay_collects() {
        let mut relay = RecordingRelay::new();
        relay.relay(deposit_event(1)).unwrap();
        assert_eq!(relay.events().len(), 1);

        relay.clear();
        assert!(relay.events().is_empty());
    }

    #[test]
    fn unhealthy_relay_fails_loudly() {
        let mut relay = RecordingRelay::new();
        relay.set_healthy(false);
        assert_eq!(relay.relay(deposit_event(1)), Err(RelayError::Unavailable));
    }

    #[test]
    fn events_serialize() {
        let event = deposit_event(7);
        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, event.id);
    }
}
