//! Conditional orders: limit and stop entries executed later by a keeper.
//!
//! Orders are stored outside the venue and only reach it when their trigger
//! condition holds. Placing one reserves its margin delta from free margin;
//! the reservation is released exactly once, on the single terminal
//! transition (fill or cancel).

use crate::keeper::TaskId;
use crate::types::{MarketId, OrderId, Price, Quote, SignedSize, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Limit buys below / sells above the target; stop does the opposite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionalKind {
    Limit,
    Stop,
}

/// Why a conditional order left the book without filling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancelReason {
    UserRequested,
    /// Keeper pre-check failed: reduce-only order no longer reduces a position.
    ReduceOnlyInvalid,
}

/// A placed conditional order waiting on its keeper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionalOrder {
    pub id: OrderId,
    pub market: MarketId,
    /// Collateral to move into the venue position when triggered. Reserved
    /// from free margin while the order is live.
    pub margin_delta: Quote,
    pub size_delta: SignedSize,
    pub target_price: Price,
    pub kind: ConditionalKind,
    /// Slippage bound forwarded to the venue on fill.
    pub desired_fill_price: Price,
    pub reduce_only: bool,
    /// Reference to the keeper task watching this order.
    pub task: TaskId,
    pub placed_at: Timestamp,
}

impl ConditionalOrder {
    /// Whether the trigger condition holds at `price`, respecting direction.
    pub fn can_execute_at(&self, price: Price) -> bool {
        let long = self.size_delta.is_long();
        match self.kind {
            // limit: enter long below target, short above
            ConditionalKind::Limit => {
                if long {
                    price <= self.target_price
                } else {
                    price >= self.target_price
                }
            }
            // stop: enter long above target, short below
            ConditionalKind::Stop => {
                if long {
                    price >= self.target_price
                } else {
                    price <= self.target_price
                }
            }
        }
    }
}

/// Order store. Ids are monotonically increasing and never reused; the
/// absent -> placed -> terminal transition is what guarantees single release
/// of each order's reservation.
#[derive(Debug, Clone, Default)]
pub struct ConditionalOrderRegistry {
    orders: HashMap<OrderId, ConditionalOrder>,
    next_id: u64,
}

impl ConditionalOrderRegistry {
    pub fn new() -> Self {
        Self {
            orders: HashMap::new(),
            next_id: 0,
        }
    }

    pub fn next_id(&mut self) -> OrderId {
        let id = OrderId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn insert(&mut self, order: ConditionalOrder) {
        self.orders.insert(order.id, order);
    }

    /// Remove an order, entering its terminal state. Returns `None` for a
    /// stale or already-resolved id, which callers must fail closed on.
    pub fn remove(&mut self, id: OrderId) -> Option<ConditionalOrder> {
        self.orders.remove(&id)
    }

    pub fn get(&self, id: OrderId) -> Option<&ConditionalOrder> {
        self.orders.get(&id)
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConditionalOrder> {
        self.orders.values()
    }

    /// Total margin currently reserved across live orders.
    pub fn total_committed(&self) -> Quote {
        self.orders.values().map(|o| o.margin_delta).sum()
    }
}
