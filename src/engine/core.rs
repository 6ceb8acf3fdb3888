// 8.1: MarginAccount struct and its account-local state. all command
// execution lives in dispatch.rs; this file holds construction, the clock,
// the event buffer, and the snapshot machinery that backs batch atomicity.

use super::lock::ReentrancyLock;
use super::results::AccountError;
use crate::auth::AuthorizationGate;
use crate::conditional::ConditionalOrderRegistry;
use crate::config::SystemConfig;
use crate::events::{DepositEvent, Event, EventId, EventPayload, EventRelay};
use crate::exchange::CollateralExchange;
use crate::keeper::KeeperGateway;
use crate::ledger::MarginLedger;
use crate::oracle::{resolve_price, PriceFeed, PriceQuote};
use crate::registry::AccountRegistry;
use crate::types::{Address, MarketId, Quote, Timestamp};
use crate::venue::PerpsVenue;
use std::cell::RefCell;
use std::rc::Rc;

/// Handles to the external collaborators the account composes calls into.
/// Shared (`Rc<RefCell<_>>`) so tests and the simulation keep their own
/// handle for inspection.
pub struct Collaborators {
    pub config: Rc<RefCell<SystemConfig>>,
    pub venue: Rc<RefCell<dyn PerpsVenue>>,
    pub relay: Rc<RefCell<dyn EventRelay>>,
    pub keeper: Rc<RefCell<dyn KeeperGateway>>,
    pub feed: Rc<RefCell<dyn PriceFeed>>,
    pub registry: Rc<RefCell<dyn AccountRegistry>>,
    pub exchange: Rc<RefCell<dyn CollateralExchange>>,
}

pub struct MarginAccount {
    address: Address,
    pub(super) auth: AuthorizationGate,
    pub(super) ledger: MarginLedger,
    pub(super) orders: ConditionalOrderRegistry,

    pub(super) config: Rc<RefCell<SystemConfig>>,
    pub(super) venue: Rc<RefCell<dyn PerpsVenue>>,
    relay: Rc<RefCell<dyn EventRelay>>,
    pub(super) keeper: Rc<RefCell<dyn KeeperGateway>>,
    feed: Rc<RefCell<dyn PriceFeed>>,
    registry: Rc<RefCell<dyn AccountRegistry>>,
    pub(super) exchange: Rc<RefCell<dyn CollateralExchange>>,

    pub(super) lock: Rc<ReentrancyLock>,
    pub(super) pending_events: Vec<EventPayload>,
    pub(super) pending_ownership: Option<(Address, Address)>,
    next_event_id: u64,
    now: Timestamp,
}

/// Account-local state captured at batch entry and restored on abort.
pub(super) struct Snapshot {
    auth: AuthorizationGate,
    ledger: MarginLedger,
    orders: ConditionalOrderRegistry,
    next_event_id: u64,
}

impl MarginAccount {
    pub fn new(
        address: Address,
        owner: Address,
        collaborators: Collaborators,
    ) -> Result<Self, AccountError> {
        if owner.is_zero() {
            return Err(AccountError::InvalidParameter {
                reason: "owner address must be nonzero".to_string(),
            });
        }

        let Collaborators {
            config,
            venue,
            relay,
            keeper,
            feed,
            registry,
            exchange,
        } = collaborators;

        registry.borrow_mut().register(address, owner);

        Ok(Self {
            address,
            auth: AuthorizationGate::new(owner),
            ledger: MarginLedger::new(),
            orders: ConditionalOrderRegistry::new(),
            config,
            venue,
            relay,
            keeper,
            feed,
            registry,
            exchange,
            lock: ReentrancyLock::new(),
            pending_events: Vec::new(),
            pending_ownership: None,
            next_event_id: 1,
            now: Timestamp::from_millis(0),
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.auth.owner()
    }

    pub fn auth(&self) -> &AuthorizationGate {
        &self.auth
    }

    pub fn balance(&self) -> Quote {
        self.ledger.balance()
    }

    pub fn committed_margin(&self) -> Quote {
        self.ledger.committed()
    }

    pub fn free_margin(&self) -> Quote {
        self.ledger.free_margin()
    }

    pub fn conditional_orders(&self) -> &ConditionalOrderRegistry {
        &self.orders
    }

    /// The execution lock handle. Venue callbacks consult it to detect an
    /// in-flight batch instead of discovering reentrancy the hard way.
    pub fn execution_lock(&self) -> Rc<ReentrancyLock> {
        Rc::clone(&self.lock)
    }

    pub fn set_time(&mut self, timestamp: Timestamp) {
        self.now = timestamp;
    }

    pub fn time(&self) -> Timestamp {
        self.now
    }

    pub fn advance_time(&mut self, millis: i64) {
        self.now = Timestamp::from_millis(self.now.as_millis() + millis);
    }

    /// Top up collateral. Unrestricted by caller; anyone may fund the account.
    pub fn deposit(&mut self, from: Address, amount: Quote) -> Result<(), AccountError> {
        let _guard =
            ReentrancyLock::acquire(&self.lock).map_err(|_| AccountError::Reentrancy)?;

        let before = self.ledger.clone();
        self.ledger.deposit(amount)?;
        let new_balance = self.ledger.balance();

        self.push_event(EventPayload::Deposit(DepositEvent {
            from,
            amount,
            new_balance,
        }));
        if let Err(e) = self.flush_events() {
            self.ledger = before;
            self.pending_events.clear();
            return Err(e);
        }
        Ok(())
    }

    /// Resolve a settlement price for `market` at the account's clock.
    pub(super) fn resolve_market_price(
        &self,
        market: MarketId,
    ) -> Result<PriceQuote, AccountError> {
        let feed = self.feed.borrow();
        let venue = self.venue.borrow();
        let window = self.config.borrow().oracle_freshness_ms;
        Ok(resolve_price(&*feed, &*venue, market, self.now, window)?)
    }

    pub(super) fn push_event(&mut self, payload: EventPayload) {
        self.pending_events.push(payload);
    }

    /// Commit phase: notify the registry of any ownership change, then drain
    /// the buffered events into the relay. A relay failure propagates so the
    /// caller can roll the batch back.
    pub(super) fn flush_events(&mut self) -> Result<(), AccountError> {
        if let Some((old_owner, new_owner)) = self.pending_ownership.take() {
            self.registry
                .borrow_mut()
                .ownership_transferred(self.address, old_owner, new_owner);
        }

        let pending = std::mem::take(&mut self.pending_events);
        for payload in pending {
            let event = Event {
                id: EventId(self.next_event_id),
                account: self.address,
                timestamp: self.now,
                payload,
            };
            self.next_event_id += 1;
            self.relay.borrow_mut().relay(event)?;
        }
        Ok(())
    }

    pub(super) fn snapshot(&self) -> Snapshot {
        Snapshot {
            auth: self.auth.clone(),
            ledger: self.ledger.clone(),
            orders: self.orders.clone(),
            next_event_id: self.next_event_id,
        }
    }

    pub(super) fn restore(&mut self, snapshot: Snapshot) {
        self.auth = snapshot.auth;
        self.ledger = snapshot.ledger;
        self.orders = snapshot.orders;
        self.next_event_id = snapshot.next_event_id;
        self.pending_events.clear();
        self.pending_ownership = None;
    }
}
