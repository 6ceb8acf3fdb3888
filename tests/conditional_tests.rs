//! Conditional order lifecycle: placement reservations, keeper-gated
//! execution, trigger re-verification, reduce-only semantics, and single
//! release of committed margin.

use margin_core::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::cell::RefCell;
use std::rc::Rc;

const ACCOUNT: Address = Address(0xACC);
const OWNER: Address = Address(1);
const KEEPER: Address = Address(3);
const STRANGER: Address = Address(4);
const BTC: MarketId = MarketId(1);

struct Rig {
    account: MarginAccount,
    config: Rc<RefCell<SystemConfig>>,
    venue: Rc<RefCell<SimVenue>>,
    relay: Rc<RefCell<RecordingRelay>>,
    keeper: Rc<RefCell<MockKeeper>>,
    feed: Rc<RefCell<MockPriceFeed>>,
}

fn build_rig(keeper_fee: Decimal) -> Rig {
    let config = Rc::new(RefCell::new(SystemConfig::zero_fee()));
    let venue = Rc::new(RefCell::new(SimVenue::new()));
    let relay = Rc::new(RefCell::new(RecordingRelay::new()));
    let keeper = Rc::new(RefCell::new(MockKeeper::new(KEEPER, Quote::new(keeper_fee))));
    let feed = Rc::new(RefCell::new(MockPriceFeed::new()));
    let registry = Rc::new(RefCell::new(InMemoryRegistry::new()));
    let exchange = Rc::new(RefCell::new(MockExchange::at_par()));

    venue
        .borrow_mut()
        .add_market(BTC, Price::new_unchecked(dec!(50000)));
    feed.borrow_mut()
        .set_update(BTC, dec!(50000), Timestamp::from_millis(0));

    let account = MarginAccount::new(
        ACCOUNT,
        OWNER,
        Collaborators {
            config: Rc::clone(&config),
            venue: venue.clone(),
            relay: relay.clone(),
            keeper: keeper.clone(),
            feed: feed.clone(),
            registry,
            exchange,
        },
    )
    .unwrap();

    Rig {
        account,
        config,
        venue,
        relay,
        keeper,
        feed,
    }
}

fn rig() -> Rig {
    let mut r = build_rig(dec!(0));
    r.account.deposit(OWNER, Quote::new(dec!(20000))).unwrap();
    r
}

/// Place a non-reduce-only limit long and return its id. Ids are assigned
/// sequentially from zero, so the id equals the number of prior placements.
fn place_limit_long(r: &mut Rig, margin: Decimal, size: Decimal, target: Decimal) -> OrderId {
    let id = OrderId(
        r.relay
            .borrow()
            .events()
            .iter()
            .filter(|e| matches!(e.payload, EventPayload::ConditionalOrderPlaced(_)))
            .count() as u64,
    );
    r.account
        .execute(
            OWNER,
            &[Command::ConditionalOrderPlace {
                market: BTC,
                margin_delta: Quote::new(margin),
                size_delta: SignedSize::new(size),
                target_price: Price::new_unchecked(target),
                kind: ConditionalKind::Limit,
                desired_fill_price: Price::new_unchecked(target),
                reduce_only: false,
            }],
        )
        .unwrap();
    id
}

#[test]
fn place_reserves_margin_and_registers_task() {
    let mut r = rig();
    place_limit_long(&mut r, dec!(10000), dec!(1), dec!(48000));

    assert_eq!(r.account.committed_margin().value(), dec!(10000));
    assert_eq!(r.account.free_margin().value(), dec!(10000));
    assert_eq!(r.account.balance().value(), dec!(20000));
    assert_eq!(r.keeper.borrow().active_tasks(), 1);
    assert_eq!(r.account.conditional_orders().len(), 1);
}

#[test]
fn zero_size_order_rejected() {
    let mut r = rig();
    let result = r.account.execute(
        OWNER,
        &[Command::ConditionalOrderPlace {
            market: BTC,
            margin_delta: Quote::new(dec!(1000)),
            size_delta: SignedSize::zero(),
            target_price: Price::new_unchecked(dec!(48000)),
            kind: ConditionalKind::Limit,
            desired_fill_price: Price::new_unchecked(dec!(48000)),
            reduce_only: false,
        }],
    );
    assert!(matches!(result, Err(AccountError::ZeroSizeOrder)));
    assert!(r.account.conditional_orders().is_empty());
}

#[test]
fn place_beyond_free_margin_rejected() {
    let mut r = rig();
    place_limit_long(&mut r, dec!(15000), dec!(1), dec!(48000));

    let result = r.account.execute(
        OWNER,
        &[Command::ConditionalOrderPlace {
            market: BTC,
            margin_delta: Quote::new(dec!(10000)),
            size_delta: SignedSize::new(dec!(1)),
            target_price: Price::new_unchecked(dec!(48000)),
            kind: ConditionalKind::Limit,
            desired_fill_price: Price::new_unchecked(dec!(48000)),
            reduce_only: false,
        }],
    );
    assert!(matches!(
        result,
        Err(AccountError::Ledger(LedgerError::InsufficientFreeMargin { .. }))
    ));
    // the first reservation is untouched
    assert_eq!(r.account.committed_margin().value(), dec!(15000));
}

#[test]
fn cancel_releases_reservation_exactly_once() {
    let mut r = rig();
    let id = place_limit_long(&mut r, dec!(10000), dec!(1), dec!(48000));

    r.account
        .execute(OWNER, &[Command::ConditionalOrderCancel { id }])
        .unwrap();

    assert_eq!(r.account.committed_margin().value(), dec!(0));
    assert_eq!(r.keeper.borrow().active_tasks(), 0);
    assert!(r.account.conditional_orders().is_empty());

    // a second cancel of the same id fails closed
    let result = r
        .account
        .execute(OWNER, &[Command::ConditionalOrderCancel { id }]);
    assert!(matches!(result, Err(AccountError::OrderNotFound(_))));
    assert_eq!(r.account.committed_margin().value(), dec!(0));

    let relay = r.relay.borrow();
    let cancels = relay
        .events()
        .iter()
        .filter_map(|e| match &e.payload {
            EventPayload::ConditionalOrderCancelled(c) => Some(c.reason),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(cancels, vec![CancelReason::UserRequested]);
}

#[test]
fn only_registered_keeper_may_execute() {
    let mut r = rig();
    let id = place_limit_long(&mut r, dec!(10000), dec!(1), dec!(48000));

    r.feed
        .borrow_mut()
        .set_update(BTC, dec!(47000), Timestamp::from_millis(0));

    let result = r.account.execute_conditional_order(STRANGER, id);
    assert!(matches!(result, Err(AccountError::NotKeeper(STRANGER))));
    assert_eq!(r.account.conditional_orders().len(), 1);
}

#[test]
fn trigger_not_met_fails_closed() {
    let mut r = rig();
    let id = place_limit_long(&mut r, dec!(10000), dec!(1), dec!(48000));

    // price is above the limit target: no fill, no state change
    let result = r.account.execute_conditional_order(KEEPER, id);
    assert!(matches!(result, Err(AccountError::TriggerNotMet { .. })));
    assert_eq!(r.account.committed_margin().value(), dec!(10000));
    assert_eq!(r.account.conditional_orders().len(), 1);
    assert_eq!(r.keeper.borrow().active_tasks(), 1);
}

#[test]
fn fill_releases_forwards_and_deletes() {
    let mut r = rig();
    let id = place_limit_long(&mut r, dec!(10000), dec!(1), dec!(48000));

    r.feed
        .borrow_mut()
        .set_update(BTC, dec!(47500), Timestamp::from_millis(0));
    r.account.execute_conditional_order(KEEPER, id).unwrap();

    // reservation released, margin forwarded to the venue, record gone
    assert_eq!(r.account.committed_margin().value(), dec!(0));
    assert_eq!(r.account.balance().value(), dec!(10000));
    assert_eq!(
        r.venue.borrow().position(BTC).unwrap().margin.value(),
        dec!(10000)
    );
    assert!(r.account.conditional_orders().is_empty());
    assert_eq!(r.keeper.borrow().active_tasks(), 0);

    let delayed = r.venue.borrow().delayed_order(BTC).unwrap().unwrap();
    assert_eq!(delayed.size_delta.value(), dec!(1));
    assert_eq!(delayed.desired_fill_price.value(), dec!(48000));
    assert!(delayed.offchain);

    // a stale execution of the same id fails closed
    let result = r.account.execute_conditional_order(KEEPER, id);
    assert!(matches!(result, Err(AccountError::OrderNotFound(_))));
}

#[test]
fn exactly_one_terminal_notification_per_order() {
    let mut r = rig();
    let id = place_limit_long(&mut r, dec!(10000), dec!(1), dec!(48000));

    r.feed
        .borrow_mut()
        .set_update(BTC, dec!(47500), Timestamp::from_millis(0));
    r.account.execute_conditional_order(KEEPER, id).unwrap();
    let _ = r.account.execute_conditional_order(KEEPER, id);
    let _ = r
        .account
        .execute(OWNER, &[Command::ConditionalOrderCancel { id }]);

    let relay = r.relay.borrow();
    let terminal = relay
        .events()
        .iter()
        .filter(|e| {
            matches!(
                e.payload,
                EventPayload::ConditionalOrderFilled(_)
                    | EventPayload::ConditionalOrderCancelled(_)
            )
        })
        .count();
    assert_eq!(terminal, 1);
}

#[test]
fn keeper_fee_debited_on_fill() {
    let mut r = build_rig(dec!(25));
    r.account.deposit(OWNER, Quote::new(dec!(20000))).unwrap();
    let id = place_limit_long(&mut r, dec!(10000), dec!(1), dec!(48000));

    r.feed
        .borrow_mut()
        .set_update(BTC, dec!(47500), Timestamp::from_millis(0));
    r.account.execute_conditional_order(KEEPER, id).unwrap();

    // 20_000 - 10_000 forwarded - 25 keeper fee
    assert_eq!(r.account.balance().value(), dec!(9975));

    let relay = r.relay.borrow();
    let fill = relay
        .events()
        .iter()
        .find_map(|e| match &e.payload {
            EventPayload::ConditionalOrderFilled(f) => Some(f.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(fill.keeper_fee.value(), dec!(25));
    assert_eq!(fill.fill_price.value(), dec!(47500));
    assert_eq!(fill.price_source, PriceSource::Primary);
}

#[test]
fn fill_uses_fallback_price_when_feed_is_stale() {
    let mut r = rig();
    let id = place_limit_long(&mut r, dec!(10000), dec!(1), dec!(48000));

    r.venue
        .borrow_mut()
        .set_asset_price(BTC, Some(Price::new_unchecked(dec!(47000))));
    r.feed.borrow_mut().set_healthy(false);
    r.account.execute_conditional_order(KEEPER, id).unwrap();

    let relay = r.relay.borrow();
    let fill = relay
        .events()
        .iter()
        .find_map(|e| match &e.payload {
            EventPayload::ConditionalOrderFilled(f) => Some(f.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(fill.price_source, PriceSource::Fallback);
    assert_eq!(fill.fill_price.value(), dec!(47000));
}

#[test]
fn fill_fails_when_no_price_source_is_valid() {
    let mut r = rig();
    let id = place_limit_long(&mut r, dec!(10000), dec!(1), dec!(48000));

    r.feed.borrow_mut().set_healthy(false);
    r.venue.borrow_mut().set_asset_price(BTC, None);

    let result = r.account.execute_conditional_order(KEEPER, id);
    assert!(matches!(result, Err(AccountError::Oracle(_))));
    assert_eq!(r.account.conditional_orders().len(), 1);
    assert_eq!(r.account.committed_margin().value(), dec!(10000));
}

#[test]
fn reduce_only_without_position_cancels_instead_of_filling() {
    let mut r = rig();

    // stop sell at 48k, reduce-only, but there is no position to reduce
    r.account
        .execute(
            OWNER,
            &[Command::ConditionalOrderPlace {
                market: BTC,
                margin_delta: Quote::new(dec!(0)),
                size_delta: SignedSize::new(dec!(-1)),
                target_price: Price::new_unchecked(dec!(48000)),
                kind: ConditionalKind::Stop,
                desired_fill_price: Price::new_unchecked(dec!(47900)),
                reduce_only: true,
            }],
        )
        .unwrap();
    let id = OrderId(0);

    r.feed
        .borrow_mut()
        .set_update(BTC, dec!(47500), Timestamp::from_millis(0));
    r.account.execute_conditional_order(KEEPER, id).unwrap();

    assert!(r.account.conditional_orders().is_empty());
    assert!(r.venue.borrow().delayed_order(BTC).unwrap().is_none());

    let relay = r.relay.borrow();
    let reason = relay
        .events()
        .iter()
        .find_map(|e| match &e.payload {
            EventPayload::ConditionalOrderCancelled(c) => Some(c.reason),
            _ => None,
        })
        .unwrap();
    assert_eq!(reason, CancelReason::ReduceOnlyInvalid);
}

#[test]
fn reduce_only_clamps_to_open_position() {
    let mut r = rig();

    // open a 2 BTC long first
    r.account
        .execute(
            OWNER,
            &[
                Command::PerpModifyMargin {
                    market: BTC,
                    delta: Quote::new(dec!(12000)),
                },
                Command::PerpSubmitAtomicOrder {
                    market: BTC,
                    size_delta: SignedSize::new(dec!(2)),
                    desired_fill_price: Price::new_unchecked(dec!(50500)),
                },
            ],
        )
        .unwrap();

    // reduce-only stop asking to sell 5: clamped to the 2 open
    r.account
        .execute(
            OWNER,
            &[Command::ConditionalOrderPlace {
                market: BTC,
                margin_delta: Quote::new(dec!(0)),
                size_delta: SignedSize::new(dec!(-5)),
                target_price: Price::new_unchecked(dec!(48000)),
                kind: ConditionalKind::Stop,
                desired_fill_price: Price::new_unchecked(dec!(47900)),
                reduce_only: true,
            }],
        )
        .unwrap();
    let id = OrderId(0);

    r.feed
        .borrow_mut()
        .set_update(BTC, dec!(47000), Timestamp::from_millis(0));
    r.account.execute_conditional_order(KEEPER, id).unwrap();

    let delayed = r.venue.borrow().delayed_order(BTC).unwrap().unwrap();
    assert_eq!(delayed.size_delta.value(), dec!(-2));
}

#[test]
fn failed_fill_keeps_order_placed() {
    let mut r = build_rig(dec!(50));
    r.account.deposit(OWNER, Quote::new(dec!(10000))).unwrap();

    // commit the entire balance: the keeper fee cannot be paid on fill
    let id = place_limit_long(&mut r, dec!(10000), dec!(1), dec!(48000));

    r.feed
        .borrow_mut()
        .set_update(BTC, dec!(47500), Timestamp::from_millis(0));
    let result = r.account.execute_conditional_order(KEEPER, id);

    assert!(matches!(
        result,
        Err(AccountError::Ledger(LedgerError::InsufficientFreeMargin { .. }))
    ));
    // fully rolled back: order still placed, reservation intact
    assert_eq!(r.account.conditional_orders().len(), 1);
    assert_eq!(r.account.committed_margin().value(), dec!(10000));
    assert_eq!(r.account.balance().value(), dec!(10000));
    assert_eq!(r.keeper.borrow().active_tasks(), 1);
}

#[test]
fn fill_imposes_trade_fee_at_resolved_price() {
    let mut r = rig();
    r.config.borrow_mut().fee_rate = Bps::new(10);

    let id = place_limit_long(&mut r, dec!(10000), dec!(1), dec!(48000));

    r.feed
        .borrow_mut()
        .set_update(BTC, dec!(47500), Timestamp::from_millis(0));
    r.account.execute_conditional_order(KEEPER, id).unwrap();

    let relay = r.relay.borrow();
    let fee = relay
        .events()
        .iter()
        .find_map(|e| match &e.payload {
            EventPayload::FeeImposed(f) => Some(f.fee),
            _ => None,
        })
        .unwrap();
    // 10 bps on the 47_500 resolved price, not the 48_000 target
    assert_eq!(fee.value(), dec!(47.5));
}
