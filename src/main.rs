//! Smart Margin Account Simulation.
//!
//! Demonstrates the account lifecycle: batched command execution, delegated
//! trading, conditional orders with keeper fills, oracle fallback pricing,
//! and whole-batch atomicity under venue rejections.

use margin_core::*;
use rust_decimal_macros::dec;
use std::cell::RefCell;
use std::rc::Rc;

const ACCOUNT: Address = Address(0xACC);
const OWNER: Address = Address(1);
const DELEGATE: Address = Address(2);
const KEEPER: Address = Address(3);
const BTC: MarketId = MarketId(1);

struct Rig {
    account: MarginAccount,
    config: Rc<RefCell<SystemConfig>>,
    venue: Rc<RefCell<SimVenue>>,
    relay: Rc<RefCell<RecordingRelay>>,
    feed: Rc<RefCell<MockPriceFeed>>,
}

fn build_rig() -> Rig {
    let config = Rc::new(RefCell::new(SystemConfig::default()));
    let venue = Rc::new(RefCell::new(SimVenue::new()));
    let relay = Rc::new(RefCell::new(RecordingRelay::new()));
    let keeper = Rc::new(RefCell::new(MockKeeper::new(KEEPER, Quote::new(dec!(2)))));
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
            keeper,
            feed: feed.clone(),
            registry,
            exchange,
        },
    )
    .expect("valid owner");

    Rig {
        account,
        config,
        venue,
        relay,
        feed,
    }
}

fn main() {
    println!("Smart Margin Account Simulation");
    println!("Batched Commands, Conditional Orders, Atomic Execution\n");

    scenario_1_deposit_and_delegate();
    scenario_2_batch_trading_with_fees();
    scenario_3_conditional_order_fill();
    scenario_4_oracle_fallback();
    scenario_5_atomic_abort();

    println!("\nAll simulations completed successfully.");
}

/// Funding the account and granting a delegate.
fn scenario_1_deposit_and_delegate() {
    println!("Scenario 1: Deposit and Delegation\n");

    let mut rig = build_rig();
    rig.account.deposit(OWNER, Quote::new(dec!(10000))).unwrap();
    println!("  Owner deposits $10,000, balance: ${}", rig.account.balance());

    rig.account
        .execute(
            OWNER,
            &[Command::DelegateAdd {
                delegate: DELEGATE,
                fee: Bps::new(50),
            }],
        )
        .unwrap();
    println!("  Delegate added with a 50 bps fee");

    // the delegate may trade but not withdraw
    let denied = rig.account.execute(
        DELEGATE,
        &[Command::AccountModifyMargin {
            delta: Quote::new(dec!(-1000)),
        }],
    );
    println!("  Delegate withdrawal attempt: {}\n", denied.unwrap_err());
}

/// A batch that funds a market and opens a position, fee included.
fn scenario_2_batch_trading_with_fees() {
    println!("Scenario 2: Batched Trading With Fees\n");

    let mut rig = build_rig();
    rig.account.deposit(OWNER, Quote::new(dec!(20000))).unwrap();
    rig.config.borrow_mut().fee_rate = Bps::new(10);
    println!("  Fee rate set to 10 bps");

    rig.account
        .execute(
            OWNER,
            &[
                Command::PerpModifyMargin {
                    market: BTC,
                    delta: Quote::new(dec!(10000)),
                },
                Command::PerpSubmitAtomicOrder {
                    market: BTC,
                    size_delta: SignedSize::new(dec!(1)),
                    desired_fill_price: Price::new_unchecked(dec!(50500)),
                },
            ],
        )
        .unwrap();

    let position = rig.venue.borrow().position(BTC).unwrap();
    println!("  Opened {} BTC with ${} venue margin", position.size, position.margin);
    println!("  Free margin after fee: ${}", rig.account.free_margin());
    println!("  Events relayed: {}\n", rig.relay.borrow().events().len());
}

/// Conditional order placed by the owner and filled by the keeper.
fn scenario_3_conditional_order_fill() {
    println!("Scenario 3: Conditional Order Lifecycle\n");

    let mut rig = build_rig();
    rig.account.deposit(OWNER, Quote::new(dec!(20000))).unwrap();

    rig.account
        .execute(
            OWNER,
            &[Command::ConditionalOrderPlace {
                market: BTC,
                margin_delta: Quote::new(dec!(10000)),
                size_delta: SignedSize::new(dec!(1)),
                target_price: Price::new_unchecked(dec!(48000)),
                kind: ConditionalKind::Limit,
                desired_fill_price: Price::new_unchecked(dec!(48100)),
                reduce_only: false,
            }],
        )
        .unwrap();
    println!(
        "  Limit order placed, committed margin: ${}",
        rig.account.committed_margin()
    );

    // price drops through the target; the keeper executes
    rig.feed
        .borrow_mut()
        .set_update(BTC, dec!(47500), Timestamp::from_millis(0));
    rig.account
        .execute_conditional_order(KEEPER, OrderId(0))
        .unwrap();

    println!("  Keeper filled the order at $47,500");
    println!("  Committed margin released: ${}", rig.account.committed_margin());
    let delayed = rig.venue.borrow().delayed_order(BTC).unwrap();
    println!("  Venue delayed order pending: {}\n", delayed.is_some());
}

/// Stale primary feed falls back to the venue's asset price.
fn scenario_4_oracle_fallback() {
    println!("Scenario 4: Oracle Fallback\n");

    let mut rig = build_rig();
    rig.account.deposit(OWNER, Quote::new(dec!(20000))).unwrap();

    // push the clock past the freshness window
    rig.account.advance_time(120_000);

    rig.account
        .execute(
            OWNER,
            &[
                Command::PerpModifyMargin {
                    market: BTC,
                    delta: Quote::new(dec!(10000)),
                },
                Command::PerpSubmitAtomicOrder {
                    market: BTC,
                    size_delta: SignedSize::new(dec!(1)),
                    desired_fill_price: Price::new_unchecked(dec!(50500)),
                },
            ],
        )
        .unwrap();

    let fee_event = rig
        .relay
        .borrow()
        .events()
        .iter()
        .find_map(|e| match &e.payload {
            EventPayload::FeeImposed(f) => Some(f.fee),
            _ => None,
        });
    println!("  Primary feed stale, venue price used for the fee");
    println!("  Fee imposed: ${:?}\n", fee_event.unwrap());
}

/// A failing command aborts the whole batch with no partial effects.
fn scenario_5_atomic_abort() {
    println!("Scenario 5: Atomic Abort\n");

    let mut rig = build_rig();
    rig.account.deposit(OWNER, Quote::new(dec!(20000))).unwrap();
    let balance_before = rig.account.balance();

    let result = rig.account.execute(
        OWNER,
        &[
            Command::AccountModifyMargin {
                delta: Quote::new(dec!(-5000)),
            },
            // unknown market: the venue rejects, the withdrawal above rolls back
            Command::PerpSubmitAtomicOrder {
                market: MarketId(99),
                size_delta: SignedSize::new(dec!(1)),
                desired_fill_price: Price::new_unchecked(dec!(50500)),
            },
        ],
    );

    println!("  Batch failed: {}", result.unwrap_err());
    println!(
        "  Balance unchanged: ${} (was ${})",
        rig.account.balance(),
        balance_before
    );
    println!(
        "  Events relayed from the aborted batch: {}",
        rig.relay
            .borrow()
            .events()
            .iter()
            .filter(|e| matches!(e.payload, EventPayload::Withdrawal(_)))
            .count()
    );
}
