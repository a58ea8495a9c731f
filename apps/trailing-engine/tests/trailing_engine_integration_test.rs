//! Integration tests for the trailing engine over the in-memory host.
//!
//! Each test lists one ETH-USDC market, runs the engine against the journaled
//! ledger and checks pool state, share balances, host balances and events.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use proptest::prelude::*;
use test_case::test_case;

use trailing_engine::application::ports::MarketPort;
use trailing_engine::infrastructure::events::RecordingEventPublisher;
use trailing_engine::infrastructure::ledger::InMemoryLedger;
use trailing_engine::infrastructure::market::{InMemoryMarket, MarketState, SwapRate};
use trailing_engine::infrastructure::venue::InMemoryYieldVenue;
use trailing_engine::{
    AccountId, AssetId, DepositRequest, Direction, EngineSettings, ErrorCode, MarketId,
    MarketPair, PoolEvent, PoolKey, Tier, TrailingStopEngine, WithdrawRequest, YieldAttribution,
};

type Engine =
    TrailingStopEngine<InMemoryMarket, InMemoryYieldVenue, InMemoryLedger, RecordingEventPublisher>;

struct Host {
    ledger: Arc<InMemoryLedger>,
    market: Arc<InMemoryMarket>,
    venue: Arc<InMemoryYieldVenue>,
    events: Arc<RecordingEventPublisher>,
}

fn eth_usdc() -> MarketId {
    MarketId::new("ETH-USDC")
}

fn eth() -> AssetId {
    AssetId::new("ETH")
}

fn usdc() -> AssetId {
    AssetId::new("USDC")
}

fn engine_account() -> AccountId {
    AccountId::new("engine")
}

fn setup_with(settings: EngineSettings, long_rate: SwapRate) -> (Engine, Host) {
    let ledger = Arc::new(InMemoryLedger::new());
    let market = Arc::new(ledger.market());
    market.list(
        eth_usdc(),
        MarketState {
            long_rate,
            ..MarketState::new(MarketPair::new(eth(), usdc()), 0)
        },
    );
    let venue = Arc::new(ledger.yield_venue(engine_account()));
    let events = Arc::new(RecordingEventPublisher::new());
    let engine = TrailingStopEngine::new(
        Arc::clone(&market),
        Arc::clone(&venue),
        Arc::clone(&ledger),
        Arc::clone(&events),
        settings,
    );
    (
        engine,
        Host {
            ledger,
            market,
            venue,
            events,
        },
    )
}

fn setup() -> (Engine, Host) {
    setup_with(
        EngineSettings::for_account(engine_account()),
        SwapRate::new(18, 15),
    )
}

fn deposit(engine: &mut Engine, who: &str, tier: Tier, direction: Direction, amount: u128) -> u128 {
    engine
        .deposit(DepositRequest {
            market: eth_usdc(),
            tier,
            direction,
            amount,
            depositor: AccountId::new(who),
        })
        .unwrap()
        .shares
}

fn move_to(engine: &mut Engine, host: &Host, tick: i32) -> usize {
    let update = host.market.trade_to(&eth_usdc(), tick).unwrap();
    engine
        .on_price_changed(&update.market, update.previous_tick, update.new_tick)
        .receipts()
        .count()
}

fn key(tier: Tier, direction: Direction, epoch: u64) -> PoolKey {
    PoolKey::new(eth_usdc(), tier, direction, epoch)
}

// =============================================================================
// Concrete scenarios
// =============================================================================

#[test]
fn long_t1_executes_after_retrace_past_trigger() {
    let (mut engine, host) = setup();
    deposit(&mut engine, "alice", Tier::T1, Direction::Long, 10);

    let pool = engine.pool_state(&key(Tier::T1, Direction::Long, 0)).unwrap();
    assert_eq!(pool.highest_tick_ever(), Some(0));
    assert_eq!(pool.trigger_tick(), Some(-500));

    assert_eq!(move_to(&mut engine, &host, -400), 0);
    assert_eq!(move_to(&mut engine, &host, -600), 1);

    let pool = engine.pool_state(&key(Tier::T1, Direction::Long, 0)).unwrap();
    assert!(pool.is_executed());
    assert_eq!(pool.total_principal(), 0);
    assert_eq!(pool.total_shares(), 10);
    assert_eq!(engine.current_epoch(&eth_usdc(), Tier::T1, Direction::Long), 1);
}

#[test]
fn second_deposit_mints_proportionally() {
    let (mut engine, _host) = setup();
    assert_eq!(deposit(&mut engine, "alice", Tier::T1, Direction::Long, 10), 10);
    assert_eq!(deposit(&mut engine, "bob", Tier::T1, Direction::Long, 5), 5);

    let pool = engine.pool_state(&key(Tier::T1, Direction::Long, 0)).unwrap();
    assert_eq!(pool.total_principal(), 15);
    assert_eq!(pool.total_shares(), 15);
}

#[test]
fn post_execution_withdrawal_pays_fixed_rate() {
    let (mut engine, host) = setup();
    deposit(&mut engine, "alice", Tier::T1, Direction::Long, 10);
    deposit(&mut engine, "bob", Tier::T1, Direction::Long, 5);
    move_to(&mut engine, &host, -600);

    let pool_key = key(Tier::T1, Direction::Long, 0);
    assert_eq!(engine.pool_state(&pool_key).unwrap().executed_output(), 18);

    let receipt = engine
        .withdraw(WithdrawRequest {
            pool: pool_key.clone(),
            shares: 5,
            owner: AccountId::new("bob"),
        })
        .unwrap();
    assert_eq!(receipt.amount_out, 6);
    assert_eq!(receipt.asset, usdc());
    assert_eq!(host.venue.delivered_balance(&usdc(), &AccountId::new("bob")), 6);

    let alice = engine
        .withdraw(WithdrawRequest {
            pool: pool_key.clone(),
            shares: 10,
            owner: AccountId::new("alice"),
        })
        .unwrap();
    assert_eq!(alice.amount_out, 12);

    let pool = engine.pool_state(&pool_key).unwrap();
    assert_eq!(pool.paid_output(), 18);
    assert_eq!(pool.total_shares(), 15);
    assert_eq!(host.venue.supplied_balance(&usdc(), &engine_account()), 0);
}

#[test]
fn over_withdrawal_is_rejected_without_side_effects() {
    let (mut engine, host) = setup();
    deposit(&mut engine, "alice", Tier::T1, Direction::Long, 10);
    let before = host.ledger.snapshot();
    let events_before = host.events.len();

    let err = engine
        .withdraw(WithdrawRequest {
            pool: key(Tier::T1, Direction::Long, 0),
            shares: 11,
            owner: AccountId::new("alice"),
        })
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::InsufficientShares);
    assert_eq!(host.ledger.snapshot(), before);
    assert_eq!(host.events.len(), events_before);
    assert_eq!(
        engine.share_balance(&AccountId::new("alice"), &key(Tier::T1, Direction::Long, 0)),
        10
    );
}

#[test]
fn manual_trigger_on_empty_pool_is_a_no_op() {
    let (mut engine, host) = setup();
    host.market.trade_to(&eth_usdc(), -5_000).unwrap();

    assert!(engine.try_execute(&eth_usdc(), Tier::T1).unwrap().is_empty());
    assert!(engine.try_execute_market(&eth_usdc()).unwrap().is_empty());
    assert_eq!(engine.current_epoch(&eth_usdc(), Tier::T1, Direction::Long), 0);
    assert!(host.events.is_empty());
}

// =============================================================================
// Trigger tracking
// =============================================================================

#[test_case(Tier::T1, 600, 1 ; "t1 crossed")]
#[test_case(Tier::T2, 600, 0 ; "t2 not crossed")]
#[test_case(Tier::T2, 1_000, 1 ; "t2 exactly at trigger")]
#[test_case(Tier::T3, 1_500, 1 ; "t3 exactly at trigger")]
fn short_pools_execute_on_rally(tier: Tier, tick: i32, expected: usize) {
    let (mut engine, host) = setup();
    deposit(&mut engine, "carol", tier, Direction::Short, 100);
    assert_eq!(move_to(&mut engine, &host, tick), expected);
    assert_eq!(
        engine.current_epoch(&eth_usdc(), tier, Direction::Short),
        expected as u64
    );
}

#[test]
fn one_update_executes_several_tiers() {
    let (mut engine, host) = setup();
    for tier in Tier::ALL {
        deposit(&mut engine, "alice", tier, Direction::Long, 100);
    }
    move_to(&mut engine, &host, 200);

    assert_eq!(move_to(&mut engine, &host, -1_000), 2);
    assert_eq!(engine.current_epoch(&eth_usdc(), Tier::T1, Direction::Long), 1);
    assert_eq!(engine.current_epoch(&eth_usdc(), Tier::T2, Direction::Long), 1);
    assert_eq!(engine.current_epoch(&eth_usdc(), Tier::T3, Direction::Long), 0);

    let t3 = engine.pool_state(&key(Tier::T3, Direction::Long, 0)).unwrap();
    assert_eq!(t3.trigger_tick(), Some(200 - 1_500));
}

#[test]
fn trigger_only_tightens() {
    let (mut engine, host) = setup();
    deposit(&mut engine, "alice", Tier::T2, Direction::Long, 50);
    move_to(&mut engine, &host, 300);
    move_to(&mut engine, &host, 100);
    move_to(&mut engine, &host, 250);

    let pool = engine.pool_state(&key(Tier::T2, Direction::Long, 0)).unwrap();
    assert_eq!(pool.highest_tick_ever(), Some(300));
    assert_eq!(pool.trigger_tick(), Some(-700));
}

#[test]
fn failed_tier_stays_open_and_does_not_block_others() {
    let (mut engine, host) = setup();
    deposit(&mut engine, "alice", Tier::T1, Direction::Long, 10);
    host.market.fail_swaps(true);

    let update = host.market.trade_to(&eth_usdc(), -600).unwrap();
    let report = engine.on_price_changed(&update.market, update.previous_tick, update.new_tick);
    assert_eq!(report.failure_count(), 1);

    let pool = engine.pool_state(&key(Tier::T1, Direction::Long, 0)).unwrap();
    assert!(pool.is_open());
    assert_eq!(pool.total_principal(), 10);
    assert_eq!(host.venue.supplied_balance(&eth(), &engine_account()), 10);
    assert!(!host.ledger.in_unit_of_work());

    host.market.fail_swaps(false);
    let receipts = engine.try_execute(&eth_usdc(), Tier::T1).unwrap();
    assert_eq!(receipts.len(), 1);
    assert_eq!(receipts[0].proceeds_out, 12);
}

// =============================================================================
// Epochs, yield and events
// =============================================================================

#[test]
fn deposits_after_execution_open_a_fresh_epoch() {
    let (mut engine, host) = setup();
    deposit(&mut engine, "alice", Tier::T1, Direction::Long, 10);
    move_to(&mut engine, &host, -600);

    assert_eq!(deposit(&mut engine, "bob", Tier::T1, Direction::Long, 7), 7);
    let fresh = engine.pool_state(&key(Tier::T1, Direction::Long, 1)).unwrap();
    assert!(fresh.is_open());
    assert_eq!(fresh.highest_tick_ever(), Some(-600));
    assert_eq!(fresh.trigger_tick(), Some(-1_100));
    assert_eq!(
        engine.share_balance(&AccountId::new("bob"), &key(Tier::T1, Direction::Long, 0)),
        0
    );

    let positions = engine.positions_of(&AccountId::new("alice"));
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0].pool.epoch, 0);
}

#[test]
fn old_epoch_withdrawals_leave_the_fresh_epoch_untouched() {
    let (mut engine, host) = setup();
    deposit(&mut engine, "alice", Tier::T1, Direction::Long, 10);
    move_to(&mut engine, &host, -600);
    deposit(&mut engine, "bob", Tier::T1, Direction::Long, 7);

    let fresh_key = key(Tier::T1, Direction::Long, 1);
    let bob = AccountId::new("bob");
    let before = engine.pool_state(&fresh_key).unwrap().clone();
    let eth_supplied = host.venue.supplied_balance(&eth(), &engine_account());

    let receipt = engine
        .withdraw(WithdrawRequest {
            pool: key(Tier::T1, Direction::Long, 0),
            shares: 10,
            owner: AccountId::new("alice"),
        })
        .unwrap();
    assert!(receipt.post_execution);
    assert_eq!(receipt.asset, usdc());
    assert_eq!(receipt.amount_out, 12);
    assert_eq!(host.venue.delivered_balance(&usdc(), &AccountId::new("alice")), 12);

    let after = engine.pool_state(&fresh_key).unwrap();
    assert_eq!(after, &before);
    assert_eq!(after.total_principal(), 7);
    assert_eq!(after.total_shares(), 7);
    assert_eq!(after.trigger_tick(), Some(-1_100));
    assert_eq!(engine.share_balance(&bob, &fresh_key), 7);
    assert_eq!(host.venue.supplied_balance(&eth(), &engine_account()), eth_supplied);
    assert_eq!(engine.current_epoch(&eth_usdc(), Tier::T1, Direction::Long), 1);
}

#[test]
fn yield_goes_to_depositors_by_default() {
    let (mut engine, host) = setup();
    host.venue.set_yield_bps(eth(), 1_000);
    deposit(&mut engine, "alice", Tier::T1, Direction::Long, 15);

    let receipts = engine.try_execute(&eth_usdc(), Tier::T1).unwrap();
    assert!(receipts.is_empty());
    move_to(&mut engine, &host, -500);

    let pool = engine.pool_state(&key(Tier::T1, Direction::Long, 0)).unwrap();
    assert_eq!(pool.executed_output(), 19);
}

#[test]
fn yield_can_be_routed_to_a_recipient() {
    let settings = EngineSettings {
        yield_attribution: YieldAttribution::Recipient(AccountId::new("treasury")),
        ..EngineSettings::for_account(engine_account())
    };
    let (mut engine, host) = setup_with(settings, SwapRate::new(18, 15));
    host.venue.set_yield_bps(eth(), 1_000);
    deposit(&mut engine, "alice", Tier::T1, Direction::Long, 15);
    move_to(&mut engine, &host, -500);

    let pool = engine.pool_state(&key(Tier::T1, Direction::Long, 0)).unwrap();
    assert_eq!(pool.executed_output(), 18);
    assert_eq!(
        host.venue.supplied_balance(&eth(), &AccountId::new("treasury")),
        1
    );
}

#[test]
fn events_follow_committed_operations() {
    let (mut engine, host) = setup();
    deposit(&mut engine, "alice", Tier::T1, Direction::Long, 10);
    move_to(&mut engine, &host, -600);
    engine
        .withdraw(WithdrawRequest {
            pool: key(Tier::T1, Direction::Long, 0),
            shares: 4,
            owner: AccountId::new("alice"),
        })
        .unwrap();

    let types: Vec<_> = host.events.events().iter().map(PoolEvent::event_type).collect();
    assert_eq!(types, ["POOL_DEPOSITED", "POOL_EXECUTED", "POOL_WITHDRAWN"]);
    assert!(
        host.events
            .events()
            .iter()
            .all(|e| e.pool() == &key(Tier::T1, Direction::Long, 0))
    );
}

#[test]
fn unknown_market_is_a_collaborator_failure() {
    let (mut engine, host) = setup();
    let err = engine
        .deposit(DepositRequest {
            market: MarketId::new("BTC-USDC"),
            tier: Tier::T1,
            direction: Direction::Long,
            amount: 10,
            depositor: AccountId::new("alice"),
        })
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::CollaboratorFailure);
    assert!(host.market.current_tick(&MarketId::new("BTC-USDC")).is_err());
    assert!(host.events.is_empty());
}

// =============================================================================
// Properties
// =============================================================================

#[derive(Debug, Clone)]
enum Op {
    Deposit(usize, u128),
    Withdraw(usize, u128),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..3usize, 1..1_000_000u128).prop_map(|(who, amount)| Op::Deposit(who, amount)),
        (0..3usize, 1..1_000_000u128).prop_map(|(who, shares)| Op::Withdraw(who, shares)),
    ]
}

proptest! {
    #[test]
    fn shares_are_conserved(ops in prop::collection::vec(op(), 1..40), rally in 0..2_000i32) {
        let (mut engine, host) = setup();
        let users = ["alice", "bob", "carol"].map(AccountId::new);
        let pool_key = key(Tier::T2, Direction::Long, 0);

        for op in ops {
            match op {
                Op::Deposit(who, amount) => {
                    let _ = engine.deposit(DepositRequest {
                        market: eth_usdc(),
                        tier: Tier::T2,
                        direction: Direction::Long,
                        amount,
                        depositor: users[who].clone(),
                    });
                }
                Op::Withdraw(who, shares) => {
                    let balance = engine.share_balance(&users[who], &pool_key);
                    let _ = engine.withdraw(WithdrawRequest {
                        pool: pool_key.clone(),
                        shares: shares.min(balance).max(1),
                        owner: users[who].clone(),
                    });
                }
            }
            if let Some(pool) = engine.pool_state(&pool_key) {
                let held: u128 = users.iter().map(|u| engine.share_balance(u, &pool_key)).sum();
                prop_assert_eq!(held, pool.total_shares());
                prop_assert_eq!(pool.total_shares() == 0, pool.total_principal() == 0);
                prop_assert_eq!(
                    host.venue.supplied_balance(&eth(), &engine_account()),
                    pool.total_principal()
                );
            }
        }

        move_to(&mut engine, &host, rally);
        move_to(&mut engine, &host, rally - 1_000);
        if let Some(pool) = engine.pool_state(&pool_key) {
            if pool.is_executed() {
                let mut paid = 0;
                for user in &users {
                    let balance = engine.share_balance(user, &pool_key);
                    if balance > 0 {
                        if let Ok(receipt) = engine.withdraw(WithdrawRequest {
                            pool: pool_key.clone(),
                            shares: balance,
                            owner: user.clone(),
                        }) {
                            paid += receipt.amount_out;
                        }
                    }
                    let executed = engine.pool_state(&pool_key).unwrap();
                    let held: u128 =
                        users.iter().map(|u| engine.share_balance(u, &pool_key)).sum();
                    prop_assert_eq!(held, executed.total_shares() - executed.redeemed_shares());
                    prop_assert_eq!(executed.paid_output(), paid);
                }
                prop_assert!(paid <= pool_output(&engine, &pool_key));
            }
        }
    }
}

fn pool_output(engine: &Engine, pool: &PoolKey) -> u128 {
    engine.pool_state(pool).map_or(0, |p| p.executed_output())
}
