//! Track Price Use Case

use crate::application::dto::{ExecutionFailure, PriceUpdateReport, TierExecution};
use crate::application::ports::{EventPublisherPort, LedgerPort, MarketPort, YieldVenuePort};
use crate::domain::shared::MarketId;
use crate::domain::trailing_stop::TriggerTracker;
use crate::observability;

use super::engine::TrailingStopEngine;

impl<M, V, L, P> TrailingStopEngine<M, V, L, P>
where
    M: MarketPort,
    V: YieldVenuePort,
    L: LedgerPort,
    P: EventPublisherPort,
{
    /// Handle a tick move on `market`.
    ///
    /// Ratchets the pools the move favours, then executes every current-epoch
    /// pool on the other side whose trigger `new_tick` crossed. Each execution
    /// is its own unit of work: a failure is reported in the returned report
    /// and leaves that pool open without affecting the other tiers.
    #[tracing::instrument(skip(self), fields(market = %market))]
    pub fn on_price_changed(
        &mut self,
        market: &MarketId,
        previous_tick: i32,
        new_tick: i32,
    ) -> PriceUpdateReport {
        observability::record_price_update(market.as_str());

        let sweep = TriggerTracker::sweep(&mut self.book, market, previous_tick, new_tick);
        if !sweep.ratcheted.is_empty() {
            tracing::debug!(count = sweep.ratcheted.len(), "extrema ratcheted");
        }

        let executions = sweep
            .crossed
            .into_iter()
            .map(|pool| match self.execute(&pool, new_tick) {
                Ok(receipt) => TierExecution {
                    pool,
                    receipt: Some(receipt),
                    error: None,
                },
                Err(err) => TierExecution {
                    pool,
                    receipt: None,
                    error: Some(ExecutionFailure::from(&err)),
                },
            })
            .collect();

        PriceUpdateReport {
            market: market.clone(),
            previous_tick,
            new_tick,
            ratcheted: sweep.ratcheted,
            executions,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicI32, Ordering};

    use super::super::engine::test_support::*;
    use crate::application::dto::DepositRequest;
    use crate::application::ports::{MarketError, MockMarketPort};
    use crate::domain::shared::AccountId;
    use crate::domain::trailing_stop::{Direction, Tier};
    use crate::error::ErrorCode;

    fn deposit(engine: &mut MockEngine, tier: Tier, direction: Direction) {
        engine
            .deposit(DepositRequest {
                market: market_id(),
                tier,
                direction,
                amount: 10,
                depositor: AccountId::new("alice"),
            })
            .unwrap();
    }

    #[test]
    fn equal_ticks_do_nothing() {
        let mut engine = engine(market_at(0, 1), plain_venue());
        deposit(&mut engine, Tier::T1, Direction::Long);
        let report = engine.on_price_changed(&market_id(), 0, 0);
        assert!(report.ratcheted.is_empty());
        assert!(report.executions.is_empty());
    }

    #[test]
    fn long_t1_executes_below_trigger() {
        let tick = Arc::new(AtomicI32::new(0));
        let mut engine = engine(ticking_market(Arc::clone(&tick), 1), plain_venue());
        deposit(&mut engine, Tier::T1, Direction::Long);

        tick.store(-600, Ordering::SeqCst);
        let report = engine.on_price_changed(&market_id(), 0, -600);

        assert_eq!(report.executions.len(), 1);
        assert!(report.executions[0].succeeded());
        let receipt = report.receipts().next().unwrap();
        assert_eq!(receipt.pool.epoch, 0);
        assert_eq!(receipt.execution_tick, -600);
        assert_eq!(receipt.overshoot_ticks(), 100);
        assert_eq!(receipt.next_epoch, 1);
        assert_eq!(engine.current_epoch(&market_id(), Tier::T1, Direction::Long), 1);
    }

    #[test]
    fn up_move_ratchets_long_without_executing() {
        let tick = Arc::new(AtomicI32::new(0));
        let mut engine = engine(ticking_market(Arc::clone(&tick), 1), plain_venue());
        deposit(&mut engine, Tier::T2, Direction::Long);

        let report = engine.on_price_changed(&market_id(), 0, 400);
        assert_eq!(report.ratcheted.len(), 1);
        assert!(report.executions.is_empty());

        let key = report.ratcheted[0].clone();
        assert_eq!(engine.pool_state(&key).unwrap().trigger_tick(), Some(-600));
    }

    #[test]
    fn one_update_can_execute_several_tiers() {
        let tick = Arc::new(AtomicI32::new(0));
        let mut engine = engine(ticking_market(Arc::clone(&tick), 1), plain_venue());
        for tier in Tier::ALL {
            deposit(&mut engine, tier, Direction::Short);
        }

        let report = engine.on_price_changed(&market_id(), 0, 1_200);
        let tiers: Vec<_> = report.receipts().map(|r| r.pool.tier).collect();
        assert_eq!(tiers, vec![Tier::T1, Tier::T2]);
        assert_eq!(engine.current_epoch(&market_id(), Tier::T3, Direction::Short), 0);
    }

    #[test]
    fn failed_tier_is_reported_and_stays_open() {
        let mut market = MockMarketPort::new();
        market.expect_pair().returning(|_| Ok(pair()));
        market.expect_current_tick().returning(|_| Ok(0));
        let mut swaps = 0;
        market.expect_swap().returning(move |request| {
            swaps += 1;
            if swaps == 1 {
                Err(MarketError::Unavailable {
                    message: "halted".into(),
                })
            } else {
                Ok(request.amount_in)
            }
        });

        let mut engine = engine(market, plain_venue());
        deposit(&mut engine, Tier::T1, Direction::Long);
        deposit(&mut engine, Tier::T2, Direction::Long);

        let report = engine.on_price_changed(&market_id(), 0, -1_000);
        assert_eq!(report.executions.len(), 2);
        assert_eq!(report.failure_count(), 1);
        assert!(!report.executions[0].succeeded());
        assert!(report.executions[1].succeeded());

        let failure = report.executions[0].error.as_ref().unwrap();
        assert_eq!(failure.code, ErrorCode::CollaboratorFailure);
        assert!(failure.message.contains("halted"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["executions"][0]["error"]["code"], "COLLABORATOR_FAILURE");

        let failed = &report.executions[0].pool;
        assert!(engine.pool_state(failed).unwrap().is_open());
        assert_eq!(engine.current_epoch(&market_id(), Tier::T1, Direction::Long), 0);
    }
}
