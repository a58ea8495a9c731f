//! Execute Use Case
//!
//! Drains one qualifying pool: principal comes out of the yield venue, is
//! swapped on the market, and the proceeds go back into the venue as the
//! pool's fixed payout. The series then moves to a fresh epoch.

use crate::application::dto::ExecutionReceipt;
use crate::application::ports::{
    EventPublisherPort, LedgerPort, MarketPort, SwapRequest, VenueError, YieldVenuePort,
};
use crate::application::use_cases::YieldAttribution;
use crate::domain::shared::{EventId, MarketId, Timestamp};
use crate::domain::trailing_stop::{
    Direction, PoolEvent, PoolExecuted, PoolKey, Tier, TrailingStopError, TriggerTracker,
};
use crate::error::EngineError;
use crate::observability;

use super::engine::TrailingStopEngine;

impl<M, V, L, P> TrailingStopEngine<M, V, L, P>
where
    M: MarketPort,
    V: YieldVenuePort,
    L: LedgerPort,
    P: EventPublisherPort,
{
    /// Execute every current-epoch pool of one tier that the market's current
    /// tick has crossed, Long first then Short.
    ///
    /// Returns an empty list when nothing qualifies. Calling it again after a
    /// successful execution is a no-op since the new epoch's pool starts empty.
    ///
    /// # Errors
    ///
    /// The first execution failure. Pools executed before it stay executed;
    /// their keys are listed in the `executed_before_failure` context entry.
    #[tracing::instrument(skip(self), fields(market = %market, tier = %tier))]
    pub fn try_execute(
        &mut self,
        market: &MarketId,
        tier: Tier,
    ) -> Result<Vec<ExecutionReceipt>, EngineError> {
        let tick = self.market.current_tick(market)?;
        let mut receipts = Vec::new();

        for direction in [Direction::Long, Direction::Short] {
            let Some(key) = TriggerTracker::crossed_in_tier(&self.book, market, tier, direction, tick)
            else {
                continue;
            };
            match self.execute(&key, tick) {
                Ok(receipt) => receipts.push(receipt),
                Err(err) if receipts.is_empty() => return Err(err),
                Err(err) => {
                    let executed: Vec<String> =
                        receipts.iter().map(|r| r.pool.to_string()).collect();
                    return Err(err.with_context("executed_before_failure", executed.join(",")));
                }
            }
        }

        if receipts.is_empty() {
            tracing::debug!(tick, "nothing to execute");
        }
        Ok(receipts)
    }

    /// [`Self::try_execute`] for every tier of a market, in ascending tier order.
    ///
    /// # Errors
    ///
    /// The first execution failure, as for [`Self::try_execute`].
    pub fn try_execute_market(
        &mut self,
        market: &MarketId,
    ) -> Result<Vec<ExecutionReceipt>, EngineError> {
        let mut receipts = Vec::new();
        for tier in Tier::ALL {
            receipts.extend(self.try_execute(market, tier)?);
        }
        Ok(receipts)
    }

    /// Execute one pool unconditionally on its trigger, with the market at
    /// `tick`.
    ///
    /// Callers are responsible for the qualification check.
    ///
    /// # Errors
    ///
    /// `PoolAlreadyExecuted` for an executed epoch, `NothingToExecute` for an
    /// unknown or empty pool, `CollaboratorFailure` if any collaborator fails;
    /// in every case nothing changes.
    #[tracing::instrument(skip(self), fields(pool = %key))]
    pub(crate) fn execute(
        &mut self,
        key: &PoolKey,
        tick: i32,
    ) -> Result<ExecutionReceipt, EngineError> {
        let result = self.atomically("execute", |engine| engine.apply_execution(key, tick));

        let tier = key.tier.to_string();
        match &result {
            Ok(receipt) => {
                observability::record_execution(
                    key.market.as_str(),
                    &tier,
                    &key.direction.to_string(),
                    f64::from(receipt.overshoot_ticks()),
                );
                tracing::info!(
                    principal_in = receipt.principal_in,
                    proceeds_out = receipt.proceeds_out,
                    trigger_tick = receipt.trigger_tick,
                    execution_tick = receipt.execution_tick,
                    next_epoch = receipt.next_epoch,
                    "pool executed"
                );
            }
            Err(err) if !err.is_benign() => {
                observability::record_execution_failure(key.market.as_str(), &tier, err.reason());
                tracing::warn!(error = %err, "execution rolled back");
            }
            Err(_) => {}
        }
        result
    }

    fn apply_execution(
        &mut self,
        key: &PoolKey,
        tick: i32,
    ) -> Result<(ExecutionReceipt, Vec<PoolEvent>), EngineError> {
        let pool = self
            .book
            .pool(key)
            .ok_or_else(|| TrailingStopError::NothingToExecute {
                reason: format!("no pool at {key}"),
            })?;
        let principal = pool.executable_principal(key.epoch)?;

        let pair = self.market.pair(&key.market)?;
        let deposit_asset = pair.deposit_asset(key.direction);
        let proceeds_asset = pair.proceeds_asset(key.direction);
        let account = &self.settings.account;

        let withdrawn = self.venue.withdraw(deposit_asset, principal, account)?;
        if withdrawn < principal {
            return Err(VenueError::ShortWithdrawal {
                requested: principal,
                returned: withdrawn,
            }
            .into());
        }
        let yield_accrued = withdrawn - principal;

        let swapped_in = match &self.settings.yield_attribution {
            YieldAttribution::Depositors => withdrawn,
            YieldAttribution::Recipient(recipient) => {
                if yield_accrued > 0 {
                    self.venue.supply(deposit_asset, yield_accrued, recipient)?;
                }
                principal
            }
        };

        let proceeds = self.market.swap(&SwapRequest::new(
            key.market.clone(),
            key.direction,
            swapped_in,
            self.settings.execution_slippage_bps,
        ))?;
        if proceeds > 0 {
            self.venue.supply(proceeds_asset, proceeds, account)?;
        }

        let settlement = self
            .book
            .pool_mut(key)
            .ok_or_else(|| EngineError::internal(format!("pool {key} vanished mid-execution")))?
            .settle_execution(key.epoch, proceeds)?;
        let next_epoch = self.book.advance_epoch(&key.series())?;

        let receipt = ExecutionReceipt {
            pool: key.clone(),
            principal_in: settlement.principal_in,
            swapped_in,
            proceeds_out: settlement.proceeds_out,
            trigger_tick: settlement.trigger_tick,
            execution_tick: tick,
            yield_accrued,
            next_epoch,
        };
        let event = PoolEvent::Executed(PoolExecuted {
            event_id: EventId::generate(),
            pool: key.clone(),
            principal_in: settlement.principal_in,
            proceeds_out: settlement.proceeds_out,
            trigger_tick: settlement.trigger_tick,
            yield_accrued,
            occurred_at: Timestamp::now(),
        });
        Ok((receipt, vec![event]))
    }
}
