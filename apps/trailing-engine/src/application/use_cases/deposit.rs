//! Deposit Use Case

use crate::application::dto::{DepositReceipt, DepositRequest};
use crate::application::ports::{EventPublisherPort, LedgerPort, MarketPort, YieldVenuePort};
use crate::domain::shared::{EventId, MarketId, Timestamp};
use crate::domain::trailing_stop::{
    Direction, PoolDeposited, PoolEvent, SeriesKey, ShareKey, Tier, TrailingPool,
    TrailingStopError,
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
    /// Deposit principal into the current pool of a series and mint shares.
    ///
    /// Reads the market tick, mints against pre-deposit totals, ratchets the
    /// pool's extremum, supplies the principal to the yield venue and credits
    /// the depositor. All-or-nothing.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` for zero or dust deposits, `CollaboratorFailure` when
    /// the market or venue fails.
    #[tracing::instrument(
        skip(self, request),
        fields(
            market = %request.market,
            tier = %request.tier,
            direction = %request.direction,
            amount = request.amount,
            depositor = %request.depositor,
        )
    )]
    pub fn deposit(&mut self, request: DepositRequest) -> Result<DepositReceipt, EngineError> {
        if request.amount == 0 {
            observability::record_rejection("deposit", "INVALID_AMOUNT");
            return Err(TrailingStopError::ZeroAmount { field: "amount" }.into());
        }

        let receipt = self.atomically("deposit", |engine| engine.apply_deposit(&request))?;

        observability::record_deposit(
            receipt.pool.market.as_str(),
            &receipt.pool.tier.to_string(),
            &receipt.pool.direction.to_string(),
        );
        tracing::info!(
            pool = %receipt.pool,
            shares = receipt.shares,
            trigger_tick = ?receipt.trigger_tick,
            "deposit committed"
        );
        Ok(receipt)
    }

    /// Shares `amount` would mint in the current pool of a series right now.
    ///
    /// # Errors
    ///
    /// Same validation as [`Self::deposit`], without touching collaborators.
    pub fn preview_deposit(
        &self,
        market: &MarketId,
        tier: Tier,
        direction: Direction,
        amount: u128,
    ) -> Result<u128, EngineError> {
        let series = SeriesKey::new(market.clone(), tier, direction);
        let shares = match self.book.current_pool(&series) {
            Some((_, pool)) => pool.preview_mint(amount)?,
            None => TrailingPool::new(tier, direction).preview_mint(amount)?,
        };
        Ok(shares)
    }

    fn apply_deposit(
        &mut self,
        request: &DepositRequest,
    ) -> Result<(DepositReceipt, Vec<PoolEvent>), EngineError> {
        let series = SeriesKey::new(request.market.clone(), request.tier, request.direction);
        let pair = self.market.pair(&request.market)?;
        let tick = self.market.current_tick(&request.market)?;

        let (key, pool) = self.book.current_pool_or_create(&series);
        let shares = pool.mint(request.amount)?;
        pool.observe_tick(tick);
        let trigger_tick = pool.trigger_tick();

        self.venue.supply(
            pair.deposit_asset(request.direction),
            request.amount,
            &self.settings.account,
        )?;
        self.book
            .credit(ShareKey::new(request.depositor.clone(), key.clone()), shares)?;

        let receipt = DepositReceipt {
            pool: key.clone(),
            depositor: request.depositor.clone(),
            amount: request.amount,
            shares,
            tick,
            trigger_tick,
        };
        let event = PoolEvent::Deposited(PoolDeposited {
            event_id: EventId::generate(),
            pool: key,
            depositor: request.depositor.clone(),
            amount: request.amount,
            shares,
            tick,
            trigger_tick,
            occurred_at: Timestamp::now(),
        });
        Ok((receipt, vec![event]))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::super::engine::test_support::*;
    use crate::application::ports::{MockYieldVenuePort, VenueError};
    use crate::application::use_cases::EngineSettings;
    use crate::domain::shared::AccountId;
    use crate::domain::trailing_stop::PoolKey;
    use crate::error::ErrorCode;

    use super::*;

    fn request(direction: Direction, amount: u128, who: &str) -> DepositRequest {
        DepositRequest {
            market: market_id(),
            tier: Tier::T1,
            direction,
            amount,
            depositor: AccountId::new(who),
        }
    }

    #[test]
    fn first_long_deposit_sets_trigger() {
        let mut engine = engine(market_at(0, 1), plain_venue());
        let receipt = engine.deposit(request(Direction::Long, 10, "alice")).unwrap();

        assert_eq!(receipt.shares, 10);
        assert_eq!(receipt.pool.epoch, 0);
        assert_eq!(receipt.trigger_tick, Some(-500));
        let pool = engine.pool_state(&receipt.pool).unwrap();
        assert_eq!(pool.highest_tick_ever(), Some(0));
        assert_eq!(pool.total_principal(), 10);
    }

    #[test]
    fn proportional_second_deposit() {
        let mut engine = engine(market_at(0, 1), plain_venue());
        engine.deposit(request(Direction::Long, 10, "alice")).unwrap();
        let receipt = engine.deposit(request(Direction::Long, 5, "bob")).unwrap();

        assert_eq!(receipt.shares, 5);
        assert_eq!(
            engine.share_balance(&AccountId::new("bob"), &receipt.pool),
            5
        );
        assert_eq!(engine.pool_state(&receipt.pool).unwrap().total_shares(), 15);
    }

    #[test]
    fn short_deposit_supplies_quote_asset() {
        let mut venue = MockYieldVenuePort::new();
        venue
            .expect_supply()
            .withf(|asset, amount, beneficiary| {
                asset.as_str() == "USDC" && *amount == 7 && beneficiary.as_str() == "engine"
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let mut engine = engine(market_at(200, 1), venue);
        let receipt = engine.deposit(request(Direction::Short, 7, "carol")).unwrap();
        assert_eq!(receipt.trigger_tick, Some(700));
    }

    #[test]
    fn zero_deposit_is_invalid_amount() {
        let mut engine = engine(market_at(0, 1), plain_venue());
        let err = engine.deposit(request(Direction::Long, 0, "alice")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidAmount);
    }

    #[test]
    fn venue_failure_leaves_no_trace() {
        let mut venue = MockYieldVenuePort::new();
        venue.expect_supply().returning(|_, _, _| {
            Err(VenueError::Unavailable {
                message: "paused".into(),
            })
        });

        let mut engine = engine(market_at(0, 1), venue);
        let err = engine.deposit(request(Direction::Long, 10, "alice")).unwrap_err();

        assert_eq!(err.code(), ErrorCode::CollaboratorFailure);
        let key = PoolKey::new(market_id(), Tier::T1, Direction::Long, 0);
        assert!(engine.pool_state(&key).is_none());
        assert_eq!(engine.share_balance(&AccountId::new("alice"), &key), 0);
    }

    #[test]
    fn ledger_failure_on_begin_rejects_deposit() {
        use crate::application::ports::{LedgerError, MockLedgerPort};

        let mut ledger = MockLedgerPort::new();
        ledger
            .expect_begin()
            .returning(|| Err(LedgerError::Unavailable { message: "down".into() }));

        let mut engine = TrailingStopEngine::new(
            Arc::new(market_at(0, 1)),
            Arc::new(plain_venue()),
            Arc::new(ledger),
            Arc::new(quiet_publisher()),
            EngineSettings::for_account(AccountId::new("engine")),
        );
        let err = engine.deposit(request(Direction::Long, 10, "alice")).unwrap_err();
        assert_eq!(err.context_value("collaborator"), Some("ledger"));
    }

    #[test]
    fn preview_matches_deposit() {
        let mut engine = engine(market_at(0, 1), plain_venue());
        assert_eq!(
            engine
                .preview_deposit(&market_id(), Tier::T1, Direction::Long, 10)
                .unwrap(),
            10
        );
        engine.deposit(request(Direction::Long, 10, "alice")).unwrap();
        assert_eq!(
            engine
                .preview_deposit(&market_id(), Tier::T1, Direction::Long, 5)
                .unwrap(),
            5
        );
    }
}
