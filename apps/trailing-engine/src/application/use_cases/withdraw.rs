//! Withdraw Use Case

use crate::application::dto::{WithdrawRequest, WithdrawalReceipt};
use crate::application::ports::{EventPublisherPort, LedgerPort, MarketPort, YieldVenuePort};
use crate::domain::shared::{AccountId, EventId, Timestamp};
use crate::domain::trailing_stop::{
    PoolEvent, PoolKey, PoolStatus, PoolWithdrawn, ShareKey, TrailingStopError,
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
    /// Burn `shares` of one pool and pay the pro-rata claim.
    ///
    /// Open pools pay principal in the deposit asset; executed pools pay
    /// proceeds in the opposite asset at the rate fixed on execution.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` for zero shares or a payout that rounds to zero,
    /// `InsufficientShares` beyond the caller's balance, `PoolNotOpen` for an
    /// open pool without principal, `CollaboratorFailure` on venue failure.
    #[tracing::instrument(
        skip(self, request),
        fields(pool = %request.pool, shares = request.shares, owner = %request.owner)
    )]
    pub fn withdraw(&mut self, request: WithdrawRequest) -> Result<WithdrawalReceipt, EngineError> {
        if request.shares == 0 {
            observability::record_rejection("withdraw", "INVALID_AMOUNT");
            return Err(TrailingStopError::ZeroAmount { field: "shares" }.into());
        }

        let receipt = self.atomically("withdraw", |engine| engine.apply_withdrawal(&request))?;

        observability::record_withdrawal(receipt.pool.market.as_str(), receipt.post_execution);
        tracing::info!(
            amount_out = receipt.amount_out,
            asset = %receipt.asset,
            post_execution = receipt.post_execution,
            "withdrawal committed"
        );
        Ok(receipt)
    }

    /// Amount burning `shares` would pay right now.
    ///
    /// # Errors
    ///
    /// Same validation as [`Self::withdraw`].
    pub fn preview_withdraw(
        &self,
        owner: &AccountId,
        pool: &PoolKey,
        shares: u128,
    ) -> Result<u128, EngineError> {
        self.check_balance(owner, pool, shares)?;
        let state = self.book.pool(pool).ok_or_else(|| unknown_pool(pool))?;
        Ok(state.preview_redeem(shares)?.amount_out)
    }

    fn check_balance(
        &self,
        owner: &AccountId,
        pool: &PoolKey,
        shares: u128,
    ) -> Result<(), TrailingStopError> {
        if shares == 0 {
            return Err(TrailingStopError::ZeroAmount { field: "shares" });
        }
        let available = self.book.share_balance(owner, pool);
        if shares > available {
            return Err(TrailingStopError::InsufficientShares {
                requested: shares,
                available,
            });
        }
        Ok(())
    }

    fn apply_withdrawal(
        &mut self,
        request: &WithdrawRequest,
    ) -> Result<(WithdrawalReceipt, Vec<PoolEvent>), EngineError> {
        let key = &request.pool;
        self.check_balance(&request.owner, key, request.shares)?;

        let redemption = self
            .book
            .pool_mut(key)
            .ok_or_else(|| unknown_pool(key))?
            .redeem(request.shares)?;
        self.book.debit(
            &ShareKey::new(request.owner.clone(), key.clone()),
            request.shares,
        )?;

        let post_execution = redemption.status == PoolStatus::Executed;
        let pair = self.market.pair(&key.market)?;
        let asset = if post_execution {
            pair.proceeds_asset(key.direction)
        } else {
            pair.deposit_asset(key.direction)
        };

        let delivered = if redemption.amount_out > 0 {
            self.venue
                .withdraw(asset, redemption.amount_out, &request.owner)?
        } else {
            0
        };

        let receipt = WithdrawalReceipt {
            pool: key.clone(),
            owner: request.owner.clone(),
            shares: request.shares,
            amount_out: redemption.amount_out,
            asset: asset.clone(),
            delivered,
            post_execution,
        };
        let event = PoolEvent::Withdrawn(PoolWithdrawn {
            event_id: EventId::generate(),
            pool: key.clone(),
            owner: request.owner.clone(),
            shares: request.shares,
            amount_out: redemption.amount_out,
            post_execution,
            occurred_at: Timestamp::now(),
        });
        Ok((receipt, vec![event]))
    }
}

fn unknown_pool(key: &PoolKey) -> TrailingStopError {
    TrailingStopError::PoolNotOpen {
        reason: format!("no pool at {key}"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicI32, Ordering};

    use super::super::engine::test_support::*;
    use crate::application::dto::DepositRequest;
    use crate::application::ports::{MockMarketPort, MockYieldVenuePort, VenueError};
    use crate::domain::trailing_stop::{Direction, Tier};
    use crate::error::ErrorCode;

    use super::*;

    fn deposit(engine: &mut MockEngine, who: &str, amount: u128) -> PoolKey {
        engine
            .deposit(DepositRequest {
                market: market_id(),
                tier: Tier::T1,
                direction: Direction::Long,
                amount,
                depositor: AccountId::new(who),
            })
            .unwrap()
            .pool
    }

    fn withdraw(pool: &PoolKey, who: &str, shares: u128) -> WithdrawRequest {
        WithdrawRequest {
            pool: pool.clone(),
            shares,
            owner: AccountId::new(who),
        }
    }

    #[test]
    fn open_withdrawal_returns_principal() {
        let mut engine = engine(market_at(0, 1), plain_venue());
        let key = deposit(&mut engine, "alice", 10);

        let receipt = engine.withdraw(withdraw(&key, "alice", 4)).unwrap();
        assert_eq!(receipt.amount_out, 4);
        assert_eq!(receipt.asset.as_str(), "ETH");
        assert!(!receipt.post_execution);
        assert_eq!(engine.share_balance(&AccountId::new("alice"), &key), 6);
        assert_eq!(engine.pool_state(&key).unwrap().total_principal(), 6);
    }

    #[test]
    fn executed_withdrawal_pays_fixed_rate() {
        // 15 principal swapped into 18 proceeds: 6 per 5 shares.
        let tick = Arc::new(AtomicI32::new(0));
        let mut market = MockMarketPort::new();
        market.expect_pair().returning(|_| Ok(pair()));
        let reader = Arc::clone(&tick);
        market
            .expect_current_tick()
            .returning(move |_| Ok(reader.load(Ordering::SeqCst)));
        market
            .expect_swap()
            .returning(|request| Ok(request.amount_in * 6 / 5));

        let mut engine = engine(market, plain_venue());
        let key = deposit(&mut engine, "alice", 10);
        deposit(&mut engine, "bob", 5);
        tick.store(-600, Ordering::SeqCst);
        engine.try_execute(&market_id(), Tier::T1).unwrap();

        let receipt = engine.withdraw(withdraw(&key, "bob", 5)).unwrap();
        assert_eq!(receipt.amount_out, 6);
        assert_eq!(receipt.asset.as_str(), "USDC");
        assert!(receipt.post_execution);

        let receipt = engine.withdraw(withdraw(&key, "alice", 10)).unwrap();
        assert_eq!(receipt.amount_out, 12);

        let pool = engine.pool_state(&key).unwrap();
        assert_eq!(pool.total_shares(), 15);
        assert_eq!(pool.executed_output(), 18);
        assert_eq!(pool.paid_output(), 18);
    }

    #[test]
    fn over_withdrawal_is_rejected() {
        let mut engine = engine(market_at(0, 1), plain_venue());
        let key = deposit(&mut engine, "alice", 10);

        let err = engine.withdraw(withdraw(&key, "alice", 11)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InsufficientShares);
        assert_eq!(engine.share_balance(&AccountId::new("alice"), &key), 10);
    }

    #[test]
    fn zero_shares_is_invalid_amount() {
        let mut engine = engine(market_at(0, 1), plain_venue());
        let key = deposit(&mut engine, "alice", 10);
        let err = engine.withdraw(withdraw(&key, "alice", 0)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidAmount);
    }

    #[test]
    fn venue_failure_restores_shares() {
        let mut venue = MockYieldVenuePort::new();
        venue.expect_supply().returning(|_, _, _| Ok(()));
        venue.expect_withdraw().returning(|asset, requested, _| {
            Err(VenueError::InsufficientBalance {
                asset: asset.clone(),
                requested,
                available: 0,
            })
        });

        let mut engine = engine(market_at(0, 1), venue);
        let key = deposit(&mut engine, "alice", 10);
        let err = engine.withdraw(withdraw(&key, "alice", 10)).unwrap_err();

        assert_eq!(err.code(), ErrorCode::CollaboratorFailure);
        assert_eq!(engine.share_balance(&AccountId::new("alice"), &key), 10);
        assert_eq!(engine.pool_state(&key).unwrap().total_principal(), 10);
    }

    #[test]
    fn preview_matches_withdrawal() {
        let mut engine = engine(market_at(0, 1), plain_venue());
        let key = deposit(&mut engine, "alice", 10);
        let alice = AccountId::new("alice");

        assert_eq!(engine.preview_withdraw(&alice, &key, 3).unwrap(), 3);
        assert_eq!(
            engine.preview_withdraw(&alice, &key, 30).unwrap_err().code(),
            ErrorCode::InsufficientShares
        );
    }
}
