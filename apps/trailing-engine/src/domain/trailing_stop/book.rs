//! Pool Book
//!
//! Arena holding every pool, share row and epoch counter, keyed by the
//! composite keys in [`super::value_objects`]. The engine snapshots the whole
//! book before a mutating operation and restores it on failure, so the book is
//! a plain `Clone` value with no interior mutability.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::aggregate::TrailingPool;
use super::errors::TrailingStopError;
use super::value_objects::{PoolKey, SeriesKey, ShareKey};
use crate::domain::shared::{AccountId, ArithmeticError, MarketId, math};

/// One participant holding in one pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Pool the shares belong to.
    pub pool: PoolKey,
    /// Shares held.
    pub shares: u128,
}

/// In-memory store of pools, share balances and epoch counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolBook {
    pools: HashMap<PoolKey, TrailingPool>,
    balances: HashMap<ShareKey, u128>,
    epochs: HashMap<SeriesKey, u64>,
}

impl PoolBook {
    /// Create an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Epochs
    // =========================================================================

    /// Current epoch of a series; zero if never executed.
    #[must_use]
    pub fn current_epoch(&self, series: &SeriesKey) -> u64 {
        self.epochs.get(series).copied().unwrap_or_default()
    }

    /// Key of the pool deposits currently target.
    #[must_use]
    pub fn current_key(&self, series: &SeriesKey) -> PoolKey {
        series.at_epoch(self.current_epoch(series))
    }

    /// Bump the epoch of a series, returning the new value.
    ///
    /// # Errors
    ///
    /// Overflow of the counter.
    pub fn advance_epoch(&mut self, series: &SeriesKey) -> Result<u64, TrailingStopError> {
        let next = self
            .current_epoch(series)
            .checked_add(1)
            .ok_or(ArithmeticError::Overflow)?;
        self.epochs.insert(series.clone(), next);
        Ok(next)
    }

    // =========================================================================
    // Pools
    // =========================================================================

    /// Pool at `key`, if it was ever created.
    #[must_use]
    pub fn pool(&self, key: &PoolKey) -> Option<&TrailingPool> {
        self.pools.get(key)
    }

    /// Mutable pool at `key`.
    pub fn pool_mut(&mut self, key: &PoolKey) -> Option<&mut TrailingPool> {
        self.pools.get_mut(key)
    }

    /// Current-epoch pool of a series, if created.
    #[must_use]
    pub fn current_pool(&self, series: &SeriesKey) -> Option<(PoolKey, &TrailingPool)> {
        let key = self.current_key(series);
        self.pools.get(&key).map(|pool| (key, pool))
    }

    /// Current-epoch pool of a series, created empty on first use.
    pub fn current_pool_or_create(&mut self, series: &SeriesKey) -> (PoolKey, &mut TrailingPool) {
        let key = self.current_key(series);
        let pool = self
            .pools
            .entry(key.clone())
            .or_insert_with(|| TrailingPool::new(series.tier, series.direction));
        (key, pool)
    }

    /// All pools on `market`, sorted by key.
    #[must_use]
    pub fn pools_in_market(&self, market: &MarketId) -> Vec<(PoolKey, &TrailingPool)> {
        let mut pools: Vec<_> = self
            .pools
            .iter()
            .filter(|(key, _)| &key.market == market)
            .map(|(key, pool)| (key.clone(), pool))
            .collect();
        pools.sort_by(|a, b| a.0.cmp(&b.0));
        pools
    }

    /// Number of open pools holding principal.
    #[must_use]
    pub fn open_pool_count(&self) -> usize {
        self.pools
            .values()
            .filter(|pool| pool.is_open() && pool.total_shares() > 0)
            .count()
    }

    // =========================================================================
    // Share ledger
    // =========================================================================

    /// Shares held by `owner` in `pool`.
    #[must_use]
    pub fn share_balance(&self, owner: &AccountId, pool: &PoolKey) -> u128 {
        self.balances
            .get(&ShareKey::new(owner.clone(), pool.clone()))
            .copied()
            .unwrap_or_default()
    }

    /// Add `shares` to a holder's row.
    ///
    /// # Errors
    ///
    /// Overflow of the row.
    pub fn credit(&mut self, key: ShareKey, shares: u128) -> Result<u128, TrailingStopError> {
        let row = self.balances.entry(key).or_default();
        *row = math::add(*row, shares)?;
        Ok(*row)
    }

    /// Remove `shares` from a holder's row; empty rows are dropped.
    ///
    /// # Errors
    ///
    /// `InsufficientShares` when the row holds less than `shares`.
    pub fn debit(&mut self, key: &ShareKey, shares: u128) -> Result<u128, TrailingStopError> {
        let available = self.balances.get(key).copied().unwrap_or_default();
        if shares > available {
            return Err(TrailingStopError::InsufficientShares {
                requested: shares,
                available,
            });
        }
        let remaining = available - shares;
        if remaining == 0 {
            self.balances.remove(key);
        } else {
            self.balances.insert(key.clone(), remaining);
        }
        Ok(remaining)
    }

    /// Every non-empty holding of `owner`, sorted by pool.
    #[must_use]
    pub fn positions_of(&self, owner: &AccountId) -> Vec<Position> {
        let mut positions: Vec<_> = self
            .balances
            .iter()
            .filter(|(key, _)| &key.owner == owner)
            .map(|(key, shares)| Position {
                pool: key.pool.clone(),
                shares: *shares,
            })
            .collect();
        positions.sort_by(|a, b| a.pool.cmp(&b.pool));
        positions
    }

    /// Sum of all share rows for `pool`.
    #[must_use]
    pub fn outstanding_for(&self, pool: &PoolKey) -> u128 {
        self.balances
            .iter()
            .filter(|(key, _)| &key.pool == pool)
            .map(|(_, shares)| *shares)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trailing_stop::value_objects::{Direction, Tier};

    fn series() -> SeriesKey {
        SeriesKey::new(MarketId::new("ETH-USDC"), Tier::T1, Direction::Long)
    }

    #[test]
    fn epochs_start_at_zero_and_advance() {
        let mut book = PoolBook::new();
        assert_eq!(book.current_epoch(&series()), 0);
        assert_eq!(book.advance_epoch(&series()).unwrap(), 1);
        assert_eq!(book.current_key(&series()).epoch, 1);
    }

    #[test]
    fn pools_are_created_lazily() {
        let mut book = PoolBook::new();
        assert!(book.current_pool(&series()).is_none());
        let (key, pool) = book.current_pool_or_create(&series());
        assert_eq!(key.epoch, 0);
        assert!(pool.is_open());
        assert!(book.current_pool(&series()).is_some());
    }

    #[test]
    fn new_epoch_gets_fresh_pool() {
        let mut book = PoolBook::new();
        {
            let (_, pool) = book.current_pool_or_create(&series());
            pool.observe_tick(100);
            pool.mint(10).unwrap();
        }
        book.advance_epoch(&series()).unwrap();
        let (key, pool) = book.current_pool_or_create(&series());
        assert_eq!(key.epoch, 1);
        assert_eq!(pool.highest_tick_ever(), None);
        assert_eq!(pool.total_shares(), 0);
    }

    #[test]
    fn credit_and_debit_rows() {
        let mut book = PoolBook::new();
        let alice = AccountId::new("alice");
        let key = ShareKey::new(alice.clone(), series().at_epoch(0));

        book.credit(key.clone(), 10).unwrap();
        assert_eq!(book.share_balance(&alice, &key.pool), 10);
        assert_eq!(book.debit(&key, 4).unwrap(), 6);
        assert_eq!(
            book.debit(&key, 7),
            Err(TrailingStopError::InsufficientShares {
                requested: 7,
                available: 6
            })
        );
        assert_eq!(book.debit(&key, 6).unwrap(), 0);
        assert!(book.positions_of(&alice).is_empty());
    }

    #[test]
    fn positions_and_outstanding() {
        let mut book = PoolBook::new();
        let alice = AccountId::new("alice");
        let bob = AccountId::new("bob");
        let pool = series().at_epoch(0);

        book.credit(ShareKey::new(alice.clone(), pool.clone()), 10).unwrap();
        book.credit(ShareKey::new(bob, pool.clone()), 5).unwrap();

        assert_eq!(book.outstanding_for(&pool), 15);
        assert_eq!(
            book.positions_of(&alice),
            vec![Position { pool, shares: 10 }]
        );
    }

    #[test]
    fn clone_is_an_independent_snapshot() {
        let mut book = PoolBook::new();
        let snapshot = book.clone();
        book.advance_epoch(&series()).unwrap();
        assert_ne!(book, snapshot);
        assert_eq!(snapshot.current_epoch(&series()), 0);
    }
}
