//! Composite keys for the pool arena.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Direction, Tier};
use crate::domain::shared::{AccountId, MarketId};

/// A `(market, tier, direction)` series; owns one epoch counter.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeriesKey {
    /// Market the pools trade on.
    pub market: MarketId,
    /// Trailing tier.
    pub tier: Tier,
    /// Principal side.
    pub direction: Direction,
}

impl SeriesKey {
    /// Create a series key.
    #[must_use]
    pub const fn new(market: MarketId, tier: Tier, direction: Direction) -> Self {
        Self {
            market,
            tier,
            direction,
        }
    }

    /// The pool of this series at `epoch`.
    #[must_use]
    pub fn at_epoch(&self, epoch: u64) -> PoolKey {
        PoolKey {
            market: self.market.clone(),
            tier: self.tier,
            direction: self.direction,
            epoch,
        }
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.market, self.tier, self.direction)
    }
}

/// Identity of one trailing pool: a series at a specific epoch.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PoolKey {
    /// Market the pool trades on.
    pub market: MarketId,
    /// Trailing tier.
    pub tier: Tier,
    /// Principal side.
    pub direction: Direction,
    /// Epoch within the series.
    pub epoch: u64,
}

impl PoolKey {
    /// Create a pool key.
    #[must_use]
    pub const fn new(market: MarketId, tier: Tier, direction: Direction, epoch: u64) -> Self {
        Self {
            market,
            tier,
            direction,
            epoch,
        }
    }

    /// The series this pool belongs to.
    #[must_use]
    pub fn series(&self) -> SeriesKey {
        SeriesKey::new(self.market.clone(), self.tier, self.direction)
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}#{}",
            self.market, self.tier, self.direction, self.epoch
        )
    }
}

/// A participant's share row in one pool.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ShareKey {
    /// Share holder.
    pub owner: AccountId,
    /// Pool the shares are minted against.
    pub pool: PoolKey,
}

impl ShareKey {
    /// Create a share key.
    #[must_use]
    pub const fn new(owner: AccountId, pool: PoolKey) -> Self {
        Self { owner, pool }
    }
}
