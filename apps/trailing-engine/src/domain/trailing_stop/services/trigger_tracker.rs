//! Trigger Tracker Domain Service
//!
//! Turns a tick move into two things: extrema ratchets on the pools the move
//! favours, and the list of pools on the other side whose trigger it crossed.
//! Executing those pools is left to the application layer since it needs the
//! market and yield venue.

use crate::domain::shared::MarketId;
use crate::domain::trailing_stop::book::PoolBook;
use crate::domain::trailing_stop::value_objects::{Direction, PoolKey, SeriesKey, Tier, TickMovement};

/// Result of applying one tick move to the book.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerSweep {
    /// Pools whose extremum moved.
    pub ratcheted: Vec<PoolKey>,
    /// Current-epoch pools whose trigger was crossed, in tier order.
    pub crossed: Vec<PoolKey>,
}

impl TriggerSweep {
    /// Whether the move changed nothing and crossed nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ratcheted.is_empty() && self.crossed.is_empty()
    }
}

/// Stateless ratchet and trigger checks over a [`PoolBook`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TriggerTracker;

impl TriggerTracker {
    /// Apply a move from `previous` to `current` on `market`.
    ///
    /// Up moves ratchet Long pools and may cross Short triggers; down moves do
    /// the opposite. Flat moves are a no-op.
    pub fn sweep(
        book: &mut PoolBook,
        market: &MarketId,
        previous: i32,
        current: i32,
    ) -> TriggerSweep {
        let movement = TickMovement::between(previous, current);
        if movement == TickMovement::Flat {
            return TriggerSweep::default();
        }

        let mut sweep = TriggerSweep::default();
        for direction in [Direction::Long, Direction::Short] {
            if direction.ratchets_on() == movement {
                sweep
                    .ratcheted
                    .extend(Self::ratchet(book, market, direction, current));
            }
            if direction.executes_on() == movement {
                sweep
                    .crossed
                    .extend(Self::crossed(book, market, direction, current));
            }
        }
        sweep
    }

    /// Ratchet the current-epoch pools of one direction toward `tick`.
    ///
    /// Empty pools are skipped.
    pub fn ratchet(
        book: &mut PoolBook,
        market: &MarketId,
        direction: Direction,
        tick: i32,
    ) -> Vec<PoolKey> {
        let mut moved = Vec::new();
        for tier in Tier::ALL {
            let key = book.current_key(&SeriesKey::new(market.clone(), tier, direction));
            if let Some(pool) = book.pool_mut(&key)
                && pool.total_shares() > 0
                && pool.observe_tick(tick)
            {
                moved.push(key);
            }
        }
        moved
    }

    /// Current-epoch pools of one direction whose trigger `tick` has crossed.
    #[must_use]
    pub fn crossed(
        book: &PoolBook,
        market: &MarketId,
        direction: Direction,
        tick: i32,
    ) -> Vec<PoolKey> {
        Tier::ALL
            .into_iter()
            .filter_map(|tier| Self::crossed_in_tier(book, market, tier, direction, tick))
            .collect()
    }

    /// The current-epoch pool of one series if `tick` crossed its trigger.
    #[must_use]
    pub fn crossed_in_tier(
        book: &PoolBook,
        market: &MarketId,
        tier: Tier,
        direction: Direction,
        tick: i32,
    ) -> Option<PoolKey> {
        let series = SeriesKey::new(market.clone(), tier, direction);
        book.current_pool(&series)
            .filter(|(_, pool)| pool.is_triggered_at(tick))
            .map(|(key, _)| key)
    }
}
