//! Trailing Stop Engine
//!
//! Owns the [`PoolBook`] and drives every mutating operation through one unit
//! of work on the host ledger. The operations themselves live next to this
//! file (`deposit`, `execute`, `track_price`, `withdraw`); this module holds
//! construction, the unit-of-work wrapper and the read side.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::application::ports::{
    ANY_SLIPPAGE_BPS, EventPublisherPort, LedgerPort, MarketPort, YieldVenuePort,
};
use crate::domain::shared::{AccountId, MarketId};
use crate::domain::trailing_stop::{
    Direction, PoolBook, PoolEvent, PoolKey, Position, SeriesKey, Tier, TrailingPool,
};
use crate::error::EngineError;
use crate::observability;

/// Who receives venue yield earned by resting principal at execution time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YieldAttribution {
    /// Yield is swapped together with the principal.
    #[default]
    Depositors,
    /// Yield is resupplied to the venue on behalf of this account.
    Recipient(AccountId),
}

/// Engine-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Account the engine supplies to and withdraws from on the venue.
    pub account: AccountId,
    /// Yield routing on execution.
    pub yield_attribution: YieldAttribution,
    /// Slippage tolerance passed to every execution swap.
    pub execution_slippage_bps: u32,
}

impl EngineSettings {
    /// Settings with default attribution and slippage for `account`.
    #[must_use]
    pub fn for_account(account: AccountId) -> Self {
        Self {
            account,
            yield_attribution: YieldAttribution::Depositors,
            execution_slippage_bps: ANY_SLIPPAGE_BPS,
        }
    }
}

/// The pooled trailing-stop engine.
///
/// Every mutating method takes `&mut self`; callers that share an engine go
/// through [`crate::infrastructure::service::EngineService`], which owns it on a
/// single task.
pub struct TrailingStopEngine<M, V, L, P>
where
    M: MarketPort,
    V: YieldVenuePort,
    L: LedgerPort,
    P: EventPublisherPort,
{
    pub(super) market: Arc<M>,
    pub(super) venue: Arc<V>,
    ledger: Arc<L>,
    publisher: Arc<P>,
    pub(super) settings: EngineSettings,
    pub(super) book: PoolBook,
}

impl<M, V, L, P> TrailingStopEngine<M, V, L, P>
where
    M: MarketPort,
    V: YieldVenuePort,
    L: LedgerPort,
    P: EventPublisherPort,
{
    /// Create an engine with an empty book.
    pub fn new(
        market: Arc<M>,
        venue: Arc<V>,
        ledger: Arc<L>,
        publisher: Arc<P>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            market,
            venue,
            ledger,
            publisher,
            settings,
            book: PoolBook::new(),
        }
    }

    /// Engine settings.
    #[must_use]
    pub const fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Read-only view of the book.
    #[must_use]
    pub const fn book(&self) -> &PoolBook {
        &self.book
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// State of one pool, if it was ever created.
    #[must_use]
    pub fn pool_state(&self, key: &PoolKey) -> Option<&TrailingPool> {
        self.book.pool(key)
    }

    /// Shares `owner` holds in `pool`.
    #[must_use]
    pub fn share_balance(&self, owner: &AccountId, pool: &PoolKey) -> u128 {
        self.book.share_balance(owner, pool)
    }

    /// Epoch deposits into a series currently target.
    #[must_use]
    pub fn current_epoch(&self, market: &MarketId, tier: Tier, direction: Direction) -> u64 {
        self.book
            .current_epoch(&SeriesKey::new(market.clone(), tier, direction))
    }

    /// Every holding of `owner`.
    #[must_use]
    pub fn positions_of(&self, owner: &AccountId) -> Vec<Position> {
        self.book.positions_of(owner)
    }

    /// Open pools on `market`, sorted by key.
    #[must_use]
    pub fn open_pools(&self, market: &MarketId) -> Vec<(PoolKey, TrailingPool)> {
        self.book
            .pools_in_market(market)
            .into_iter()
            .filter(|(_, pool)| pool.is_open())
            .map(|(key, pool)| (key, pool.clone()))
            .collect()
    }

    // =========================================================================
    // Unit of work
    // =========================================================================

    /// Run `operation` inside one ledger unit of work.
    ///
    /// On failure the book is restored from a snapshot and the ledger rolled
    /// back. Events are published only after commit; publisher failures are
    /// logged and never undo state.
    pub(super) fn atomically<T>(
        &mut self,
        operation: &'static str,
        body: impl FnOnce(&mut Self) -> Result<(T, Vec<PoolEvent>), EngineError>,
    ) -> Result<T, EngineError> {
        self.ledger.begin()?;
        let snapshot = self.book.clone();

        let outcome = body(self).and_then(|done| {
            self.ledger.commit()?;
            Ok(done)
        });

        match outcome {
            Ok((value, events)) => {
                self.publish(&events);
                observability::update_open_pools(self.book.open_pool_count());
                Ok(value)
            }
            Err(err) => {
                self.book = snapshot;
                if let Err(rollback_err) = self.ledger.rollback() {
                    tracing::error!(
                        operation,
                        error = %rollback_err,
                        "ledger rollback failed"
                    );
                }
                observability::record_rejection(operation, err.reason());
                tracing::debug!(operation, error = %err, "operation rolled back");
                Err(err)
            }
        }
    }

    fn publish(&self, events: &[PoolEvent]) {
        for event in events {
            if let Err(err) = self.publisher.publish(event) {
                tracing::warn!(
                    event_type = event.event_type(),
                    pool = %event.pool(),
                    error = %err,
                    "failed to publish pool event"
                );
            }
        }
    }
}
