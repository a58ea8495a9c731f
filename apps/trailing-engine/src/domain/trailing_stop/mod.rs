//! Trailing Stop Bounded Context
//!
//! Pooled, share-accounted trailing stops. Participants co-fund a pool per
//! `(market, tier, direction)` series; the pool trails the best tick seen and
//! is swapped in one go once price retraces through its tier's trigger.

pub mod aggregate;
pub mod book;
pub mod errors;
pub mod events;
pub mod services;
pub mod value_objects;

pub use aggregate::{ExecutionSettlement, PoolStatus, Redemption, TrailingPool};
pub use book::{PoolBook, Position};
pub use errors::TrailingStopError;
pub use events::{PoolDeposited, PoolEvent, PoolExecuted, PoolWithdrawn};
pub use services::{TriggerSweep, TriggerTracker};
pub use value_objects::{Direction, MarketPair, PoolKey, SeriesKey, ShareKey, Tier, TickMovement};
