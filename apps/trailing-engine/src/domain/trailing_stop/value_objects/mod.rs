//! Trailing Stop Value Objects

mod direction;
mod keys;
mod market_pair;
mod tier;

pub use direction::{Direction, TickMovement};
pub use keys::{PoolKey, SeriesKey, ShareKey};
pub use market_pair::MarketPair;
pub use tier::Tier;
