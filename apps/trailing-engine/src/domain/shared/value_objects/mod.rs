//! Shared Value Objects
//!
//! Immutable domain types used across bounded contexts.

mod identifiers;
mod timestamp;

pub use identifiers::{AccountId, AssetId, EventId, MarketId};
pub use timestamp::Timestamp;
