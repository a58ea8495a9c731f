//! Shared Domain Types
//!
//! Identifiers, timestamps and checked integer math shared across bounded contexts.

pub mod errors;
pub mod math;
pub mod value_objects;

pub use errors::ArithmeticError;
pub use value_objects::{AccountId, AssetId, EventId, MarketId, Timestamp};
