//! Market adapters.

mod in_memory;

pub use in_memory::{InMemoryMarket, MarketState, SwapRate};
