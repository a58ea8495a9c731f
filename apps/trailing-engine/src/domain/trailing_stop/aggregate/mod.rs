//! Trailing Stop Aggregates

mod trailing_pool;

pub use trailing_pool::{ExecutionSettlement, PoolStatus, Redemption, TrailingPool};
