//! Host ledger adapters.

mod in_memory;

pub use in_memory::{BalanceKey, HostState, InMemoryLedger, SharedHostState};
