// Allow unwrap/expect in tests - tests should panic on unexpected errors
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! Trailing Engine - pooled tiered trailing stops
//!
//! Many depositors co-fund a directional trailing stop at one of three fixed
//! tiers. The engine tracks the price, ratchets each pool's extremum, and when
//! the trigger is crossed swaps the whole pool once and pays every holder pro
//! rata from the frozen proceeds.
//!
//! # Architecture (Clean Architecture + DDD + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: share math, pools, the pool book, trigger tracking, events
//!   - `trailing_stop`: tiers, directions, keys, `TrailingPool`, `PoolBook`
//!   - `shared`: identifiers, timestamps, overflow-checked integer math
//!
//! - **Application**: the engine and its ports
//!   - `ports`: `MarketPort`, `YieldVenuePort`, `LedgerPort`, `EventPublisherPort`
//!   - `use_cases`: `TrailingStopEngine` (deposit, track price, execute, withdraw)
//!   - `dto`: requests, receipts and price update reports
//!
//! - **Infrastructure**: in-memory adapters, the engine service and the
//!   config-driven simulation
//!
//! Cross-cutting: `config` (YAML), `observability` (tracing + metrics),
//! `error` (`EngineError` with stable reason codes).

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

/// Domain layer - Core business logic with no external dependencies.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and the async runtime.
pub mod infrastructure;

/// YAML configuration.
pub mod config;

/// Engine error type.
pub mod error;

/// Logging and metrics.
pub mod observability;

pub use application::dto::{
    DepositReceipt, DepositRequest, ExecutionFailure, ExecutionReceipt, PriceUpdate,
    PriceUpdateReport, TierExecution, WithdrawRequest, WithdrawalReceipt,
};
pub use application::ports::{
    EventPublisherPort, LedgerPort, MarketPort, NoOpEventPublisher, NoOpLedger, YieldVenuePort,
};
pub use application::use_cases::{EngineSettings, TrailingStopEngine, YieldAttribution};
pub use domain::shared::{AccountId, AssetId, MarketId, Timestamp};
pub use domain::trailing_stop::{
    Direction, MarketPair, PoolEvent, PoolKey, PoolStatus, Tier, TrailingPool,
};
pub use error::{EngineError, ErrorCode};
pub use infrastructure::service::{EngineHandle, EngineService};
