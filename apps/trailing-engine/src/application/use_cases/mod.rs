//! Application Use Cases
//!
//! Use cases orchestrate domain logic to fulfill application requirements.
//! All of them are methods on [`TrailingStopEngine`], one file per operation.

mod deposit;
mod engine;
mod execute;
mod track_price;
mod withdraw;

pub use engine::{EngineSettings, TrailingStopEngine, YieldAttribution};
