//! Trailing Stop Domain Services

mod trigger_tracker;

pub use trigger_tracker::{TriggerSweep, TriggerTracker};
