//! Async service runtime around the engine.

mod actor;

pub use actor::{EngineCommand, EngineHandle, EngineService};
