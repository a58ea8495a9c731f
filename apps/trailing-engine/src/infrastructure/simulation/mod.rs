//! In-memory simulation: adapter wiring and scenario replay.

mod builder;
mod scenario;

pub use builder::{SimulatedEngine, Simulation};
pub use scenario::{ScenarioRunner, StepOutcome, StepReport};
