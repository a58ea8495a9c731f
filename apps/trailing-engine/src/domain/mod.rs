//! Domain Layer
//!
//! The innermost layer containing business logic with zero infrastructure dependencies.
//! This layer defines:
//!
//! - **Aggregates**: Consistency boundaries with invariants
//! - **Value Objects**: Immutable domain types with equality by value
//! - **Domain Events**: Records of state transitions
//! - **Domain Services**: Stateless business logic
//!
//! # Bounded Contexts
//!
//! - [`trailing_stop`]: Pooled tiered trailing stops
//! - [`shared`]: Identifiers, timestamps and checked integer math

pub mod shared;
pub mod trailing_stop;
