//! Event Publisher Port (Driven Port)
//!
//! Interface for publishing pool events. Publication happens after the unit of
//! work commits, so a failing publisher never undoes engine state.

use crate::domain::trailing_stop::PoolEvent;

/// Event publishing error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EventPublishError {
    /// Connection error.
    #[error("Event publish connection error: {message}")]
    ConnectionError {
        /// Detail.
        message: String,
    },

    /// Serialization error.
    #[error("Event serialization error: {message}")]
    SerializationError {
        /// Detail.
        message: String,
    },

    /// Publishing failed.
    #[error("Event publish failed: {message}")]
    PublishFailed {
        /// Detail.
        message: String,
    },
}

/// Port for publishing pool events.
#[cfg_attr(test, mockall::automock)]
pub trait EventPublisherPort: Send + Sync {
    /// Publish a single event.
    ///
    /// # Errors
    ///
    /// Transport or serialization failure.
    fn publish(&self, event: &PoolEvent) -> Result<(), EventPublishError>;
}

/// No-op event publisher for testing.
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

impl EventPublisherPort for NoOpEventPublisher {
    fn publish(&self, _event: &PoolEvent) -> Result<(), EventPublishError> {
        Ok(())
    }
}
