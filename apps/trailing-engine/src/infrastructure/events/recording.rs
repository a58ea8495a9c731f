//! In-memory event publisher that keeps every event.

use std::sync::{PoisonError, RwLock};

use crate::application::ports::{EventPublishError, EventPublisherPort};
use crate::domain::trailing_stop::PoolEvent;

/// Publisher that records events in publication order.
#[derive(Debug, Default)]
pub struct RecordingEventPublisher {
    events: RwLock<Vec<PoolEvent>>,
}

impl RecordingEventPublisher {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every event recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<PoolEvent> {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drain recorded events.
    pub fn take(&self) -> Vec<PoolEvent> {
        std::mem::take(&mut *self.events.write().unwrap_or_else(PoisonError::into_inner))
    }
}

impl EventPublisherPort for RecordingEventPublisher {
    fn publish(&self, event: &PoolEvent) -> Result<(), EventPublishError> {
        self.events
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
        Ok(())
    }
}
