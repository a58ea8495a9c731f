//! Event publisher that writes each event to the log as JSON.

use crate::application::ports::{EventPublishError, EventPublisherPort};
use crate::domain::trailing_stop::PoolEvent;

/// Publisher that emits one `info` log line per event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventPublisher;

impl EventPublisherPort for TracingEventPublisher {
    fn publish(&self, event: &PoolEvent) -> Result<(), EventPublishError> {
        let payload =
            serde_json::to_string(event).map_err(|e| EventPublishError::SerializationError {
                message: e.to_string(),
            })?;
        tracing::info!(
            target: "trailing_engine::events",
            event_type = event.event_type(),
            pool = %event.pool(),
            payload = %payload,
            "pool event"
        );
        Ok(())
    }
}
