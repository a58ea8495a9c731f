//! Engine service runtime configuration.

use serde::{Deserialize, Serialize};

/// Engine service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Bounded command queue size.
    #[serde(default = "default_command_capacity")]
    pub command_capacity: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            command_capacity: default_command_capacity(),
        }
    }
}

const fn default_command_capacity() -> usize {
    256
}
