//! Engine configuration.

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::application::ports::ANY_SLIPPAGE_BPS;
use crate::application::use_cases::{EngineSettings, YieldAttribution};
use crate::domain::shared::AccountId;

/// Where venue yield goes at execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YieldMode {
    /// Swap yield together with principal.
    #[default]
    Depositors,
    /// Resupply yield for `yield_recipient`.
    Recipient,
}

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Venue account the engine supplies to and withdraws from.
    #[serde(default = "default_account")]
    pub account: String,
    /// Yield routing on execution.
    #[serde(default)]
    pub yield_attribution: YieldMode,
    /// Required when `yield_attribution` is `recipient`.
    #[serde(default)]
    pub yield_recipient: Option<String>,
    /// Slippage tolerance for execution swaps (10000 accepts any output).
    #[serde(default = "default_slippage_bps")]
    pub execution_slippage_bps: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            account: default_account(),
            yield_attribution: YieldMode::default(),
            yield_recipient: None,
            execution_slippage_bps: default_slippage_bps(),
        }
    }
}

impl EngineConfig {
    /// Resolve into engine settings.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` when recipient mode has no recipient.
    pub fn settings(&self) -> Result<EngineSettings, ConfigError> {
        let yield_attribution = match self.yield_attribution {
            YieldMode::Depositors => YieldAttribution::Depositors,
            YieldMode::Recipient => {
                let recipient = self
                    .yield_recipient
                    .as_deref()
                    .filter(|r| !r.is_empty())
                    .ok_or_else(|| {
                        ConfigError::ValidationError(
                            "engine.yield_recipient is required when yield_attribution is recipient"
                                .to_string(),
                        )
                    })?;
                YieldAttribution::Recipient(AccountId::new(recipient))
            }
        };
        Ok(EngineSettings {
            account: AccountId::new(&self.account),
            yield_attribution,
            execution_slippage_bps: self.execution_slippage_bps,
        })
    }
}

fn default_account() -> String {
    "trailing-engine".to_string()
}

const fn default_slippage_bps() -> u32 {
    ANY_SLIPPAGE_BPS
}
