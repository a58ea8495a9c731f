//! In-memory simulation used by the binary: markets, venue yield and a
//! scripted scenario.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Simulation configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Markets to list.
    #[serde(default)]
    pub markets: Vec<MarketConfig>,
    /// Yield venue behaviour.
    #[serde(default)]
    pub venue: VenueConfig,
    /// Steps replayed in order.
    #[serde(default)]
    pub scenario: Vec<ScenarioStep>,
}

/// One simulated market.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Market identifier, e.g. `ETH-USDC`.
    pub id: String,
    /// Long deposit asset.
    pub asset_a: String,
    /// Short deposit asset.
    pub asset_b: String,
    /// Opening tick.
    #[serde(default)]
    pub tick: i32,
    /// Output per input when selling `asset_a`.
    #[serde(default)]
    pub long_rate: RateConfig,
    /// Output per input when selling `asset_b`.
    #[serde(default)]
    pub short_rate: RateConfig,
    /// Output-side liquidity cap; unlimited when absent.
    #[serde(default)]
    pub liquidity: Option<u64>,
    /// Simulated slippage on every fill.
    #[serde(default)]
    pub slippage_bps: u32,
}

/// Integer exchange rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateConfig {
    /// Output units.
    pub numerator: u64,
    /// Input units.
    pub denominator: u64,
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            numerator: 1,
            denominator: 1,
        }
    }
}

/// Yield venue behaviour.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VenueConfig {
    /// Yield paid on withdrawal per asset, in basis points.
    #[serde(default)]
    pub yield_bps: BTreeMap<String, u32>,
}

/// One scripted step.
///
/// Tier and direction stay textual until replay, where an unknown value
/// rejects the step with `INVALID_REQUEST`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScenarioStep {
    /// Deposit principal.
    Deposit {
        /// Market.
        market: String,
        /// Tier name (`T1`) or width (`5%`, `500bp`).
        tier: String,
        /// `long` or `short`.
        direction: String,
        /// Principal.
        amount: u64,
        /// Depositor.
        account: String,
    },
    /// Trade the market to a tick and deliver the price update.
    Move {
        /// Market.
        market: String,
        /// Target tick.
        tick: i32,
    },
    /// Manual trigger, for one tier or all.
    TryExecute {
        /// Market.
        market: String,
        /// Tier; every tier when absent.
        #[serde(default)]
        tier: Option<String>,
    },
    /// Withdraw shares.
    Withdraw {
        /// Market.
        market: String,
        /// Tier.
        tier: String,
        /// Direction.
        direction: String,
        /// Epoch; the current one when absent.
        #[serde(default)]
        epoch: Option<u64>,
        /// Share holder.
        account: String,
        /// Shares to burn; the whole balance when absent.
        #[serde(default)]
        shares: Option<u64>,
    },
}
