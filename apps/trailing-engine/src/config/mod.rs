//! Configuration loading for the trailing engine.
//!
//! YAML with `${VAR}` / `${VAR:-default}` environment interpolation, validated
//! after parsing.
//!
//! # Usage
//!
//! ```rust,ignore
//! use trailing_engine::config::load_config;
//!
//! let config = load_config(Some("config.yaml"))?;
//! let settings = config.engine.settings()?;
//! ```

mod engine;
mod observability;
mod service;
mod simulation;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::ports::ANY_SLIPPAGE_BPS;

pub use engine::{EngineConfig, YieldMode};
pub use observability::{LoggingConfig, MetricsSettings, ObservabilityConfig};
pub use service::ServiceConfig;
pub use simulation::{MarketConfig, RateConfig, ScenarioStep, SimulationConfig, VenueConfig};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Engine settings.
    #[serde(default)]
    pub engine: EngineConfig,
    /// Logging and metrics.
    #[serde(default)]
    pub observability: ObservabilityConfig,
    /// Service runtime.
    #[serde(default)]
    pub service: ServiceConfig,
    /// In-memory simulation for the binary.
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Load configuration from a YAML file with environment variable interpolation.
///
/// `path` defaults to `config.yaml`.
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or("config.yaml");
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;
    load_config_from_string(&contents)
}

/// Load configuration from a YAML string.
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be parsed or validated.
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: Config = serde_yaml_bw::from_str(&interpolated)?;
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}`. Unset or empty variables
/// without a default become empty strings.
#[allow(clippy::expect_used)] // constant pattern
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    re.replace_all(input, |cap: &regex::Captures<'_>| {
        let default_value = cap.get(2).map_or("", |m| m.as_str());
        match std::env::var(&cap[1]) {
            Ok(v) if !v.is_empty() => v,
            _ => default_value.to_string(),
        }
    })
    .into_owned()
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.engine.account.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "engine.account must not be empty".to_string(),
        ));
    }
    if config.engine.execution_slippage_bps > ANY_SLIPPAGE_BPS {
        return Err(ConfigError::ValidationError(format!(
            "engine.execution_slippage_bps must be at most {ANY_SLIPPAGE_BPS}"
        )));
    }
    config.engine.settings()?;

    let valid_formats = ["json", "pretty"];
    if !valid_formats.contains(&config.observability.logging.format.as_str()) {
        return Err(ConfigError::ValidationError(format!(
            "observability.logging.format must be one of: {valid_formats:?}"
        )));
    }
    if config.observability.metrics.enabled {
        config.observability.metrics.exporter_config()?;
    }

    if config.service.command_capacity == 0 {
        return Err(ConfigError::ValidationError(
            "service.command_capacity must be positive".to_string(),
        ));
    }

    validate_simulation(&config.simulation)
}

fn validate_simulation(simulation: &SimulationConfig) -> Result<(), ConfigError> {
    let mut listed = HashSet::new();
    for market in &simulation.markets {
        if !listed.insert(market.id.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "simulation market '{}' is listed twice",
                market.id
            )));
        }
        if market.asset_a == market.asset_b {
            return Err(ConfigError::ValidationError(format!(
                "simulation market '{}' must pair two different assets",
                market.id
            )));
        }
        if market.long_rate.denominator == 0 || market.short_rate.denominator == 0 {
            return Err(ConfigError::ValidationError(format!(
                "simulation market '{}' has a zero rate denominator",
                market.id
            )));
        }
        if market.slippage_bps > ANY_SLIPPAGE_BPS {
            return Err(ConfigError::ValidationError(format!(
                "simulation market '{}' slippage_bps must be at most {ANY_SLIPPAGE_BPS}",
                market.id
            )));
        }
    }

    for (index, step) in simulation.scenario.iter().enumerate() {
        let market = match step {
            ScenarioStep::Deposit { market, .. }
            | ScenarioStep::Move { market, .. }
            | ScenarioStep::TryExecute { market, .. }
            | ScenarioStep::Withdraw { market, .. } => market,
        };
        if !listed.contains(market.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "scenario step {index} references unknown market '{market}'"
            )));
        }
    }
    Ok(())
}
