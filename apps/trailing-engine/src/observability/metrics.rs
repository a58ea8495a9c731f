//! Prometheus metrics for the trailing engine.
//!
//! Recorders are free functions so the engine can emit metrics without
//! holding a handle; they are no-ops until a recorder is installed.
//!
//! # Example
//!
//! ```ignore
//! use trailing_engine::observability::{init_metrics, MetricsConfig};
//!
//! init_metrics(&MetricsConfig::default())?;
//! record_deposit("ETH-USDC", "T1", "long");
//! ```

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::{Ipv4Addr, SocketAddr};

/// Configuration for the metrics exporter.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Address to bind the metrics HTTP listener.
    pub listen_addr: SocketAddr,
    /// Histogram buckets for ticks per execution trigger distance.
    pub tick_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 9090)),
            tick_buckets: vec![1.0, 10.0, 50.0, 100.0, 250.0, 500.0, 1_000.0, 1_500.0, 5_000.0],
        }
    }
}

impl MetricsConfig {
    /// Create a new metrics configuration with custom address.
    #[must_use]
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            listen_addr: addr,
            ..Default::default()
        }
    }
}

/// Initialize the Prometheus metrics exporter.
///
/// This starts an HTTP server that exposes metrics at `/metrics`.
///
/// # Errors
///
/// Returns an error if the metrics exporter fails to start (e.g., port already in use).
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    PrometheusBuilder::new()
        .with_http_listener(config.listen_addr)
        .set_buckets(&config.tick_buckets)
        .map_err(|e| MetricsError::Configuration(e.to_string()))?
        .install()
        .map_err(|e| MetricsError::Installation(e.to_string()))?;

    tracing::info!(
        addr = %config.listen_addr,
        "Prometheus metrics exporter started"
    );

    Ok(())
}

/// Error type for metrics operations.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Failed to configure metrics exporter.
    #[error("metrics configuration error: {0}")]
    Configuration(String),
    /// Failed to install metrics exporter.
    #[error("metrics installation error: {0}")]
    Installation(String),
}

// ============================================================================
// Pool Metrics
// ============================================================================

/// Record a committed deposit.
pub fn record_deposit(market: &str, tier: &str, direction: &str) {
    counter!(
        "trailing_deposits_total",
        "market" => market.to_string(),
        "tier" => tier.to_string(),
        "direction" => direction.to_string()
    )
    .increment(1);
}

/// Record a committed execution.
///
/// # Arguments
///
/// * `market` - Market id
/// * `tier` - Tier label (e.g., "T1")
/// * `direction` - "long" or "short"
/// * `overshoot_ticks` - Distance between the trigger and the tick that crossed it
pub fn record_execution(market: &str, tier: &str, direction: &str, overshoot_ticks: f64) {
    counter!(
        "trailing_executions_total",
        "market" => market.to_string(),
        "tier" => tier.to_string(),
        "direction" => direction.to_string()
    )
    .increment(1);

    histogram!(
        "trailing_execution_overshoot_ticks",
        "tier" => tier.to_string()
    )
    .record(overshoot_ticks);
}

/// Record an execution that rolled back.
pub fn record_execution_failure(market: &str, tier: &str, reason: &str) {
    counter!(
        "trailing_execution_failures_total",
        "market" => market.to_string(),
        "tier" => tier.to_string(),
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// Record a committed withdrawal.
pub fn record_withdrawal(market: &str, post_execution: bool) {
    counter!(
        "trailing_withdrawals_total",
        "market" => market.to_string(),
        "phase" => if post_execution { "executed" } else { "open" }
    )
    .increment(1);
}

/// Record a rejected operation.
pub fn record_rejection(operation: &'static str, reason: &'static str) {
    counter!(
        "trailing_rejections_total",
        "operation" => operation,
        "reason" => reason
    )
    .increment(1);
}

/// Record a processed price update.
pub fn record_price_update(market: &str) {
    counter!(
        "trailing_price_updates_total",
        "market" => market.to_string()
    )
    .increment(1);
}

/// Update the number of open pools holding principal.
#[allow(clippy::cast_precision_loss)]
pub fn update_open_pools(count: usize) {
    gauge!("trailing_open_pools").set(count as f64);
}
