//! Observability module for metrics and logging.
//!
//! Structured logs go through `tracing`; counters and gauges through the
//! `metrics` facade with an optional Prometheus exporter.

mod logging;
mod metrics;

pub use logging::{LogFormat, env_filter, init_logging};
pub use metrics::{
    MetricsConfig, MetricsError, init_metrics, record_deposit, record_execution,
    record_execution_failure, record_price_update, record_rejection, record_withdrawal,
    update_open_pools,
};
