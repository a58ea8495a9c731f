//! Trailing Engine Binary
//!
//! Builds the in-memory simulation described by the config file, runs the
//! engine service, replays the scripted scenario and prints step reports and
//! final pool states as JSON.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin trailing-engine
//! ```
//!
//! # Environment Variables
//!
//! - `TRAILING_ENGINE_CONFIG`: config file path (default: config.yaml)
//! - `RUST_LOG`: overrides the configured log level

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use tokio::signal;
use trailing_engine::config::{Config, load_config};
use trailing_engine::domain::shared::MarketId;
use trailing_engine::domain::trailing_stop::{PoolKey, TrailingPool};
use trailing_engine::infrastructure::events::TracingEventPublisher;
use trailing_engine::infrastructure::service::EngineService;
use trailing_engine::infrastructure::simulation::{ScenarioRunner, Simulation, StepReport};
use trailing_engine::observability::{init_logging, init_metrics};

const DEFAULT_CONFIG_PATH: &str = "config.yaml";

#[derive(Serialize)]
struct RunSummary {
    steps: Vec<StepReport>,
    pools: Vec<PoolSnapshot>,
}

#[derive(Serialize)]
struct PoolSnapshot {
    key: PoolKey,
    #[serde(flatten)]
    pool: TrailingPool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    let path = std::env::var("TRAILING_ENGINE_CONFIG")
        .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = load_config(Some(&path)).with_context(|| format!("loading {path}"))?;

    init_logging(&config.observability.logging);
    tracing::info!(config = %path, "Starting trailing engine");

    if config.observability.metrics.enabled {
        init_metrics(&config.observability.metrics.exporter_config()?)?;
    }

    let summary = run(&config).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    tracing::info!("Trailing engine stopped");
    Ok(())
}

async fn run(config: &Config) -> anyhow::Result<RunSummary> {
    let settings = config.engine.settings()?;
    let (simulation, engine) = Simulation::build(
        &config.simulation,
        settings,
        Arc::new(TracingEventPublisher),
    );
    let (handle, task) = EngineService::spawn(engine, config.service.command_capacity);
    let market = simulation.market();
    let runner = ScenarioRunner::new(&handle, &market);

    let steps = tokio::select! {
        reports = runner.replay(&config.simulation.scenario) => reports?,
        () = shutdown_signal() => {
            tracing::warn!("Interrupted, stopping before the scenario finished");
            Vec::new()
        }
    };

    handle.shutdown().await?;
    let engine = task.await.context("engine service task failed")?;

    let markets: BTreeSet<&str> = config
        .simulation
        .markets
        .iter()
        .map(|m| m.id.as_str())
        .collect();
    let pools = markets
        .into_iter()
        .flat_map(|id| {
            engine
                .book()
                .pools_in_market(&MarketId::new(id))
                .into_iter()
                .map(|(key, pool)| PoolSnapshot {
                    key,
                    pool: pool.clone(),
                })
                .collect::<Vec<_>>()
        })
        .collect();

    let rejected = steps.iter().filter(|s| s.is_rejected()).count();
    tracing::info!(steps = steps.len(), rejected, "Scenario replayed");
    Ok(RunSummary { steps, pools })
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Resolves on SIGINT or SIGTERM. If a handler cannot be installed that
/// signal is ignored rather than ending the run.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!(error = %e, "Ctrl-C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl-C"),
        () = terminate => tracing::info!("Received SIGTERM"),
    }
}
