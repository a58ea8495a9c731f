//! Wires the in-memory adapters and the engine from configuration.

use std::sync::Arc;

use crate::application::ports::EventPublisherPort;
use crate::application::use_cases::{EngineSettings, TrailingStopEngine};
use crate::config::{MarketConfig, RateConfig, SimulationConfig};
use crate::domain::shared::{AssetId, MarketId};
use crate::domain::trailing_stop::MarketPair;
use crate::infrastructure::ledger::InMemoryLedger;
use crate::infrastructure::market::{InMemoryMarket, MarketState, SwapRate};
use crate::infrastructure::venue::InMemoryYieldVenue;

/// Engine type produced by [`Simulation::build`].
pub type SimulatedEngine<P> =
    TrailingStopEngine<InMemoryMarket, InMemoryYieldVenue, InMemoryLedger, P>;

/// Handles to the simulated host, shared with the engine.
pub struct Simulation<P>
where
    P: EventPublisherPort + 'static,
{
    ledger: Arc<InMemoryLedger>,
    market: Arc<InMemoryMarket>,
    venue: Arc<InMemoryYieldVenue>,
    publisher: Arc<P>,
}

impl<P> Simulation<P>
where
    P: EventPublisherPort + 'static,
{
    /// List every configured market, apply venue yield and build the engine.
    pub fn build(
        config: &SimulationConfig,
        settings: EngineSettings,
        publisher: Arc<P>,
    ) -> (Self, SimulatedEngine<P>) {
        let ledger = Arc::new(InMemoryLedger::new());
        let market = Arc::new(ledger.market());
        let venue = Arc::new(ledger.yield_venue(settings.account.clone()));

        for entry in &config.markets {
            market.list(MarketId::new(&entry.id), market_state(entry));
        }
        for (asset, bps) in &config.venue.yield_bps {
            venue.set_yield_bps(AssetId::new(asset), *bps);
        }
        tracing::info!(
            markets = config.markets.len(),
            steps = config.scenario.len(),
            account = %settings.account,
            "simulation built"
        );

        let engine = TrailingStopEngine::new(
            Arc::clone(&market),
            Arc::clone(&venue),
            Arc::clone(&ledger),
            Arc::clone(&publisher),
            settings,
        );
        let simulation = Self {
            ledger,
            market,
            venue,
            publisher,
        };
        (simulation, engine)
    }

    /// Host ledger.
    pub fn ledger(&self) -> Arc<InMemoryLedger> {
        Arc::clone(&self.ledger)
    }

    /// Market adapter.
    pub fn market(&self) -> Arc<InMemoryMarket> {
        Arc::clone(&self.market)
    }

    /// Yield venue adapter.
    pub fn venue(&self) -> Arc<InMemoryYieldVenue> {
        Arc::clone(&self.venue)
    }

    /// Event publisher.
    pub fn publisher(&self) -> Arc<P> {
        Arc::clone(&self.publisher)
    }
}

fn market_state(entry: &MarketConfig) -> MarketState {
    let pair = MarketPair::new(AssetId::new(&entry.asset_a), AssetId::new(&entry.asset_b));
    MarketState {
        long_rate: swap_rate(entry.long_rate),
        short_rate: swap_rate(entry.short_rate),
        liquidity: entry.liquidity.map(u128::from),
        slippage_bps: entry.slippage_bps,
        ..MarketState::new(pair, entry.tick)
    }
}

fn swap_rate(rate: RateConfig) -> SwapRate {
    SwapRate::new(u128::from(rate.numerator), u128::from(rate.denominator))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::application::ports::MarketPort;
    use crate::config::VenueConfig;
    use crate::domain::shared::AccountId;
    use crate::infrastructure::events::RecordingEventPublisher;

    #[test]
    fn lists_markets_and_applies_yield() {
        let config = SimulationConfig {
            markets: vec![MarketConfig {
                id: "ETH-USDC".to_string(),
                asset_a: "ETH".to_string(),
                asset_b: "USDC".to_string(),
                tick: 42,
                long_rate: RateConfig::default(),
                short_rate: RateConfig::default(),
                liquidity: Some(1_000),
                slippage_bps: 0,
            }],
            venue: VenueConfig {
                yield_bps: BTreeMap::from([("ETH".to_string(), 100)]),
            },
            scenario: Vec::new(),
        };
        let settings = EngineSettings::for_account(AccountId::new("engine"));
        let (simulation, engine) =
            Simulation::build(&config, settings, Arc::new(RecordingEventPublisher::new()));

        let market = MarketId::new("ETH-USDC");
        assert_eq!(simulation.market().current_tick(&market).unwrap(), 42);
        assert_eq!(simulation.market().liquidity(&market), Some(1_000));
        assert_eq!(simulation.venue().operator(), &AccountId::new("engine"));
        assert_eq!(engine.settings().account, AccountId::new("engine"));
        assert!(!simulation.ledger().in_unit_of_work());
        assert!(simulation.publisher().is_empty());
    }
}
