//! In-memory market.
//!
//! Each market has a settable tick and a fixed output rate per direction.
//! Fills are all-or-nothing against an optional liquidity cap, with a fixed
//! simulated slippage checked against the caller's tolerance.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::application::dto::PriceUpdate;
use crate::application::ports::{MarketError, MarketPort, SwapRequest};
use crate::domain::shared::{MarketId, math};
use crate::domain::trailing_stop::{Direction, MarketPair};
use crate::infrastructure::ledger::SharedHostState;

const BPS_DENOMINATOR: u128 = 10_000;

/// Output per unit of input, as an integer fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRate {
    /// Output units.
    pub numerator: u128,
    /// Input units.
    pub denominator: u128,
}

impl SwapRate {
    /// Rate of `numerator / denominator`.
    #[must_use]
    pub const fn new(numerator: u128, denominator: u128) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// One output per input.
    #[must_use]
    pub const fn parity() -> Self {
        Self::new(1, 1)
    }

    fn quote(self, amount_in: u128) -> Result<u128, MarketError> {
        math::mul_div_floor(amount_in, self.numerator, self.denominator).map_err(|err| {
            MarketError::Unavailable {
                message: format!("quote failed: {err}"),
            }
        })
    }
}

/// State of one simulated market.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketState {
    /// Asset pair.
    pub pair: MarketPair,
    /// Current tick.
    pub tick: i32,
    /// Rate for selling asset A (Long principal).
    pub long_rate: SwapRate,
    /// Rate for selling asset B (Short principal).
    pub short_rate: SwapRate,
    /// Output still available; `None` is unlimited.
    pub liquidity: Option<u128>,
    /// Shortfall of every fill against its quote.
    pub slippage_bps: u32,
}

impl MarketState {
    /// Market at `tick` with parity rates, unlimited liquidity and no slippage.
    #[must_use]
    pub const fn new(pair: MarketPair, tick: i32) -> Self {
        Self {
            pair,
            tick,
            long_rate: SwapRate::parity(),
            short_rate: SwapRate::parity(),
            liquidity: None,
            slippage_bps: 0,
        }
    }

    const fn rate(&self, direction: Direction) -> SwapRate {
        match direction {
            Direction::Long => self.long_rate,
            Direction::Short => self.short_rate,
        }
    }
}

/// In-memory [`MarketPort`] over the shared host state.
#[derive(Debug)]
pub struct InMemoryMarket {
    state: SharedHostState,
    fail_swaps: AtomicBool,
}

impl InMemoryMarket {
    pub(crate) fn new(state: SharedHostState) -> Self {
        Self {
            state,
            fail_swaps: AtomicBool::new(false),
        }
    }

    /// Add or replace a market.
    pub fn list(&self, market: MarketId, state: MarketState) {
        self.state.write().markets.insert(market, state);
    }

    /// Move a market to `tick`, returning the move for the engine to consume.
    ///
    /// # Errors
    ///
    /// Unknown market.
    pub fn trade_to(&self, market: &MarketId, tick: i32) -> Result<PriceUpdate, MarketError> {
        let mut host = self.state.write();
        let state = host
            .markets
            .get_mut(market)
            .ok_or_else(|| MarketError::UnknownMarket {
                market: market.clone(),
            })?;
        let previous_tick = std::mem::replace(&mut state.tick, tick);
        Ok(PriceUpdate {
            market: market.clone(),
            previous_tick,
            new_tick: tick,
        })
    }

    /// Remaining liquidity of a market.
    #[must_use]
    pub fn liquidity(&self, market: &MarketId) -> Option<u128> {
        self.state
            .read()
            .markets
            .get(market)
            .and_then(|state| state.liquidity)
    }

    /// Make every subsequent swap fail until reset.
    pub fn fail_swaps(&self, fail: bool) {
        self.fail_swaps.store(fail, Ordering::SeqCst);
    }

    fn with_market<T>(
        &self,
        market: &MarketId,
        read: impl FnOnce(&MarketState) -> T,
    ) -> Result<T, MarketError> {
        self.state
            .read()
            .markets
            .get(market)
            .map(read)
            .ok_or_else(|| MarketError::UnknownMarket {
                market: market.clone(),
            })
    }
}

impl MarketPort for InMemoryMarket {
    fn pair(&self, market: &MarketId) -> Result<MarketPair, MarketError> {
        self.with_market(market, |state| state.pair.clone())
    }

    fn current_tick(&self, market: &MarketId) -> Result<i32, MarketError> {
        self.with_market(market, |state| state.tick)
    }

    fn swap(&self, request: &SwapRequest) -> Result<u128, MarketError> {
        if self.fail_swaps.load(Ordering::SeqCst) {
            return Err(MarketError::Unavailable {
                message: "swaps disabled".to_string(),
            });
        }

        let mut host = self.state.write();
        let state = host
            .markets
            .get_mut(&request.market)
            .ok_or_else(|| MarketError::UnknownMarket {
                market: request.market.clone(),
            })?;

        if state.slippage_bps > request.max_slippage_bps {
            return Err(MarketError::SlippageExceeded {
                actual_bps: state.slippage_bps,
                max_bps: request.max_slippage_bps,
            });
        }

        let quote = state.rate(request.direction).quote(request.amount_in)?;
        let kept = BPS_DENOMINATOR.saturating_sub(u128::from(state.slippage_bps));
        let output = math::mul_div_floor(quote, kept, BPS_DENOMINATOR).map_err(|err| {
            MarketError::Unavailable {
                message: format!("fill failed: {err}"),
            }
        })?;

        if let Some(available) = state.liquidity {
            if output > available {
                return Err(MarketError::InsufficientLiquidity {
                    requested: output,
                    available,
                });
            }
            state.liquidity = Some(available - output);
        }

        Ok(output)
    }
}
