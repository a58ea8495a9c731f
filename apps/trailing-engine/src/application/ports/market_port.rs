//! Market Port (Driven Port)
//!
//! Interface to the exchange that quotes the tick and fills pooled swaps.

use serde::{Deserialize, Serialize};

use crate::domain::shared::MarketId;
use crate::domain::trailing_stop::{Direction, MarketPair};

/// Basis points meaning "accept any output".
pub const ANY_SLIPPAGE_BPS: u32 = 10_000;

/// Request to swap one pool's principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRequest {
    /// Market to trade on.
    pub market: MarketId,
    /// Side of the principal; Long sells asset A for B, Short sells B for A.
    pub direction: Direction,
    /// Amount of the deposit asset to sell.
    pub amount_in: u128,
    /// Largest acceptable shortfall against the quoted output, in basis points.
    pub max_slippage_bps: u32,
}

impl SwapRequest {
    /// Create a swap request.
    #[must_use]
    pub const fn new(
        market: MarketId,
        direction: Direction,
        amount_in: u128,
        max_slippage_bps: u32,
    ) -> Self {
        Self {
            market,
            direction,
            amount_in,
            max_slippage_bps,
        }
    }
}

/// Market error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarketError {
    /// Market not known to the exchange.
    #[error("unknown market: {market}")]
    UnknownMarket {
        /// Requested market.
        market: MarketId,
    },

    /// Not enough liquidity to fill the whole amount.
    #[error("insufficient liquidity: requested {requested}, available {available}")]
    InsufficientLiquidity {
        /// Output the swap needed.
        requested: u128,
        /// Output the market could provide.
        available: u128,
    },

    /// Fill would breach the slippage tolerance.
    #[error("slippage {actual_bps}bp exceeds limit {max_bps}bp")]
    SlippageExceeded {
        /// Slippage of the fill.
        actual_bps: u32,
        /// Caller's tolerance.
        max_bps: u32,
    },

    /// Exchange unreachable or refused the call.
    #[error("market unavailable: {message}")]
    Unavailable {
        /// Detail from the exchange.
        message: String,
    },
}

/// Port for the exchange.
///
/// Swaps are all-or-nothing: either the full `amount_in` fills or the call
/// fails without side effects.
#[cfg_attr(test, mockall::automock)]
pub trait MarketPort: Send + Sync {
    /// Asset pair of a market.
    ///
    /// # Errors
    ///
    /// Unknown market or exchange failure.
    fn pair(&self, market: &MarketId) -> Result<MarketPair, MarketError>;

    /// Current tick of a market.
    ///
    /// # Errors
    ///
    /// Unknown market or exchange failure.
    fn current_tick(&self, market: &MarketId) -> Result<i32, MarketError>;

    /// Swap `amount_in` of the deposit asset into the opposite asset.
    ///
    /// # Errors
    ///
    /// Any failure to fill the full amount.
    fn swap(&self, request: &SwapRequest) -> Result<u128, MarketError>;
}
