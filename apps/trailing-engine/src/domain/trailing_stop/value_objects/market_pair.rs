//! Asset pair of a market.

use serde::{Deserialize, Serialize};

use super::Direction;
use crate::domain::shared::AssetId;

/// The two assets a market converts between.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarketPair {
    /// Asset A, held by Long pools.
    pub asset_a: AssetId,
    /// Asset B, held by Short pools.
    pub asset_b: AssetId,
}

impl MarketPair {
    /// Create a pair.
    #[must_use]
    pub const fn new(asset_a: AssetId, asset_b: AssetId) -> Self {
        Self { asset_a, asset_b }
    }

    /// Asset a pool of `direction` holds as principal.
    #[must_use]
    pub const fn deposit_asset(&self, direction: Direction) -> &AssetId {
        match direction {
            Direction::Long => &self.asset_a,
            Direction::Short => &self.asset_b,
        }
    }

    /// Asset a pool of `direction` receives on execution.
    #[must_use]
    pub const fn proceeds_asset(&self, direction: Direction) -> &AssetId {
        self.deposit_asset(direction.opposite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sides_are_opposite() {
        let pair = MarketPair::new(AssetId::new("ETH"), AssetId::new("USDC"));
        assert_eq!(pair.deposit_asset(Direction::Long).as_str(), "ETH");
        assert_eq!(pair.proceeds_asset(Direction::Long).as_str(), "USDC");
        assert_eq!(pair.deposit_asset(Direction::Short).as_str(), "USDC");
        assert_eq!(pair.proceeds_asset(Direction::Short).as_str(), "ETH");
    }
}
