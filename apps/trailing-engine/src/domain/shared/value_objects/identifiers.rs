//! Strongly-typed identifiers for markets, accounts and assets.
//!
//! Keeping these distinct stops a market id from being passed where an
//! account is expected, which matters because every storage key mixes them.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new identifier from a string.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Get the inner string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

define_id!(MarketId, "Identifier of a two-asset market (the price source and swap venue).");
define_id!(AccountId, "Identifier of a participant or protocol account on the host ledger.");
define_id!(AssetId, "Identifier of a fungible asset held in the yield venue.");
define_id!(EventId, "Unique identifier of an emitted pool event.");

impl EventId {
    /// Generate a fresh event identifier using UUID v4.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_id_display_matches_input() {
        let id = MarketId::new("ETH-USDC");
        assert_eq!(id.as_str(), "ETH-USDC");
        assert_eq!(format!("{id}"), "ETH-USDC");
    }

    #[test]
    fn account_id_from_conversions() {
        let a: AccountId = "alice".into();
        let b: AccountId = String::from("alice").into();
        assert_eq!(a, b);
    }

    #[test]
    fn event_ids_are_unique() {
        assert_ne!(EventId::generate(), EventId::generate());
    }

    #[test]
    fn serde_is_transparent() {
        let id = AssetId::new("USDC");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"USDC\"");

        let parsed: AssetId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }
}
