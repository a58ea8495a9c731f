//! Trigger tier value object.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::trailing_stop::errors::TrailingStopError;

/// Basis-point magnitude of each tier, indexed by [`Tier::index`].
const TIER_BASIS_POINTS: [u32; 3] = [500, 1_000, 1_500];

/// One of the three fixed trailing distances a pool can be opened at.
///
/// The tick offset equals the basis points (1 bp ≈ 1 tick), so T1 trails the
/// extremum by 500 ticks, T2 by 1 000 and T3 by 1 500.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    /// 5 % trailing distance.
    T1,
    /// 10 % trailing distance.
    T2,
    /// 15 % trailing distance.
    T3,
}

impl Tier {
    /// All tiers in the order the tracker sweeps them.
    pub const ALL: [Self; 3] = [Self::T1, Self::T2, Self::T3];

    const fn index(self) -> usize {
        match self {
            Self::T1 => 0,
            Self::T2 => 1,
            Self::T3 => 2,
        }
    }

    /// Trailing distance in basis points.
    #[must_use]
    pub const fn basis_points(self) -> u32 {
        TIER_BASIS_POINTS[self.index()]
    }

    /// Trailing distance in price ticks.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn tick_delta(self) -> i32 {
        self.basis_points() as i32
    }

    /// Look a tier up by its basis-point magnitude.
    #[must_use]
    pub fn from_basis_points(bp: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|tier| tier.basis_points() == bp)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::T1 => f.write_str("T1"),
            Self::T2 => f.write_str("T2"),
            Self::T3 => f.write_str("T3"),
        }
    }
}

impl FromStr for Tier {
    type Err = TrailingStopError;

    /// Accepts `T1`..`T3` or the trailing width as a percentage (`5%`) or in
    /// basis points (`500`, `500bp`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_ascii_uppercase();
        let named = match value.as_str() {
            "T1" => Some(Self::T1),
            "T2" => Some(Self::T2),
            "T3" => Some(Self::T3),
            _ => None,
        };
        named
            .or_else(|| width_in_basis_points(&value).and_then(Self::from_basis_points))
            .ok_or(TrailingStopError::UnknownTier { value })
    }
}

fn width_in_basis_points(value: &str) -> Option<u32> {
    match value.strip_suffix('%') {
        Some(percent) => percent.trim().parse::<u32>().ok()?.checked_mul(100),
        None => value.strip_suffix("BP").unwrap_or(value).trim().parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Tier::T1, 500 ; "five percent")]
    #[test_case(Tier::T2, 1_000 ; "ten percent")]
    #[test_case(Tier::T3, 1_500 ; "fifteen percent")]
    fn tick_delta_equals_basis_points(tier: Tier, expected: i32) {
        assert_eq!(tier.tick_delta(), expected);
        assert_eq!(i64::from(tier.basis_points()), i64::from(expected));
    }

    #[test]
    fn lookup_by_basis_points() {
        assert_eq!(Tier::from_basis_points(1_000), Some(Tier::T2));
        assert_eq!(Tier::from_basis_points(100), None);
    }

    #[test]
    fn sweep_order_is_ascending() {
        let mut sorted = Tier::ALL;
        sorted.sort();
        assert_eq!(sorted, Tier::ALL);
    }

    #[test]
    fn parse_accepts_names_and_percentages() {
        assert_eq!("t1".parse::<Tier>().unwrap(), Tier::T1);
        assert_eq!("10%".parse::<Tier>().unwrap(), Tier::T2);
        assert!("T4".parse::<Tier>().is_err());
    }

    #[test_case("1500", Tier::T3 ; "bare basis points")]
    #[test_case("500bp", Tier::T1 ; "basis point suffix")]
    #[test_case(" 15 % ", Tier::T3 ; "spaced percentage")]
    fn parse_accepts_widths(input: &str, expected: Tier) {
        assert_eq!(input.parse::<Tier>().unwrap(), expected);
    }

    #[test_case("700" ; "no such width")]
    #[test_case("%" ; "empty percentage")]
    #[test_case("-5%" ; "negative")]
    fn parse_rejects_other_widths(input: &str) {
        assert!(matches!(
            input.parse::<Tier>(),
            Err(TrailingStopError::UnknownTier { .. })
        ));
    }

    #[test]
    fn serde_uses_variant_names() {
        assert_eq!(serde_json::to_string(&Tier::T3).unwrap(), "\"T3\"");
    }
}
