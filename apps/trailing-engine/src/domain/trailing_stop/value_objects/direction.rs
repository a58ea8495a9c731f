//! Direction value object and its trailing rules.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::domain::trailing_stop::errors::TrailingStopError;

/// Relative move between two consecutive ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickMovement {
    /// Price went up.
    Up,
    /// Price went down.
    Down,
    /// No change.
    Flat,
}

impl TickMovement {
    /// Classify the move from `previous` to `current`.
    #[must_use]
    pub fn between(previous: i32, current: i32) -> Self {
        match current.cmp(&previous) {
            Ordering::Greater => Self::Up,
            Ordering::Less => Self::Down,
            Ordering::Equal => Self::Flat,
        }
    }
}

/// Which side of a market a pool holds principal on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Principal in asset A, converted to asset B when price falls through the trigger.
    Long,
    /// Principal in asset B, converted to asset A when price rises through the trigger.
    Short,
}

/// Per-direction trailing behaviour.
struct DirectionRule {
    /// Ordering of a new tick against the extremum that counts as an improvement.
    favourable: Ordering,
    /// Sign applied to the tier delta when deriving the trigger from the extremum.
    trigger_sign: i32,
    /// Movement that ratchets the extremum.
    ratchets_on: TickMovement,
    /// Movement that can cross the trigger.
    executes_on: TickMovement,
}

const LONG_RULE: DirectionRule = DirectionRule {
    favourable: Ordering::Greater,
    trigger_sign: -1,
    ratchets_on: TickMovement::Up,
    executes_on: TickMovement::Down,
};

const SHORT_RULE: DirectionRule = DirectionRule {
    favourable: Ordering::Less,
    trigger_sign: 1,
    ratchets_on: TickMovement::Down,
    executes_on: TickMovement::Up,
};

impl Direction {
    /// Both directions, Long first.
    pub const ALL: [Self; 2] = [Self::Long, Self::Short];

    const fn rule(self) -> &'static DirectionRule {
        match self {
            Self::Long => &LONG_RULE,
            Self::Short => &SHORT_RULE,
        }
    }

    /// The other direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Long => Self::Short,
            Self::Short => Self::Long,
        }
    }

    /// Movement on which pools of this direction ratchet their extremum.
    #[must_use]
    pub const fn ratchets_on(self) -> TickMovement {
        self.rule().ratchets_on
    }

    /// Movement on which pools of this direction may execute.
    #[must_use]
    pub const fn executes_on(self) -> TickMovement {
        self.rule().executes_on
    }

    /// Whether `candidate` is a new extremum relative to `current`.
    ///
    /// An unset extremum is always improved upon.
    #[must_use]
    pub fn improves(self, candidate: i32, current: Option<i32>) -> bool {
        current.is_none_or(|extremum| candidate.cmp(&extremum) == self.rule().favourable)
    }

    /// Trigger tick for an extremum trailed by `delta` ticks.
    #[must_use]
    pub const fn trigger_for(self, extremum: i32, delta: i32) -> i32 {
        extremum.saturating_add(self.rule().trigger_sign * delta)
    }

    /// Whether `tick` has reached or passed `trigger`.
    #[must_use]
    pub fn is_crossed(self, tick: i32, trigger: i32) -> bool {
        tick.cmp(&trigger) != self.rule().favourable
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Long => f.write_str("long"),
            Self::Short => f.write_str("short"),
        }
    }
}

impl FromStr for Direction {
    type Err = TrailingStopError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "long" => Ok(Self::Long),
            "short" => Ok(Self::Short),
            other => Err(TrailingStopError::UnknownDirection {
                value: other.to_string(),
            }),
        }
    }
}
