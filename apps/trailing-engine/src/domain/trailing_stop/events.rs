//! Domain events for trailing pools.
//!
//! Every event carries the full `(market, tier, direction, epoch)` identity so
//! downstream consumers never need to read engine state.

use serde::{Deserialize, Serialize};

use super::value_objects::PoolKey;
use crate::domain::shared::{AccountId, EventId, Timestamp};

/// All pool events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PoolEvent {
    /// Principal added and shares minted.
    Deposited(PoolDeposited),
    /// Pool principal swapped into proceeds.
    Executed(PoolExecuted),
    /// Shares burned for principal or proceeds.
    Withdrawn(PoolWithdrawn),
}

impl PoolEvent {
    /// Unique event id.
    #[must_use]
    pub const fn event_id(&self) -> &EventId {
        match self {
            Self::Deposited(e) => &e.event_id,
            Self::Executed(e) => &e.event_id,
            Self::Withdrawn(e) => &e.event_id,
        }
    }

    /// Pool the event concerns.
    #[must_use]
    pub const fn pool(&self) -> &PoolKey {
        match self {
            Self::Deposited(e) => &e.pool,
            Self::Executed(e) => &e.pool,
            Self::Withdrawn(e) => &e.pool,
        }
    }

    /// When the event occurred.
    #[must_use]
    pub const fn occurred_at(&self) -> Timestamp {
        match self {
            Self::Deposited(e) => e.occurred_at,
            Self::Executed(e) => e.occurred_at,
            Self::Withdrawn(e) => e.occurred_at,
        }
    }

    /// Event type name.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::Deposited(_) => "POOL_DEPOSITED",
            Self::Executed(_) => "POOL_EXECUTED",
            Self::Withdrawn(_) => "POOL_WITHDRAWN",
        }
    }
}

/// Event: principal deposited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolDeposited {
    /// Event ID.
    pub event_id: EventId,
    /// Target pool.
    pub pool: PoolKey,
    /// Depositor.
    pub depositor: AccountId,
    /// Principal added.
    pub amount: u128,
    /// Shares minted.
    pub shares: u128,
    /// Market tick at deposit.
    pub tick: i32,
    /// Pool trigger after the deposit.
    pub trigger_tick: Option<i32>,
    /// When the event occurred.
    pub occurred_at: Timestamp,
}

/// Event: pool executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolExecuted {
    /// Event ID.
    pub event_id: EventId,
    /// Executed pool.
    pub pool: PoolKey,
    /// Principal drained.
    pub principal_in: u128,
    /// Proceeds credited.
    pub proceeds_out: u128,
    /// Trigger tick in force at execution.
    pub trigger_tick: i32,
    /// Venue yield withdrawn on top of the principal.
    pub yield_accrued: u128,
    /// When the event occurred.
    pub occurred_at: Timestamp,
}

/// Event: shares withdrawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolWithdrawn {
    /// Event ID.
    pub event_id: EventId,
    /// Source pool.
    pub pool: PoolKey,
    /// Share holder.
    pub owner: AccountId,
    /// Shares burned.
    pub shares: u128,
    /// Amount paid.
    pub amount_out: u128,
    /// Whether the payout came from execution proceeds.
    pub post_execution: bool,
    /// When the event occurred.
    pub occurred_at: Timestamp,
}
