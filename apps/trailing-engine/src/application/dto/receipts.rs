//! Engine request and receipt DTOs

use serde::{Deserialize, Serialize};

use crate::domain::shared::{AccountId, AssetId, MarketId};
use crate::domain::trailing_stop::{Direction, PoolKey, Tier};
use crate::error::{EngineError, ErrorCode};

/// Request to deposit principal into the current pool of a series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositRequest {
    /// Market.
    pub market: MarketId,
    /// Tier.
    pub tier: Tier,
    /// Direction.
    pub direction: Direction,
    /// Principal in the direction's deposit asset.
    pub amount: u128,
    /// Share recipient.
    pub depositor: AccountId,
}

/// Request to burn shares of one pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawRequest {
    /// Pool the shares belong to.
    pub pool: PoolKey,
    /// Shares to burn.
    pub shares: u128,
    /// Share holder and payout recipient.
    pub owner: AccountId,
}

/// A tick move reported by the market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceUpdate {
    /// Market that moved.
    pub market: MarketId,
    /// Tick before the move.
    pub previous_tick: i32,
    /// Tick after the move.
    pub new_tick: i32,
}

/// Outcome of a deposit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositReceipt {
    /// Pool credited.
    pub pool: PoolKey,
    /// Depositor.
    pub depositor: AccountId,
    /// Principal added.
    pub amount: u128,
    /// Shares minted.
    pub shares: u128,
    /// Tick read from the market.
    pub tick: i32,
    /// Pool trigger after the deposit.
    pub trigger_tick: Option<i32>,
}

/// Outcome of one pool execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReceipt {
    /// Executed pool.
    pub pool: PoolKey,
    /// Principal drained.
    pub principal_in: u128,
    /// Amount handed to the market.
    pub swapped_in: u128,
    /// Proceeds received and resupplied.
    pub proceeds_out: u128,
    /// Trigger tick at execution.
    pub trigger_tick: i32,
    /// Market tick that crossed the trigger.
    pub execution_tick: i32,
    /// Venue yield withdrawn with the principal.
    pub yield_accrued: u128,
    /// Epoch new deposits now target.
    pub next_epoch: u64,
}

impl ExecutionReceipt {
    /// How far past the trigger the market was when the pool executed.
    #[must_use]
    pub const fn overshoot_ticks(&self) -> u32 {
        self.trigger_tick.abs_diff(self.execution_tick)
    }
}

/// Outcome of a withdrawal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalReceipt {
    /// Source pool.
    pub pool: PoolKey,
    /// Share holder.
    pub owner: AccountId,
    /// Shares burned.
    pub shares: u128,
    /// Pro-rata claim paid.
    pub amount_out: u128,
    /// Asset paid.
    pub asset: AssetId,
    /// Amount the venue delivered, including accrued yield.
    pub delivered: u128,
    /// Whether the claim was against execution proceeds.
    pub post_execution: bool,
}

/// Per-pool result of an execution attempt triggered by a price update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierExecution {
    /// Pool that qualified.
    pub pool: PoolKey,
    /// Receipt when the execution committed.
    pub receipt: Option<ExecutionReceipt>,
    /// Failure if the execution rolled back.
    pub error: Option<ExecutionFailure>,
}

/// Why an execution attempt rolled back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionFailure {
    /// Error kind.
    pub code: ErrorCode,
    /// Rendered error.
    pub message: String,
}

impl From<&EngineError> for ExecutionFailure {
    fn from(err: &EngineError) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

impl TierExecution {
    /// Whether the pool executed.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.receipt.is_some()
    }
}

/// Outcome of a price update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceUpdateReport {
    /// Market.
    pub market: MarketId,
    /// Tick before the move.
    pub previous_tick: i32,
    /// Tick after the move.
    pub new_tick: i32,
    /// Pools whose extremum moved.
    pub ratcheted: Vec<PoolKey>,
    /// Execution attempts in tier order.
    pub executions: Vec<TierExecution>,
}

impl PriceUpdateReport {
    /// Receipts of the pools that executed.
    pub fn receipts(&self) -> impl Iterator<Item = &ExecutionReceipt> {
        self.executions.iter().filter_map(|e| e.receipt.as_ref())
    }

    /// Number of attempts that rolled back.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.executions.iter().filter(|e| e.error.is_some()).count()
    }
}
