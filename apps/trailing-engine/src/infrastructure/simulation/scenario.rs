//! Replays scripted steps against a running engine service.
//!
//! A rejected step is reported and the replay continues; only a stopped
//! service ends it early.

use serde::Serialize;

use crate::application::dto::{
    DepositReceipt, DepositRequest, ExecutionReceipt, PriceUpdateReport, WithdrawRequest,
    WithdrawalReceipt,
};
use crate::config::ScenarioStep;
use crate::domain::shared::{AccountId, MarketId};
use crate::domain::trailing_stop::{Direction, PoolKey, Tier};
use crate::error::{EngineError, ErrorCode};
use crate::infrastructure::market::InMemoryMarket;
use crate::infrastructure::service::EngineHandle;

/// What one step produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    /// Deposit accepted.
    Deposited {
        /// Receipt.
        receipt: DepositReceipt,
    },
    /// Tick moved and the update was processed.
    Moved {
        /// Tracker report.
        report: PriceUpdateReport,
    },
    /// Manual trigger ran.
    Triggered {
        /// Executions, possibly none.
        receipts: Vec<ExecutionReceipt>,
    },
    /// Withdrawal paid.
    Withdrew {
        /// Receipt.
        receipt: WithdrawalReceipt,
    },
    /// Step failed without changing state.
    Rejected {
        /// Error code.
        code: ErrorCode,
        /// Rendered error.
        message: String,
    },
}

/// One replayed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    /// Position in the scenario.
    pub index: usize,
    /// Step action name.
    pub action: &'static str,
    /// Result.
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

impl StepReport {
    /// Whether the step was rejected.
    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self.outcome, StepOutcome::Rejected { .. })
    }
}

/// Replays steps through `handle`, moving prices on `market`.
pub struct ScenarioRunner<'a> {
    handle: &'a EngineHandle,
    market: &'a InMemoryMarket,
}

impl<'a> ScenarioRunner<'a> {
    /// Runner over a service handle and the simulated market it trades on.
    #[must_use]
    pub const fn new(handle: &'a EngineHandle, market: &'a InMemoryMarket) -> Self {
        Self { handle, market }
    }

    /// Replay every step in order.
    ///
    /// # Errors
    ///
    /// Returns `INTERNAL_ERROR` if the engine service stops mid-replay.
    pub async fn replay(&self, steps: &[ScenarioStep]) -> Result<Vec<StepReport>, EngineError> {
        let mut reports = Vec::with_capacity(steps.len());
        for (index, step) in steps.iter().enumerate() {
            let outcome = match self.run(step).await {
                Ok(outcome) => outcome,
                Err(err) if err.code() == ErrorCode::InternalError => return Err(err),
                Err(err) => {
                    tracing::warn!(index, action = action_name(step), error = %err, "scenario step rejected");
                    StepOutcome::Rejected {
                        code: err.code(),
                        message: err.to_string(),
                    }
                }
            };
            reports.push(StepReport {
                index,
                action: action_name(step),
                outcome,
            });
        }
        Ok(reports)
    }

    async fn run(&self, step: &ScenarioStep) -> Result<StepOutcome, EngineError> {
        match step {
            ScenarioStep::Deposit {
                market,
                tier,
                direction,
                amount,
                account,
            } => {
                let receipt = self
                    .handle
                    .deposit(DepositRequest {
                        market: MarketId::new(market),
                        tier: tier.parse::<Tier>()?,
                        direction: direction.parse::<Direction>()?,
                        amount: u128::from(*amount),
                        depositor: AccountId::new(account),
                    })
                    .await?;
                Ok(StepOutcome::Deposited { receipt })
            }
            ScenarioStep::Move { market, tick } => {
                let update = self.market.trade_to(&MarketId::new(market), *tick)?;
                let report = self.handle.price_changed(update).await?;
                Ok(StepOutcome::Moved { report })
            }
            ScenarioStep::TryExecute { market, tier } => {
                let market = MarketId::new(market);
                let receipts = match tier {
                    Some(tier) => self.handle.try_execute(market, tier.parse::<Tier>()?).await?,
                    None => self.handle.try_execute_market(market).await?,
                };
                Ok(StepOutcome::Triggered { receipts })
            }
            ScenarioStep::Withdraw {
                market,
                tier,
                direction,
                epoch,
                account,
                shares,
            } => {
                let market = MarketId::new(market);
                let tier = tier.parse::<Tier>()?;
                let direction = direction.parse::<Direction>()?;
                let epoch = match epoch {
                    Some(epoch) => *epoch,
                    None => {
                        self.handle
                            .current_epoch(market.clone(), tier, direction)
                            .await?
                    }
                };
                let pool = PoolKey::new(market, tier, direction, epoch);
                let owner = AccountId::new(account);
                let shares = match shares {
                    Some(shares) => u128::from(*shares),
                    None => self.handle.share_balance(owner.clone(), pool.clone()).await?,
                };
                let receipt = self
                    .handle
                    .withdraw(WithdrawRequest {
                        pool,
                        shares,
                        owner,
                    })
                    .await?;
                Ok(StepOutcome::Withdrew { receipt })
            }
        }
    }
}

const fn action_name(step: &ScenarioStep) -> &'static str {
    match step {
        ScenarioStep::Deposit { .. } => "deposit",
        ScenarioStep::Move { .. } => "move",
        ScenarioStep::TryExecute { .. } => "try_execute",
        ScenarioStep::Withdraw { .. } => "withdraw",
    }
}
