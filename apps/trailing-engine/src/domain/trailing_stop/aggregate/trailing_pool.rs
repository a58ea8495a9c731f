//! Trailing Pool Aggregate
//!
//! One pool holds the pooled principal of every depositor in a
//! `(market, tier, direction, epoch)` tuple, tracks the price extremum since it
//! opened and, once executed, the fixed proceeds all shares are redeemed against.
//!
//! # Invariants
//!
//! - Open: `total_shares == 0` iff `total_principal == 0`.
//! - The trigger only tightens while open.
//! - Executed: `executed_output` and `total_shares` never change again;
//!   `paid_output <= executed_output` and `redeemed_shares <= total_shares`.

use serde::{Deserialize, Serialize};

use crate::domain::shared::{ArithmeticError, math};
use crate::domain::trailing_stop::errors::TrailingStopError;
use crate::domain::trailing_stop::value_objects::{Direction, Tier};

/// Lifecycle state of a pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PoolStatus {
    /// Accepting deposits; principal is resting.
    #[default]
    Open,
    /// Principal was swapped; shares redeem against the proceeds.
    Executed,
}

/// Outcome of burning shares against a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redemption {
    /// Shares burned.
    pub shares: u128,
    /// Amount paid out.
    pub amount_out: u128,
    /// Pool state the shares were redeemed in. `Open` pays the deposit asset,
    /// `Executed` pays the proceeds asset.
    pub status: PoolStatus,
}

/// Totals frozen by an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionSettlement {
    /// Principal drained from the pool.
    pub principal_in: u128,
    /// Proceeds credited to the pool.
    pub proceeds_out: u128,
    /// Trigger tick in force when the pool executed.
    pub trigger_tick: i32,
    /// Share denominator for all later redemptions.
    pub total_shares: u128,
}

/// State of one trailing pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrailingPool {
    tier: Tier,
    direction: Direction,
    status: PoolStatus,
    /// Highest tick for Long, lowest for Short; unset until the first observation.
    extremum: Option<i32>,
    trigger_tick: Option<i32>,
    total_principal: u128,
    total_shares: u128,
    executed_output: u128,
    executed_at_tick: Option<i32>,
    redeemed_shares: u128,
    paid_output: u128,
}

impl TrailingPool {
    /// A fresh, empty, open pool with unset extrema.
    #[must_use]
    pub const fn new(tier: Tier, direction: Direction) -> Self {
        Self {
            tier,
            direction,
            status: PoolStatus::Open,
            extremum: None,
            trigger_tick: None,
            total_principal: 0,
            total_shares: 0,
            executed_output: 0,
            executed_at_tick: None,
            redeemed_shares: 0,
            paid_output: 0,
        }
    }

    // =========================================================================
    // Getters
    // =========================================================================

    /// Trailing tier.
    #[must_use]
    pub const fn tier(&self) -> Tier {
        self.tier
    }

    /// Principal side.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Lifecycle status.
    #[must_use]
    pub const fn status(&self) -> PoolStatus {
        self.status
    }

    /// Whether the pool still holds resting principal.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self.status, PoolStatus::Open)
    }

    /// Whether the pool has executed.
    #[must_use]
    pub const fn is_executed(&self) -> bool {
        matches!(self.status, PoolStatus::Executed)
    }

    /// Maximum tick observed since opening (Long pools only).
    #[must_use]
    pub const fn highest_tick_ever(&self) -> Option<i32> {
        match self.direction {
            Direction::Long => self.extremum,
            Direction::Short => None,
        }
    }

    /// Minimum tick observed since opening (Short pools only).
    #[must_use]
    pub const fn lowest_tick_ever(&self) -> Option<i32> {
        match self.direction {
            Direction::Long => None,
            Direction::Short => self.extremum,
        }
    }

    /// Tick that, once crossed, executes the pool.
    #[must_use]
    pub const fn trigger_tick(&self) -> Option<i32> {
        self.trigger_tick
    }

    /// Undeployed principal.
    #[must_use]
    pub const fn total_principal(&self) -> u128 {
        self.total_principal
    }

    /// Shares minted for this epoch.
    #[must_use]
    pub const fn total_shares(&self) -> u128 {
        self.total_shares
    }

    /// Proceeds of execution; zero while open.
    #[must_use]
    pub const fn executed_output(&self) -> u128 {
        self.executed_output
    }

    /// Trigger tick recorded at execution.
    #[must_use]
    pub const fn executed_at_tick(&self) -> Option<i32> {
        self.executed_at_tick
    }

    /// Shares burned after execution.
    #[must_use]
    pub const fn redeemed_shares(&self) -> u128 {
        self.redeemed_shares
    }

    /// Proceeds paid out after execution.
    #[must_use]
    pub const fn paid_output(&self) -> u128 {
        self.paid_output
    }

    /// Shares still held by participants.
    #[must_use]
    pub const fn outstanding_shares(&self) -> u128 {
        self.total_shares - self.redeemed_shares
    }

    // =========================================================================
    // Deposits
    // =========================================================================

    /// Shares `amount` would mint against the current totals.
    ///
    /// The first deposit mints 1:1; later ones mint
    /// `floor(amount * total_shares / total_principal)`.
    ///
    /// # Errors
    ///
    /// Rejects a zero amount, a non-open pool, and deposits that would mint
    /// zero shares.
    pub fn preview_mint(&self, amount: u128) -> Result<u128, TrailingStopError> {
        if amount == 0 {
            return Err(TrailingStopError::ZeroAmount { field: "amount" });
        }
        self.ensure_open()?;

        let shares = if self.total_shares == 0 {
            amount
        } else {
            math::mul_div_floor(amount, self.total_shares, self.total_principal)?
        };

        if shares == 0 {
            return Err(TrailingStopError::DustDeposit {
                amount,
                total_principal: self.total_principal,
                total_shares: self.total_shares,
            });
        }
        Ok(shares)
    }

    /// Add `amount` of principal and mint the corresponding shares.
    ///
    /// # Errors
    ///
    /// See [`Self::preview_mint`]; also fails on total overflow.
    pub fn mint(&mut self, amount: u128) -> Result<u128, TrailingStopError> {
        let shares = self.preview_mint(amount)?;
        let total_principal = math::add(self.total_principal, amount)?;
        let total_shares = math::add(self.total_shares, shares)?;
        self.total_principal = total_principal;
        self.total_shares = total_shares;
        Ok(shares)
    }

    // =========================================================================
    // Trigger tracking
    // =========================================================================

    /// Ratchet the extremum toward `tick` and recompute the trigger.
    ///
    /// Returns `true` if the extremum moved. Executed pools are frozen.
    pub fn observe_tick(&mut self, tick: i32) -> bool {
        if !self.is_open() || !self.direction.improves(tick, self.extremum) {
            return false;
        }
        self.extremum = Some(tick);
        self.trigger_tick = Some(self.direction.trigger_for(tick, self.tier.tick_delta()));
        true
    }

    /// Whether the pool qualifies for execution at `tick`.
    #[must_use]
    pub fn is_triggered_at(&self, tick: i32) -> bool {
        self.is_open()
            && self.total_shares > 0
            && self
                .trigger_tick
                .is_some_and(|trigger| self.direction.is_crossed(tick, trigger))
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Principal that an execution would drain.
    ///
    /// # Errors
    ///
    /// `PoolAlreadyExecuted` once executed, `NothingToExecute` when empty.
    pub fn executable_principal(&self, epoch: u64) -> Result<u128, TrailingStopError> {
        if self.is_executed() {
            return Err(TrailingStopError::PoolAlreadyExecuted { epoch });
        }
        if self.total_shares == 0 || self.total_principal == 0 {
            return Err(TrailingStopError::NothingToExecute {
                reason: "pool holds no principal".to_string(),
            });
        }
        Ok(self.total_principal)
    }

    /// Freeze the pool with `proceeds` as its fixed output.
    ///
    /// # Errors
    ///
    /// Same preconditions as [`Self::executable_principal`].
    pub fn settle_execution(
        &mut self,
        epoch: u64,
        proceeds: u128,
    ) -> Result<ExecutionSettlement, TrailingStopError> {
        let principal_in = self.executable_principal(epoch)?;
        let trigger_tick = self.trigger_tick.unwrap_or_default();

        self.status = PoolStatus::Executed;
        self.total_principal = 0;
        self.executed_output = proceeds;
        self.executed_at_tick = self.trigger_tick;

        Ok(ExecutionSettlement {
            principal_in,
            proceeds_out: proceeds,
            trigger_tick,
            total_shares: self.total_shares,
        })
    }

    // =========================================================================
    // Withdrawals
    // =========================================================================

    /// Payout for burning `shares`, without mutating the pool.
    ///
    /// Open pools pay `floor(shares * total_principal / total_shares)` of
    /// principal; executed pools pay `floor(shares * executed_output / total_shares)`
    /// of proceeds.
    ///
    /// # Errors
    ///
    /// Rejects zero shares, more shares than outstanding, an open pool with no
    /// principal, and payouts that round to zero.
    pub fn preview_redeem(&self, shares: u128) -> Result<Redemption, TrailingStopError> {
        if shares == 0 {
            return Err(TrailingStopError::ZeroAmount { field: "shares" });
        }
        if shares > self.outstanding_shares() {
            return Err(TrailingStopError::InsufficientShares {
                requested: shares,
                available: self.outstanding_shares(),
            });
        }

        let amount_out = match self.status {
            PoolStatus::Open => {
                if self.total_principal == 0 {
                    return Err(TrailingStopError::PoolNotOpen {
                        reason: "no principal left to withdraw".to_string(),
                    });
                }
                math::mul_div_floor(shares, self.total_principal, self.total_shares)?
            }
            PoolStatus::Executed => {
                math::mul_div_floor(shares, self.executed_output, self.total_shares)?
            }
        };

        let worthless_proceeds = self.is_executed() && self.executed_output == 0;
        if amount_out == 0 && !worthless_proceeds {
            return Err(TrailingStopError::DustWithdrawal { shares });
        }

        Ok(Redemption {
            shares,
            amount_out,
            status: self.status,
        })
    }

    /// Burn `shares` and account for the payout.
    ///
    /// # Errors
    ///
    /// See [`Self::preview_redeem`].
    pub fn redeem(&mut self, shares: u128) -> Result<Redemption, TrailingStopError> {
        let redemption = self.preview_redeem(shares)?;
        match self.status {
            PoolStatus::Open => {
                let principal = math::sub(self.total_principal, redemption.amount_out)?;
                let total_shares = math::sub(self.total_shares, shares)?;
                self.total_principal = principal;
                self.total_shares = total_shares;
            }
            PoolStatus::Executed => {
                let redeemed = math::add(self.redeemed_shares, shares)?;
                let paid = math::add(self.paid_output, redemption.amount_out)?;
                if paid > self.executed_output {
                    return Err(ArithmeticError::Underflow.into());
                }
                self.redeemed_shares = redeemed;
                self.paid_output = paid;
            }
        }
        Ok(redemption)
    }

    fn ensure_open(&self) -> Result<(), TrailingStopError> {
        if self.is_open() {
            Ok(())
        } else {
            Err(TrailingStopError::PoolNotOpen {
                reason: "pool has executed".to_string(),
            })
        }
    }
}
