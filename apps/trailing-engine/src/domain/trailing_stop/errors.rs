//! Trailing Stop Errors

use thiserror::Error;

use crate::domain::shared::ArithmeticError;

/// Rule violations raised by the trailing-pool aggregate and the pool book.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrailingStopError {
    /// Amount or share count of zero.
    #[error("{field} must be greater than zero")]
    ZeroAmount {
        /// Which input was zero.
        field: &'static str,
    },

    /// Deposit too small to mint a single share at the current rate.
    #[error("deposit of {amount} mints no shares (principal {total_principal}, shares {total_shares})")]
    DustDeposit {
        /// Deposited amount.
        amount: u128,
        /// Pool principal before the deposit.
        total_principal: u128,
        /// Pool shares before the deposit.
        total_shares: u128,
    },

    /// Withdrawal too small to pay out a single unit.
    #[error("withdrawing {shares} shares pays nothing")]
    DustWithdrawal {
        /// Shares offered.
        shares: u128,
    },

    /// Withdrawal exceeds the caller's balance.
    #[error("insufficient shares: requested {requested}, available {available}")]
    InsufficientShares {
        /// Shares requested.
        requested: u128,
        /// Shares held.
        available: u128,
    },

    /// Operation needs an open pool with resting principal.
    #[error("pool is not open: {reason}")]
    PoolNotOpen {
        /// Why the pool cannot serve the request.
        reason: String,
    },

    /// Execution requested for an epoch that already executed.
    #[error("pool already executed at epoch {epoch}")]
    PoolAlreadyExecuted {
        /// Executed epoch.
        epoch: u64,
    },

    /// No pool qualifies for execution.
    #[error("nothing to execute: {reason}")]
    NothingToExecute {
        /// Why nothing qualified.
        reason: String,
    },

    /// Unrecognised tier label.
    #[error("unknown tier: {value}")]
    UnknownTier {
        /// Input that failed to parse.
        value: String,
    },

    /// Unrecognised direction label.
    #[error("unknown direction: {value}")]
    UnknownDirection {
        /// Input that failed to parse.
        value: String,
    },

    /// Checked arithmetic failed.
    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = TrailingStopError::InsufficientShares {
            requested: 11,
            available: 10,
        };
        assert_eq!(
            err.to_string(),
            "insufficient shares: requested 11, available 10"
        );

        let err = TrailingStopError::ZeroAmount { field: "amount" };
        assert_eq!(err.to_string(), "amount must be greater than zero");

        let err: TrailingStopError = ArithmeticError::Overflow.into();
        assert_eq!(err.to_string(), "arithmetic overflow");
    }
}
