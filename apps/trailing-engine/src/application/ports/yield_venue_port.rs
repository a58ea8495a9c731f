//! Yield Venue Port (Driven Port)
//!
//! Interface to the lending venue where resting principal and executed
//! proceeds earn yield.

use crate::domain::shared::{AccountId, AssetId};

/// Yield venue error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VenueError {
    /// Asset not listed on the venue.
    #[error("asset not supported: {asset}")]
    UnsupportedAsset {
        /// Requested asset.
        asset: AssetId,
    },

    /// Withdrawal exceeds the supplied balance.
    #[error("insufficient venue balance of {asset}: requested {requested}, available {available}")]
    InsufficientBalance {
        /// Asset withdrawn.
        asset: AssetId,
        /// Amount requested.
        requested: u128,
        /// Amount supplied.
        available: u128,
    },

    /// Venue returned less than requested.
    #[error("venue returned {returned} of {requested}")]
    ShortWithdrawal {
        /// Amount requested.
        requested: u128,
        /// Amount returned.
        returned: u128,
    },

    /// Venue unreachable or refused the call.
    #[error("yield venue unavailable: {message}")]
    Unavailable {
        /// Detail from the venue.
        message: String,
    },
}

/// Port for the yield venue.
#[cfg_attr(test, mockall::automock)]
pub trait YieldVenuePort: Send + Sync {
    /// Supply `amount` of `asset` on behalf of `beneficiary`.
    ///
    /// # Errors
    ///
    /// Unsupported asset or venue failure.
    fn supply(
        &self,
        asset: &AssetId,
        amount: u128,
        beneficiary: &AccountId,
    ) -> Result<(), VenueError>;

    /// Withdraw `amount` of the caller's supplied `asset` to `recipient`.
    ///
    /// Returns the amount delivered, which includes any yield accrued on top
    /// and is never less than `amount`.
    ///
    /// # Errors
    ///
    /// Insufficient balance or venue failure.
    fn withdraw(
        &self,
        asset: &AssetId,
        amount: u128,
        recipient: &AccountId,
    ) -> Result<u128, VenueError>;
}
