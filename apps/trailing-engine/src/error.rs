//! Rich error handling for the trailing engine.
//!
//! Every failure leaving the engine is an [`EngineError`]: a stable
//! [`ErrorCode`], a human-readable message and key/value context.
//!
//! # Error Codes
//!
//! | Reason | Raised when |
//! |--------|-------------|
//! | `INVALID_AMOUNT` | Zero amount or shares, or a deposit/withdrawal that rounds to nothing |
//! | `INVALID_REQUEST` | Unparseable tier, direction or other request field |
//! | `INSUFFICIENT_SHARES` | Withdrawal larger than the caller's balance |
//! | `POOL_NOT_OPEN` | Open-pool operation on a pool without principal or already executed |
//! | `POOL_ALREADY_EXECUTED` | Execution requested for an executed epoch |
//! | `NOTHING_TO_EXECUTE` | No pool qualifies (benign) |
//! | `COLLABORATOR_FAILURE` | Market, yield venue or ledger failed; the operation rolled back |
//! | `ARITHMETIC_OVERFLOW` | Checked integer arithmetic failed |
//! | `INTERNAL_ERROR` | Service unavailable or an internal invariant broke |

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::ports::{LedgerError, MarketError, VenueError};
use crate::domain::shared::ArithmeticError;
use crate::domain::trailing_stop::TrailingStopError;

/// Error codes for the trailing engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    /// Zero or dust amount.
    InvalidAmount,
    /// Malformed request field.
    InvalidRequest,
    /// Withdrawal exceeds balance.
    InsufficientShares,

    // State errors
    /// Pool cannot serve an open-pool operation.
    PoolNotOpen,
    /// Epoch already executed.
    PoolAlreadyExecuted,
    /// Nothing qualified for execution.
    NothingToExecute,

    // External errors
    /// Market, yield venue or ledger failed.
    CollaboratorFailure,

    // Internal errors
    /// Checked arithmetic failed.
    ArithmeticOverflow,
    /// Internal error.
    InternalError,
}

impl ErrorCode {
    /// Get the stable reason string.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::InvalidAmount => "INVALID_AMOUNT",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::InsufficientShares => "INSUFFICIENT_SHARES",
            Self::PoolNotOpen => "POOL_NOT_OPEN",
            Self::PoolAlreadyExecuted => "POOL_ALREADY_EXECUTED",
            Self::NothingToExecute => "NOTHING_TO_EXECUTE",
            Self::CollaboratorFailure => "COLLABORATOR_FAILURE",
            Self::ArithmeticOverflow => "ARITHMETIC_OVERFLOW",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Whether callers can treat the error as a no-op.
    #[must_use]
    pub const fn is_benign(&self) -> bool {
        matches!(self, Self::NothingToExecute)
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason())
    }
}

/// A rich error with context for the trailing engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct EngineError {
    /// Error code.
    code: ErrorCode,
    /// Human-readable message.
    message: String,
    /// Additional context (key-value pairs).
    context: Vec<(String, String)>,
}

impl EngineError {
    /// Create a new engine error.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: Vec::new(),
        }
    }

    /// Add context to the error.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.push((key.into(), value.into()));
        self
    }

    /// Get the error code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// Get the stable reason string.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        self.code.reason()
    }

    /// Whether callers can treat the error as a no-op.
    #[must_use]
    pub const fn is_benign(&self) -> bool {
        self.code.is_benign()
    }

    /// Get the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the context.
    #[must_use]
    pub fn context(&self) -> &[(String, String)] {
        &self.context
    }

    /// Look up one context value.
    #[must_use]
    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.context
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code.reason(), self.message)
    }
}

/// Convenience constructors for common errors.
impl EngineError {
    /// A collaborator failed.
    #[must_use]
    pub fn collaborator(collaborator: &str, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::CollaboratorFailure, message).with_context("collaborator", collaborator)
    }

    /// Internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl From<TrailingStopError> for EngineError {
    fn from(err: TrailingStopError) -> Self {
        let code = match &err {
            TrailingStopError::ZeroAmount { .. }
            | TrailingStopError::DustDeposit { .. }
            | TrailingStopError::DustWithdrawal { .. } => ErrorCode::InvalidAmount,
            TrailingStopError::UnknownTier { .. } | TrailingStopError::UnknownDirection { .. } => {
                ErrorCode::InvalidRequest
            }
            TrailingStopError::InsufficientShares { .. } => ErrorCode::InsufficientShares,
            TrailingStopError::PoolNotOpen { .. } => ErrorCode::PoolNotOpen,
            TrailingStopError::PoolAlreadyExecuted { .. } => ErrorCode::PoolAlreadyExecuted,
            TrailingStopError::NothingToExecute { .. } => ErrorCode::NothingToExecute,
            TrailingStopError::Arithmetic(_) => ErrorCode::ArithmeticOverflow,
        };
        Self::new(code, err.to_string())
    }
}

impl From<ArithmeticError> for EngineError {
    fn from(err: ArithmeticError) -> Self {
        Self::new(ErrorCode::ArithmeticOverflow, err.to_string())
    }
}

impl From<MarketError> for EngineError {
    fn from(err: MarketError) -> Self {
        Self::collaborator("market", err.to_string())
    }
}

impl From<VenueError> for EngineError {
    fn from(err: VenueError) -> Self {
        Self::collaborator("yield_venue", err.to_string())
    }
}

impl From<LedgerError> for EngineError {
    fn from(err: LedgerError) -> Self {
        Self::collaborator("ledger", err.to_string())
    }
}
