//! Arithmetic errors shared by every bounded context.

use thiserror::Error;

/// Failure of checked integer arithmetic.
///
/// Share and payout math never saturates or wraps; any of these surfaces to
/// callers instead of silently mispricing a claim.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticError {
    /// Result exceeded the representable range.
    #[error("arithmetic overflow")]
    Overflow,

    /// Subtraction went below zero.
    #[error("arithmetic underflow")]
    Underflow,

    /// Division by zero.
    #[error("division by zero")]
    DivisionByZero,
}
