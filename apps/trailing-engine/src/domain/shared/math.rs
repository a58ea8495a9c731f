//! Integer-only helpers for share accounting.
//!
//! Amounts are `u128`. Products are formed in 256 bits so `a * b / d` never
//! overflows before the division, and every quotient is floored.

use ethnum::U256;

use super::errors::ArithmeticError;

/// Compute `floor(a * b / denominator)`.
///
/// # Errors
///
/// Returns `DivisionByZero` for a zero denominator and `Overflow` when the
/// quotient does not fit in `u128`.
pub fn mul_div_floor(a: u128, b: u128, denominator: u128) -> Result<u128, ArithmeticError> {
    if denominator == 0 {
        return Err(ArithmeticError::DivisionByZero);
    }
    let quotient = U256::new(a) * U256::new(b) / U256::new(denominator);
    let (high, low) = quotient.into_words();
    if high != 0 {
        return Err(ArithmeticError::Overflow);
    }
    Ok(low)
}

/// Checked `a + b`.
///
/// # Errors
///
/// Returns `Overflow` when the sum exceeds `u128::MAX`.
pub fn add(a: u128, b: u128) -> Result<u128, ArithmeticError> {
    a.checked_add(b).ok_or(ArithmeticError::Overflow)
}

/// Checked `a - b`.
///
/// # Errors
///
/// Returns `Underflow` when `b > a`.
pub fn sub(a: u128, b: u128) -> Result<u128, ArithmeticError> {
    a.checked_sub(b).ok_or(ArithmeticError::Underflow)
}
