//! Checked integer arithmetic
//!
//! Every operation that can overflow 64-bit signed arithmetic reports an
//! [`ArithmeticError`] instead of wrapping or panicking.

use crate::error::{ArithmeticError, EvalError, Result};
use crate::value::Value;

fn overflow() -> EvalError {
    EvalError::arithmetic(ArithmeticError::IntOverflow, None)
}

/// `x + y`
pub fn add(x: i64, y: i64) -> Result<i64> {
    x.checked_add(y).ok_or_else(overflow)
}

/// `x - y`
pub fn subtract(x: i64, y: i64) -> Result<i64> {
    x.checked_sub(y).ok_or_else(overflow)
}

/// `x * y`
pub fn multiply(x: i64, y: i64) -> Result<i64> {
    x.checked_mul(y).ok_or_else(overflow)
}

/// `-x`
pub fn negate(x: i64) -> Result<i64> {
    x.checked_neg().ok_or_else(overflow)
}

/// `|x|`
pub fn abs(x: i64) -> Result<i64> {
    x.checked_abs().ok_or_else(overflow)
}

/// `x ~/ y`, rounding toward zero.
pub fn truncating_divide(x: i64, y: i64) -> Result<i64> {
    if y == 0 {
        return Err(EvalError::arithmetic(ArithmeticError::DivisionByZero, None));
    }
    // only i64::MIN / -1 overflows
    x.checked_div(y).ok_or_else(overflow)
}

/// `x % y`, taking the sign of the dividend.
pub fn remainder(x: i64, y: i64) -> Result<i64> {
    if y == 0 {
        return Err(EvalError::arithmetic(ArithmeticError::DivisionByZero, None));
    }
    Ok(x.wrapping_rem(y))
}

/// `x ** y` for a non-negative exponent.
pub fn pow(x: i64, y: i64) -> Result<i64> {
    if y < 0 {
        return Err(EvalError::bug("negative exponent in integer pow"));
    }
    match u32::try_from(y) {
        Ok(exp) => x.checked_pow(exp).ok_or_else(overflow),
        Err(_) => match x {
            0 | 1 => Ok(x),
            -1 => Ok(if y % 2 == 0 { 1 } else { -1 }),
            _ => Err(overflow()),
        },
    }
}

/// Narrow to 32 bits.
pub fn to_int32(x: i64) -> Result<i32> {
    i32::try_from(x)
        .map_err(|_| EvalError::arithmetic(ArithmeticError::IntValueTooLarge, Some(&Value::Int(x))))
}

/// Truncate a float toward zero into an integer.
pub fn float_to_int(x: f64) -> Result<i64> {
    if !x.is_finite() {
        return Err(EvalError::arithmetic(
            ArithmeticError::CannotConvertNonFiniteFloat,
            Some(&Value::Float(x)),
        )
        .with_program_value("Float", Value::Float(x)));
    }
    let truncated = x.trunc();
    // i64::MAX is not representable as f64; 2^63 is the first value out of range
    if truncated < -9_223_372_036_854_775_808.0 || truncated >= 9_223_372_036_854_775_808.0 {
        return Err(EvalError::arithmetic(
            ArithmeticError::CannotConvertLargeFloat,
            Some(&Value::Float(x)),
        )
        .with_program_value("Float", Value::Float(x)));
    }
    Ok(truncated as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(err: EvalError) -> Option<ArithmeticError> {
        match err {
            EvalError::Arithmetic { kind, .. } => Some(kind),
            _ => None,
        }
    }

    #[test]
    fn test_overflow_is_reported() {
        assert_eq!(kind(add(i64::MAX, 1).unwrap_err()), Some(ArithmeticError::IntOverflow));
        assert_eq!(kind(negate(i64::MIN).unwrap_err()), Some(ArithmeticError::IntOverflow));
        assert_eq!(multiply(3, 4).unwrap(), 12);
    }

    #[test]
    fn test_truncating_divide() {
        assert_eq!(truncating_divide(-7, 2).unwrap(), -3);
        assert_eq!(
            kind(truncating_divide(1, 0).unwrap_err()),
            Some(ArithmeticError::DivisionByZero)
        );
        assert_eq!(
            kind(truncating_divide(i64::MIN, -1).unwrap_err()),
            Some(ArithmeticError::IntOverflow)
        );
    }

    #[test]
    fn test_remainder_sign_follows_dividend() {
        assert_eq!(remainder(-7, 2).unwrap(), -1);
        assert_eq!(remainder(i64::MIN, -1).unwrap(), 0);
        assert!(remainder(1, 0).is_err());
    }

    #[test]
    fn test_pow() {
        assert_eq!(pow(2, 10).unwrap(), 1024);
        assert_eq!(pow(-1, u32::MAX as i64 + 1).unwrap(), 1);
        assert!(pow(2, 64).is_err());
    }

    #[test]
    fn test_conversions() {
        assert_eq!(to_int32(7).unwrap(), 7);
        assert_eq!(
            to_int32(1 << 40).unwrap_err().to_string(),
            "Integer value `1099511627776` is too large to fit into 32 bits."
        );
        assert_eq!(float_to_int(-2.9).unwrap(), -2);
        assert_eq!(
            kind(float_to_int(f64::NAN).unwrap_err()),
            Some(ArithmeticError::CannotConvertNonFiniteFloat)
        );
        assert_eq!(
            kind(float_to_int(1e19).unwrap_err()),
            Some(ArithmeticError::CannotConvertLargeFloat)
        );
    }
}
