//! Binary operators over scalar and collection values

use std::cmp::Ordering;
use std::sync::Arc;

use crate::error::{EvalError, Result};
use crate::value::Value;

use super::safe_math;

fn invalid_operands(op: &str, left: &Value, right: &Value) -> EvalError {
    EvalError::eval(
        "Operator `{0}` is not defined for operand types `{1}` and `{2}`.",
        vec![
            op.to_string(),
            left.class_of().name().to_string(),
            right.class_of().name().to_string(),
        ],
    )
    .with_program_value("Left operand", left.clone())
    .with_program_value("Right operand", right.clone())
}

/// Both operands as floats, if both are numbers and at least one is a float.
fn mixed_floats(left: &Value, right: &Value) -> Option<(f64, f64)> {
    match (left, right) {
        (Value::Int(_), Value::Int(_)) => None,
        _ => Some((left.as_f64()?, right.as_f64()?)),
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Arithmetic Operations
// ═══════════════════════════════════════════════════════════════════════

/// `left + right`: numbers, string and list concatenation, durations and
/// data sizes.
pub fn add(left: &Value, right: &Value) -> Result<Value> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => safe_math::add(*a, *b).map(Value::Int),
        (Value::String(a), Value::String(b)) => Ok(Value::string(format!("{}{}", a, b))),
        (Value::List(a), Value::List(b)) => {
            let mut items = Vec::with_capacity(a.len() + b.len());
            items.extend(a.iter().cloned());
            items.extend(b.iter().cloned());
            Ok(Value::List(Arc::new(items)))
        }
        (Value::Duration(a), Value::Duration(b)) => Ok(Value::Duration(a.add(b))),
        (Value::DataSize(a), Value::DataSize(b)) => Ok(Value::DataSize(a.add(b))),
        _ => match mixed_floats(left, right) {
            Some((a, b)) => Ok(Value::Float(a + b)),
            None => Err(invalid_operands("+", left, right)),
        },
    }
}

/// `left - right`
pub fn subtract(left: &Value, right: &Value) -> Result<Value> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => safe_math::subtract(*a, *b).map(Value::Int),
        (Value::Duration(a), Value::Duration(b)) => Ok(Value::Duration(a.subtract(b))),
        (Value::DataSize(a), Value::DataSize(b)) => Ok(Value::DataSize(a.subtract(b))),
        _ => match mixed_floats(left, right) {
            Some((a, b)) => Ok(Value::Float(a - b)),
            None => Err(invalid_operands("-", left, right)),
        },
    }
}

/// `left * right`; quantities may be scaled from either side.
pub fn multiply(left: &Value, right: &Value) -> Result<Value> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => safe_math::multiply(*a, *b).map(Value::Int),
        (Value::Duration(d), n) | (n, Value::Duration(d)) if n.is_number() => {
            Ok(Value::Duration(d.multiply(n.as_f64().unwrap_or_default())))
        }
        (Value::DataSize(d), n) | (n, Value::DataSize(d)) if n.is_number() => {
            Ok(Value::DataSize(d.multiply(n.as_f64().unwrap_or_default())))
        }
        _ => match mixed_floats(left, right) {
            Some((a, b)) => Ok(Value::Float(a * b)),
            None => Err(invalid_operands("*", left, right)),
        },
    }
}

/// `left / right`; integer division yields a float.
pub fn divide(left: &Value, right: &Value) -> Result<Value> {
    match (left, right) {
        (Value::Duration(a), Value::Duration(b)) => Ok(Value::Float(a.divide_by(b))),
        (Value::DataSize(a), Value::DataSize(b)) => Ok(Value::Float(a.divide_by(b))),
        (Value::Duration(d), n) if n.is_number() => {
            Ok(Value::Duration(d.divide(n.as_f64().unwrap_or_default())))
        }
        (Value::DataSize(d), n) if n.is_number() => {
            Ok(Value::DataSize(d.divide(n.as_f64().unwrap_or_default())))
        }
        _ => match (left.is_number() && right.is_number(), left.as_f64(), right.as_f64()) {
            (true, Some(a), Some(b)) => Ok(Value::Float(a / b)),
            _ => Err(invalid_operands("/", left, right)),
        },
    }
}

/// `left ~/ right`, truncating toward zero.
pub fn int_divide(left: &Value, right: &Value) -> Result<Value> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => safe_math::truncating_divide(*a, *b).map(Value::Int),
        _ => match mixed_floats(left, right) {
            Some((a, b)) => safe_math::float_to_int(a / b).map(Value::Int),
            None => Err(invalid_operands("~/", left, right)),
        },
    }
}

/// `left % right`
pub fn remainder(left: &Value, right: &Value) -> Result<Value> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => safe_math::remainder(*a, *b).map(Value::Int),
        (Value::Duration(d), n) if n.is_number() => {
            Ok(Value::Duration(d.remainder(n.as_f64().unwrap_or_default())))
        }
        (Value::DataSize(d), n) if n.is_number() => {
            Ok(Value::DataSize(d.remainder(n.as_f64().unwrap_or_default())))
        }
        _ => match mixed_floats(left, right) {
            Some((a, b)) => Ok(Value::Float(a % b)),
            None => Err(invalid_operands("%", left, right)),
        },
    }
}

/// `left ** right`; a negative integer exponent yields a float.
pub fn pow(left: &Value, right: &Value) -> Result<Value> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) if *b >= 0 => safe_math::pow(*a, *b).map(Value::Int),
        (Value::Int(a), Value::Int(b)) => Ok(Value::Float((*a as f64).powf(*b as f64))),
        (Value::Duration(d), n) if n.is_number() => {
            Ok(Value::Duration(d.pow(n.as_f64().unwrap_or_default())))
        }
        (Value::DataSize(d), n) if n.is_number() => {
            Ok(Value::DataSize(d.pow(n.as_f64().unwrap_or_default())))
        }
        _ => match mixed_floats(left, right) {
            Some((a, b)) => Ok(Value::Float(a.powf(b))),
            None => Err(invalid_operands("**", left, right)),
        },
    }
}

/// `-value`
pub fn negate(value: &Value) -> Result<Value> {
    match value {
        Value::Int(n) => safe_math::negate(*n).map(Value::Int),
        Value::Float(f) => Ok(Value::Float(-f)),
        Value::Duration(d) => Ok(Value::Duration(d.multiply(-1.0))),
        Value::DataSize(d) => Ok(Value::DataSize(d.multiply(-1.0))),
        other => Err(EvalError::eval(
            "Operator `-` is not defined for operand type `{0}`.",
            vec![other.class_of().name().to_string()],
        )),
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Comparison Operations
// ═══════════════════════════════════════════════════════════════════════

/// Order two comparable values. `None` if either is NaN.
pub fn compare(left: &Value, right: &Value) -> Result<Option<Ordering>> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(Some(a.cmp(b))),
        (Value::String(a), Value::String(b)) => Ok(Some(a.cmp(b))),
        (Value::Duration(a), Value::Duration(b)) => Ok(a.compare(b)),
        (Value::DataSize(a), Value::DataSize(b)) => Ok(a.compare(b)),
        _ => match mixed_floats(left, right) {
            Some((a, b)) => Ok(a.partial_cmp(&b)),
            None => Err(invalid_operands("<", left, right)),
        },
    }
}

macro_rules! impl_comparison {
    ($name:ident, $($ord:pat_param)|+) => {
        #[doc = concat!("Comparison `", stringify!($name), "`; false when either operand is NaN.")]
        pub fn $name(left: &Value, right: &Value) -> Result<Value> {
            Ok(Value::Bool(matches!(compare(left, right)?, Some($($ord)|+))))
        }
    };
}

impl_comparison!(less_than, Ordering::Less);
impl_comparison!(less_equal, Ordering::Less | Ordering::Equal);
impl_comparison!(greater_than, Ordering::Greater);
impl_comparison!(greater_equal, Ordering::Greater | Ordering::Equal);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ArithmeticError;
    use crate::value::{DataSizeUnit, DurationUnit};

    #[test]
    fn test_int_arithmetic_is_checked() {
        assert_eq!(add(&Value::Int(2), &Value::Int(3)).unwrap(), Value::Int(5));
        assert!(matches!(
            add(&Value::Int(i64::MAX), &Value::Int(1)).unwrap_err(),
            EvalError::Arithmetic {
                kind: ArithmeticError::IntOverflow,
                ..
            }
        ));
    }

    #[test]
    fn test_mixed_numbers_widen() {
        assert_eq!(add(&Value::Int(1), &Value::Float(0.5)).unwrap(), Value::Float(1.5));
        assert_eq!(divide(&Value::Int(1), &Value::Int(2)).unwrap(), Value::Float(0.5));
        assert_eq!(int_divide(&Value::Float(7.5), &Value::Int(2)).unwrap(), Value::Int(3));
        assert_eq!(pow(&Value::Int(2), &Value::Int(-1)).unwrap(), Value::Float(0.5));
    }

    #[test]
    fn test_concatenation() {
        assert_eq!(
            add(&Value::string("ab"), &Value::string("cd")).unwrap(),
            Value::string("abcd")
        );
        assert_eq!(
            add(&Value::list(vec![Value::Int(1)]), &Value::list(vec![Value::Int(2)])).unwrap(),
            Value::list(vec![Value::Int(1), Value::Int(2)])
        );
    }

    #[test]
    fn test_quantity_operators() {
        let hour = Value::duration(1.0, DurationUnit::Hours);
        let half = Value::duration(30.0, DurationUnit::Minutes);
        assert_eq!(
            add(&hour, &half).unwrap(),
            Value::duration(1.5, DurationUnit::Hours)
        );
        assert_eq!(divide(&hour, &half).unwrap(), Value::Float(2.0));
        assert_eq!(
            multiply(&Value::Int(2), &half).unwrap(),
            Value::duration(1.0, DurationUnit::Hours)
        );
        let kib = Value::data_size(1.0, DataSizeUnit::Kibibytes);
        assert_eq!(
            greater_than(&kib, &Value::data_size(1.0, DataSizeUnit::Kilobytes)).unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(less_than(&Value::Int(1), &Value::Float(1.5)).unwrap(), Value::Bool(true));
        assert_eq!(
            less_equal(&Value::string("b"), &Value::string("a")).unwrap(),
            Value::Bool(false)
        );
        assert_eq!(
            greater_equal(&Value::Float(f64::NAN), &Value::Float(1.0)).unwrap(),
            Value::Bool(false)
        );
        assert!(less_than(&Value::Int(1), &Value::string("a")).is_err());
    }

    #[test]
    fn test_invalid_operands_message() {
        let err = subtract(&Value::string("a"), &Value::Int(1)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Operator `-` is not defined for operand types `String` and `Int`."
        );
        assert_eq!(err.program_values().len(), 2);
    }
}
