//! Scalar kernels for unary and binary ops.
//!
//! Null propagates through arithmetic and bitwise ops. Comparisons order
//! null before every other value and consider nulls equal. Logical ops go
//! through truthiness, so null behaves as false there.

use pmql_error::{PmqlError, Result};

use super::{BinaryOp, UnaryOp};
use crate::scalar::ScalarValue;

pub fn apply_unary(op: UnaryOp, arg: &ScalarValue) -> Result<ScalarValue> {
    use ScalarValue as V;

    match op {
        UnaryOp::Neg => match arg {
            V::Null => Ok(V::Null),
            V::Int64(v) => match v.checked_neg() {
                Some(v) => Ok(V::Int64(v)),
                None => Err(overflow(op.name())),
            },
            V::Float64(v) => Ok(V::Float64(-v)),
            other => Err(incompatible_unary(op, other)),
        },
        UnaryOp::Not => match arg {
            V::Utf8(_) => Err(incompatible_unary(op, arg)),
            other => Ok(V::Boolean(!other.truthiness()?)),
        },
        UnaryOp::BitNot => match arg {
            V::Null => Ok(V::Null),
            V::Int64(v) => Ok(V::Int64(!v)),
            other => Err(incompatible_unary(op, other)),
        },
    }
}

pub fn apply_binary(op: BinaryOp, left: &ScalarValue, right: &ScalarValue) -> Result<ScalarValue> {
    use ScalarValue as V;

    match op {
        BinaryOp::Add => match (left, right) {
            (V::Utf8(a), V::Utf8(b)) => Ok(V::Utf8(format!("{a}{b}"))),
            _ => arith(op, left, right),
        },
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => arith(op, left, right),
        BinaryOp::Rem | BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor => {
            match (left, right) {
                (V::Null, _) | (_, V::Null) => Ok(V::Null),
                (V::Int64(a), V::Int64(b)) => int_kernel(op, *a, *b),
                _ => Err(incompatible(op, left, right)),
            }
        }
        BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::Gt | BinaryOp::Lt | BinaryOp::GtEq
        | BinaryOp::LtEq => compare(op, left, right),
        BinaryOp::And => Ok(V::Boolean(
            logical_operand(op, left)? && logical_operand(op, right)?,
        )),
        BinaryOp::Or => Ok(V::Boolean(
            logical_operand(op, left)? || logical_operand(op, right)?,
        )),
    }
}

/// Numeric arithmetic with null propagation and int-to-float promotion.
/// Integer math is checked, float math follows IEEE 754.
fn arith(op: BinaryOp, left: &ScalarValue, right: &ScalarValue) -> Result<ScalarValue> {
    use ScalarValue as V;

    match (left, right) {
        (V::Null, _) | (_, V::Null) => Ok(V::Null),
        (V::Int64(a), V::Int64(b)) => int_kernel(op, *a, *b),
        (V::Float64(a), V::Float64(b)) => Ok(V::Float64(float_kernel(op, *a, *b))),
        (V::Int64(a), V::Float64(b)) => Ok(V::Float64(float_kernel(op, *a as f64, *b))),
        (V::Float64(a), V::Int64(b)) => Ok(V::Float64(float_kernel(op, *a, *b as f64))),
        _ => Err(incompatible(op, left, right)),
    }
}

fn int_kernel(op: BinaryOp, a: i64, b: i64) -> Result<ScalarValue> {
    let checked = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div if b == 0 => {
            return Err(PmqlError::new("Division by zero").with_field("op", op));
        }
        BinaryOp::Div => a.checked_div(b),
        BinaryOp::Rem if b == 0 => {
            return Err(PmqlError::new("Division by zero").with_field("op", op));
        }
        BinaryOp::Rem => a.checked_rem(b),
        BinaryOp::BitAnd => Some(a & b),
        BinaryOp::BitOr => Some(a | b),
        BinaryOp::BitXor => Some(a ^ b),
        _ => unreachable!("not an integer kernel: {op}"),
    };

    match checked {
        Some(v) => Ok(ScalarValue::Int64(v)),
        None => Err(overflow(op.name())),
    }
}

fn float_kernel(op: BinaryOp, a: f64, b: f64) -> f64 {
    match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        _ => unreachable!("not a float kernel: {op}"),
    }
}

fn compare(op: BinaryOp, left: &ScalarValue, right: &ScalarValue) -> Result<ScalarValue> {
    use ScalarValue as V;

    let outcome = match (left, right) {
        (V::Null, V::Null) => compare_ordering(op, std::cmp::Ordering::Equal),
        // Null orders before any non-null value.
        (V::Null, _) => compare_ordering(op, std::cmp::Ordering::Less),
        (_, V::Null) => compare_ordering(op, std::cmp::Ordering::Greater),
        (V::Boolean(a), V::Boolean(b)) => compare_values(op, a, b),
        (V::Int64(a), V::Int64(b)) => compare_values(op, a, b),
        (V::Float64(a), V::Float64(b)) => compare_values(op, a, b),
        (V::Int64(a), V::Float64(b)) => compare_values(op, &(*a as f64), b),
        (V::Float64(a), V::Int64(b)) => compare_values(op, a, &(*b as f64)),
        (V::Utf8(a), V::Utf8(b)) => compare_values(op, a, b),
        _ => return Err(incompatible(op, left, right)),
    };

    Ok(V::Boolean(outcome))
}

fn compare_values<T: PartialOrd + ?Sized>(op: BinaryOp, a: &T, b: &T) -> bool {
    match op {
        BinaryOp::Eq => a == b,
        BinaryOp::NotEq => a != b,
        BinaryOp::Gt => a > b,
        BinaryOp::Lt => a < b,
        BinaryOp::GtEq => a >= b,
        BinaryOp::LtEq => a <= b,
        _ => unreachable!("not a comparison: {op}"),
    }
}

fn compare_ordering(op: BinaryOp, ord: std::cmp::Ordering) -> bool {
    match op {
        BinaryOp::Eq => ord.is_eq(),
        BinaryOp::NotEq => ord.is_ne(),
        BinaryOp::Gt => ord.is_gt(),
        BinaryOp::Lt => ord.is_lt(),
        BinaryOp::GtEq => ord.is_ge(),
        BinaryOp::LtEq => ord.is_le(),
        _ => unreachable!("not a comparison: {op}"),
    }
}

fn logical_operand(op: BinaryOp, value: &ScalarValue) -> Result<bool> {
    match value {
        ScalarValue::Utf8(_) => Err(incompatible(op, value, value)),
        other => other.truthiness(),
    }
}

fn incompatible(op: BinaryOp, left: &ScalarValue, right: &ScalarValue) -> PmqlError {
    PmqlError::new(format!("Operation '{op}' cannot be applied to its arguments"))
        .with_field("left", left.datatype())
        .with_field("right", right.datatype())
}

fn incompatible_unary(op: UnaryOp, arg: &ScalarValue) -> PmqlError {
    PmqlError::new(format!("Operation '{op}' cannot be applied to its argument"))
        .with_field("arg", arg.datatype())
}

fn overflow(op: &'static str) -> PmqlError {
    PmqlError::new("Integer overflow").with_field("op", op)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ScalarValue as V;

    #[test]
    fn null_propagates_through_arithmetic() {
        assert_eq!(
            V::Null,
            apply_binary(BinaryOp::Add, &V::Null, &V::Int64(1)).unwrap()
        );
        assert_eq!(
            V::Null,
            apply_binary(BinaryOp::BitXor, &V::Int64(1), &V::Null).unwrap()
        );
        assert_eq!(V::Null, apply_unary(UnaryOp::Neg, &V::Null).unwrap());
        assert_eq!(V::Null, apply_unary(UnaryOp::BitNot, &V::Null).unwrap());
    }

    #[test]
    fn null_comparisons() {
        assert_eq!(
            V::Boolean(true),
            apply_binary(BinaryOp::Eq, &V::Null, &V::Null).unwrap()
        );
        assert_eq!(
            V::Boolean(true),
            apply_binary(BinaryOp::Lt, &V::Null, &V::Int64(i64::MIN)).unwrap()
        );
        assert_eq!(
            V::Boolean(false),
            apply_binary(BinaryOp::LtEq, &V::Utf8("".to_string()), &V::Null).unwrap()
        );
        assert_eq!(
            V::Boolean(true),
            apply_binary(BinaryOp::NotEq, &V::Null, &V::Boolean(false)).unwrap()
        );
    }

    #[test]
    fn null_in_logical_ops_is_false() {
        assert_eq!(
            V::Boolean(false),
            apply_binary(BinaryOp::And, &V::Null, &V::Boolean(true)).unwrap()
        );
        assert_eq!(
            V::Boolean(true),
            apply_binary(BinaryOp::Or, &V::Null, &V::Int64(7)).unwrap()
        );
        assert_eq!(V::Boolean(true), apply_unary(UnaryOp::Not, &V::Null).unwrap());
    }

    #[test]
    fn mixed_numeric_promotion() {
        assert_eq!(
            V::Float64(4.5),
            apply_binary(BinaryOp::Add, &V::Int64(4), &V::Float64(0.5)).unwrap()
        );
        assert_eq!(
            V::Boolean(true),
            apply_binary(BinaryOp::Gt, &V::Float64(4.5), &V::Int64(4)).unwrap()
        );
    }

    #[test]
    fn string_concat_and_compare() {
        assert_eq!(
            V::Utf8("ab".to_string()),
            apply_binary(BinaryOp::Add, &V::Utf8("a".into()), &V::Utf8("b".into())).unwrap()
        );
        assert_eq!(
            V::Boolean(true),
            apply_binary(BinaryOp::Lt, &V::Utf8("a".into()), &V::Utf8("b".into())).unwrap()
        );
        assert!(apply_binary(BinaryOp::Sub, &V::Utf8("a".into()), &V::Utf8("b".into())).is_err());
        assert!(apply_binary(BinaryOp::And, &V::Utf8("a".into()), &V::Boolean(true)).is_err());
    }

    #[test]
    fn integer_errors() {
        assert!(apply_binary(BinaryOp::Div, &V::Int64(1), &V::Int64(0)).is_err());
        assert!(apply_binary(BinaryOp::Rem, &V::Int64(1), &V::Int64(0)).is_err());
        assert!(apply_binary(BinaryOp::Add, &V::Int64(i64::MAX), &V::Int64(1)).is_err());
        assert!(apply_unary(UnaryOp::Neg, &V::Int64(i64::MIN)).is_err());
    }

    #[test]
    fn float_division_follows_ieee() {
        assert_eq!(
            V::Float64(f64::INFINITY),
            apply_binary(BinaryOp::Div, &V::Float64(1.0), &V::Float64(0.0)).unwrap()
        );
    }

    #[test]
    fn type_mismatches_error() {
        assert!(apply_binary(BinaryOp::Add, &V::Boolean(true), &V::Int64(1)).is_err());
        assert!(apply_binary(BinaryOp::Eq, &V::Utf8("1".into()), &V::Int64(1)).is_err());
        assert!(apply_unary(UnaryOp::BitNot, &V::Float64(1.0)).is_err());
        assert!(apply_unary(UnaryOp::Neg, &V::Boolean(true)).is_err());
    }
}
