//! Arithmetic and string operators
//!
//! Only `+` (numeric addition or string concatenation) and `||` have defined
//! evaluation. `-`, `*` and `/` are accepted by the tree but evaluate to an
//! unsupported-operator error.

use crate::error::{EvalError, EvalResult};
use cimql_ast::{ExpressionOp, TermOp};
use cimql_types::CqlValue;

/// Apply an additive operator
pub fn apply_expression_op(op: ExpressionOp, left: CqlValue, right: CqlValue) -> EvalResult<CqlValue> {
    match op {
        ExpressionOp::Plus => add(left, right),
        ExpressionOp::Minus => Err(unsupported(op.symbol(), &left, &right)),
    }
}

/// Apply a multiplicative or concatenation operator
pub fn apply_term_op(op: TermOp, left: CqlValue, right: CqlValue) -> EvalResult<CqlValue> {
    match op {
        TermOp::Concat => concat(left, right),
        TermOp::Multiply | TermOp::Divide => Err(unsupported(op.symbol(), &left, &right)),
    }
}

fn unsupported(symbol: &str, left: &CqlValue, right: &CqlValue) -> EvalError {
    EvalError::unsupported_operator(symbol, format!("{}, {}", left.type_name(), right.type_name()))
}

/// `+`: unsigned stays unsigned, any real gives real, otherwise signed
pub fn add(left: CqlValue, right: CqlValue) -> EvalResult<CqlValue> {
    if left.is_null() || right.is_null() {
        return Err(EvalError::null_operand("+"));
    }
    match (&left, &right) {
        (CqlValue::Uint64(a), CqlValue::Uint64(b)) => a
            .checked_add(*b)
            .map(CqlValue::Uint64)
            .ok_or_else(|| EvalError::overflow(format!("{} + {}", a, b))),
        (CqlValue::Real(a), CqlValue::Real(b)) => Ok(CqlValue::Real(a + b)),
        (CqlValue::Real(a), CqlValue::Uint64(b)) | (CqlValue::Uint64(b), CqlValue::Real(a)) => {
            Ok(CqlValue::Real(a + *b as f64))
        }
        (CqlValue::Real(a), CqlValue::Sint64(b)) | (CqlValue::Sint64(b), CqlValue::Real(a)) => {
            Ok(CqlValue::Real(a + *b as f64))
        }
        (CqlValue::Sint64(_) | CqlValue::Uint64(_), CqlValue::Sint64(_) | CqlValue::Uint64(_)) => {
            let a = to_signed(&left)?;
            let b = to_signed(&right)?;
            a.checked_add(b)
                .map(CqlValue::Sint64)
                .ok_or_else(|| EvalError::overflow(format!("{} + {}", a, b)))
        }
        (CqlValue::String(a), CqlValue::String(b)) => Ok(CqlValue::String(format!("{}{}", a, b))),
        _ => Err(EvalError::type_mismatch("+", left.type_name(), right.type_name())),
    }
}

fn to_signed(value: &CqlValue) -> EvalResult<i64> {
    match value {
        CqlValue::Sint64(v) => Ok(*v),
        CqlValue::Uint64(v) => {
            i64::try_from(*v).map_err(|_| EvalError::overflow(format!("{} as sint64", v)))
        }
        other => Err(EvalError::type_mismatch("+", other.type_name(), "Sint64")),
    }
}

/// `||`: strings only
pub fn concat(left: CqlValue, right: CqlValue) -> EvalResult<CqlValue> {
    match (left, right) {
        (CqlValue::String(mut a), CqlValue::String(b)) => {
            a.push_str(&b);
            Ok(CqlValue::String(a))
        }
        (CqlValue::Null, _) | (_, CqlValue::Null) => Err(EvalError::null_operand("||")),
        (a, b) => Err(EvalError::type_mismatch("||", a.type_name(), b.type_name())),
    }
}

/// Unary NOT on a factor: logical for booleans, negation for numbers
pub fn invert(value: CqlValue) -> EvalResult<CqlValue> {
    match value {
        CqlValue::Boolean(b) => Ok(CqlValue::Boolean(!b)),
        CqlValue::Sint64(v) => v
            .checked_neg()
            .map(CqlValue::Sint64)
            .ok_or_else(|| EvalError::overflow(format!("-({})", v))),
        CqlValue::Uint64(v) => 0i64
            .checked_sub_unsigned(v)
            .map(CqlValue::Sint64)
            .ok_or_else(|| EvalError::overflow(format!("-({})", v))),
        CqlValue::Real(v) => Ok(CqlValue::Real(-v)),
        CqlValue::Null => Err(EvalError::null_operand("NOT")),
        other => Err(EvalError::type_mismatch("NOT", other.type_name(), "Boolean")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(CqlValue::Uint64(2), CqlValue::Uint64(3), CqlValue::Uint64(5))]
    #[case(CqlValue::Uint64(2), CqlValue::Sint64(-3), CqlValue::Sint64(-1))]
    #[case(CqlValue::Sint64(-2), CqlValue::Real(0.5), CqlValue::Real(-1.5))]
    #[case(CqlValue::from("Disk"), CqlValue::from("1"), CqlValue::from("Disk1"))]
    fn test_add(#[case] left: CqlValue, #[case] right: CqlValue, #[case] expected: CqlValue) {
        assert_eq!(add(left, right).unwrap(), expected);
    }

    #[test]
    fn test_add_overflow() {
        let err = add(CqlValue::Uint64(u64::MAX), CqlValue::Uint64(1)).unwrap_err();
        assert!(matches!(err, EvalError::Overflow { .. }));
        let err = add(CqlValue::Uint64(u64::MAX), CqlValue::Sint64(-1)).unwrap_err();
        assert!(matches!(err, EvalError::Overflow { .. }));
    }

    #[test]
    fn test_add_mismatch() {
        let err = add(CqlValue::from("a"), CqlValue::Uint64(1)).unwrap_err();
        assert!(matches!(err, EvalError::TypeMismatch { .. }));
        assert!(concat(CqlValue::Uint64(1), CqlValue::from("a")).is_err());
    }

    #[test]
    fn test_reserved_operators() {
        let err = apply_expression_op(ExpressionOp::Minus, CqlValue::Uint64(3), CqlValue::Uint64(1))
            .unwrap_err();
        assert!(matches!(err, EvalError::UnsupportedOperator { .. }));
        assert!(apply_term_op(TermOp::Divide, CqlValue::Uint64(3), CqlValue::Uint64(1)).is_err());
    }

    #[test]
    fn test_invert() {
        assert_eq!(invert(CqlValue::Boolean(true)).unwrap(), CqlValue::Boolean(false));
        assert_eq!(invert(CqlValue::Uint64(5)).unwrap(), CqlValue::Sint64(-5));
        assert_eq!(invert(CqlValue::Uint64(1 << 63)).unwrap(), CqlValue::Sint64(i64::MIN));
        assert!(invert(CqlValue::Uint64(u64::MAX)).is_err());
        assert!(invert(CqlValue::from("x")).is_err());
    }
}
