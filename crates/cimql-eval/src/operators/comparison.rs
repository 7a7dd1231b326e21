//! Comparison operators
//!
//! Implements `=`, `<>`, `<`, `<=`, `>`, `>=` over resolved values. Operands
//! must share a comparability class; anything else is a type mismatch rather
//! than a silent false. Null never compares; it is tested with IS NULL.

use crate::error::{EvalError, EvalResult};
use cimql_ast::ComparisonOp;
use cimql_types::{CimObject, CqlArray, CqlValue};
use std::cmp::Ordering;

/// Evaluate a binary comparison between two resolved values
pub fn compare_values(op: ComparisonOp, left: &CqlValue, right: &CqlValue) -> EvalResult<bool> {
    if left.is_null() || right.is_null() {
        return Err(EvalError::null_operand(op.symbol()));
    }
    match op {
        ComparisonOp::Eq => values_equal(op, left, right),
        ComparisonOp::Ne => values_equal(op, left, right).map(|eq| !eq),
        ComparisonOp::Lt => ordering(op, left, right).map(|o| o == Some(Ordering::Less)),
        ComparisonOp::Gt => ordering(op, left, right).map(|o| o == Some(Ordering::Greater)),
        ComparisonOp::Le => ordering(op, left, right)
            .map(|o| matches!(o, Some(Ordering::Less | Ordering::Equal))),
        ComparisonOp::Ge => ordering(op, left, right)
            .map(|o| matches!(o, Some(Ordering::Greater | Ordering::Equal))),
        other => Err(EvalError::unsupported_operator(
            other.symbol(),
            format!("{}, {}", left.type_name(), right.type_name()),
        )),
    }
}

/// Numeric ordering across signedness and reals; `None` for NaN
pub fn numeric_cmp(left: &CqlValue, right: &CqlValue) -> Option<Ordering> {
    match (left, right) {
        (CqlValue::Uint64(a), CqlValue::Uint64(b)) => Some(a.cmp(b)),
        (CqlValue::Sint64(a), CqlValue::Sint64(b)) => Some(a.cmp(b)),
        (CqlValue::Uint64(a), CqlValue::Sint64(b)) => Some(match u64::try_from(*b) {
            Ok(b) => a.cmp(&b),
            Err(_) => Ordering::Greater,
        }),
        (CqlValue::Sint64(a), CqlValue::Uint64(b)) => Some(match u64::try_from(*a) {
            Ok(a) => a.cmp(b),
            Err(_) => Ordering::Less,
        }),
        _ => as_real(left)?.partial_cmp(&as_real(right)?),
    }
}

fn as_real(value: &CqlValue) -> Option<f64> {
    match value {
        CqlValue::Uint64(v) => Some(*v as f64),
        CqlValue::Sint64(v) => Some(*v as f64),
        CqlValue::Real(v) => Some(*v),
        _ => None,
    }
}

fn is_numeric(value: &CqlValue) -> bool {
    matches!(value, CqlValue::Uint64(_) | CqlValue::Sint64(_) | CqlValue::Real(_))
}

fn mismatch(op: ComparisonOp, left: &CqlValue, right: &CqlValue) -> EvalError {
    EvalError::type_mismatch(op.symbol(), left.type_name(), right.type_name())
}

fn ordering(op: ComparisonOp, left: &CqlValue, right: &CqlValue) -> EvalResult<Option<Ordering>> {
    match (left, right) {
        (l, r) if is_numeric(l) && is_numeric(r) => Ok(numeric_cmp(l, r)),
        (CqlValue::String(a), CqlValue::String(b)) => Ok(Some(a.cmp(b))),
        (CqlValue::DateTime(a), CqlValue::DateTime(b)) => a
            .compare(b)
            .map(Some)
            .ok_or_else(|| mismatch(op, left, right)),
        _ => Err(mismatch(op, left, right)),
    }
}

fn values_equal(op: ComparisonOp, left: &CqlValue, right: &CqlValue) -> EvalResult<bool> {
    match (left, right) {
        (l, r) if is_numeric(l) && is_numeric(r) => Ok(numeric_cmp(l, r) == Some(Ordering::Equal)),
        (CqlValue::String(a), CqlValue::String(b)) => Ok(a == b),
        (CqlValue::Boolean(a), CqlValue::Boolean(b)) => Ok(a == b),
        (CqlValue::DateTime(a), CqlValue::DateTime(b)) => a
            .compare(b)
            .map(|o| o == Ordering::Equal)
            .ok_or_else(|| mismatch(op, left, right)),
        (CqlValue::Reference(a), CqlValue::Reference(b)) => Ok(a == b),
        (CqlValue::Object(a), CqlValue::Object(b)) => Ok(objects_equal(a, b)),
        (CqlValue::Array(a), CqlValue::Array(b)) => arrays_equal(op, a, b),
        _ => Err(mismatch(op, left, right)),
    }
}

/// Same class, same property count, and every property equal after normalization
fn objects_equal(a: &CimObject, b: &CimObject) -> bool {
    match (a, b) {
        (CimObject::Instance(a), CimObject::Instance(b)) => {
            a.class_name.eq_ignore_ascii_case(&b.class_name)
                && a.properties.len() == b.properties.len()
                && a.properties.iter().all(|p| {
                    b.property(&p.name).is_some_and(|other| {
                        CqlValue::from_cim(&p.value) == CqlValue::from_cim(&other.value)
                    })
                })
        }
        (CimObject::Class(a), CimObject::Class(b)) => {
            a.name.eq_ignore_ascii_case(&b.name) && a.properties.len() == b.properties.len()
        }
        _ => false,
    }
}

fn items_equal(op: ComparisonOp, a: &CqlValue, b: &CqlValue) -> EvalResult<bool> {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ok(true),
        (true, false) | (false, true) => Ok(false),
        (false, false) => values_equal(op, a, b),
    }
}

fn contains(op: ComparisonOp, haystack: &CqlArray, needle: &CqlValue) -> EvalResult<bool> {
    for item in &haystack.items {
        if items_equal(op, item, needle)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Positional comparison when both arrays are ordered, mutual containment otherwise
fn arrays_equal(op: ComparisonOp, a: &CqlArray, b: &CqlArray) -> EvalResult<bool> {
    if a.kind.is_positional() && b.kind.is_positional() {
        if a.len() != b.len() {
            return Ok(false);
        }
        for (x, y) in a.items.iter().zip(&b.items) {
            if !items_equal(op, x, y)? {
                return Ok(false);
            }
        }
        return Ok(true);
    }
    for item in &a.items {
        if !contains(op, b, item)? {
            return Ok(false);
        }
    }
    for item in &b.items {
        if !contains(op, a, item)? {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cimql_diagnostics::ErrorKind;
    use cimql_types::{ArrayKind, CimDateTime, CqlValueType, Instance};
    use rstest::rstest;

    fn array(kind: ArrayKind, items: &[u64]) -> CqlValue {
        CqlValue::Array(
            CqlArray::new(
                CqlValueType::Uint64,
                items.iter().map(|v| CqlValue::Uint64(*v)).collect(),
            )
            .with_kind(kind),
        )
    }

    #[rstest]
    #[case(CqlValue::Uint64(2), CqlValue::Sint64(2), ComparisonOp::Eq, true)]
    #[case(CqlValue::Uint64(0), CqlValue::Sint64(-1), ComparisonOp::Gt, true)]
    #[case(CqlValue::Sint64(-5), CqlValue::Uint64(3), ComparisonOp::Lt, true)]
    #[case(CqlValue::Real(2.5), CqlValue::Uint64(2), ComparisonOp::Ge, true)]
    #[case(CqlValue::Real(2.0), CqlValue::Sint64(2), ComparisonOp::Ne, false)]
    #[case(CqlValue::from("abc"), CqlValue::from("abd"), ComparisonOp::Lt, true)]
    #[case(CqlValue::from("B"), CqlValue::from("a"), ComparisonOp::Le, true)]
    #[case(CqlValue::Boolean(true), CqlValue::Boolean(true), ComparisonOp::Eq, true)]
    fn test_compare(
        #[case] left: CqlValue,
        #[case] right: CqlValue,
        #[case] op: ComparisonOp,
        #[case] expected: bool,
    ) {
        assert_eq!(compare_values(op, &left, &right).unwrap(), expected);
    }

    #[rstest]
    #[case(CqlValue::Boolean(true), CqlValue::Boolean(false), ComparisonOp::Lt)]
    #[case(CqlValue::from("1"), CqlValue::Uint64(1), ComparisonOp::Eq)]
    #[case(array(ArrayKind::Indexed, &[1]), CqlValue::Uint64(1), ComparisonOp::Eq)]
    fn test_mismatch(#[case] left: CqlValue, #[case] right: CqlValue, #[case] op: ComparisonOp) {
        let err = compare_values(op, &left, &right).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Runtime);
        assert!(matches!(err, EvalError::TypeMismatch { .. }));
    }

    #[test]
    fn test_null_is_an_error_for_every_operator() {
        for op in [ComparisonOp::Eq, ComparisonOp::Ne, ComparisonOp::Lt] {
            let err = compare_values(op, &CqlValue::Null, &CqlValue::Uint64(1)).unwrap_err();
            assert!(matches!(err, EvalError::NullOperand { .. }));
        }
    }

    #[test]
    fn test_datetime_kinds_do_not_mix() {
        let ts = CqlValue::DateTime("20240101000000.000000+000".parse::<CimDateTime>().unwrap());
        let iv = CqlValue::DateTime(CimDateTime::from_interval_micros(5));
        assert!(compare_values(ComparisonOp::Eq, &ts, &iv).is_err());
        assert!(compare_values(ComparisonOp::Lt, &iv, &CqlValue::DateTime(CimDateTime::from_interval_micros(6))).unwrap());
    }

    #[test]
    fn test_array_equality() {
        let indexed = array(ArrayKind::Indexed, &[1, 2, 3]);
        let reversed = array(ArrayKind::Indexed, &[3, 2, 1]);
        let bag = array(ArrayKind::Bag, &[3, 1, 2, 2]);
        assert!(!compare_values(ComparisonOp::Eq, &indexed, &reversed).unwrap());
        assert!(compare_values(ComparisonOp::Eq, &indexed, &bag).unwrap());
        assert!(compare_values(ComparisonOp::Lt, &indexed, &bag).is_err());
    }

    #[test]
    fn test_object_equality() {
        let a = CqlValue::Object(Instance::new("CIM_Media").with_property("Size", 4u32).into());
        let b = CqlValue::Object(Instance::new("cim_media").with_property("size", 4u64).into());
        let c = CqlValue::Object(Instance::new("CIM_Media").with_property("Size", 5u32).into());
        assert!(compare_values(ComparisonOp::Eq, &a, &b).unwrap());
        assert!(compare_values(ComparisonOp::Ne, &a, &c).unwrap());
    }
}
