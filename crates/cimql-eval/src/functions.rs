//! Built-in functions
//!
//! Arguments are resolved before the call. A call with the wrong number of
//! arguments fails before any argument is resolved, and a null argument makes
//! the whole call null.

use crate::context::QueryContext;
use crate::engine::QueryEngine;
use crate::error::{EvalError, EvalResult};
use cimql_ast::{Function, FunctionKind};
use cimql_types::{CimDateTime, CimObject, CqlValue, Instance, ObjectPath};

impl QueryEngine {
    /// Call a built-in function on behalf of `instance`
    pub fn call_function(
        &self,
        function: &Function,
        instance: &Instance,
        ctx: &dyn QueryContext,
    ) -> EvalResult<CqlValue> {
        let kind = function.kind();
        let (min, max) = kind.arity();
        let found = function.args().len();
        if found < min || found > max {
            return Err(EvalError::ArgumentCount {
                function: kind.name().to_string(),
                expected: if min == max {
                    min.to_string()
                } else {
                    format!("{} to {}", min, max)
                },
                found,
            });
        }

        let args = function
            .args()
            .iter()
            .map(|arg| self.resolve_expression(arg, instance, ctx))
            .collect::<EvalResult<Vec<_>>>()?;
        if args.iter().any(CqlValue::is_null) {
            return Ok(CqlValue::Null);
        }
        let arg = args.into_iter().next();

        match kind {
            FunctionKind::ClassName => class_name(arg, instance),
            FunctionKind::NamespaceName => {
                let path = path_of(kind, arg, instance)?;
                Ok(path
                    .namespace
                    .or_else(|| ctx.namespace().map(str::to_string))
                    .map_or(CqlValue::Null, CqlValue::String))
            }
            FunctionKind::HostName => {
                let path = path_of(kind, arg, instance)?;
                Ok(path.host.map_or(CqlValue::Null, CqlValue::String))
            }
            FunctionKind::ModelPath => {
                Ok(CqlValue::String(path_of(kind, arg, instance)?.model_path()))
            }
            FunctionKind::ObjectPath => {
                Ok(CqlValue::String(path_of(kind, arg, instance)?.to_string()))
            }
            FunctionKind::UpperCase => Ok(CqlValue::String(string_arg(kind, arg)?.to_uppercase())),
            FunctionKind::StringToUint => parse_uint(&string_arg(kind, arg)?).map(CqlValue::Uint64),
            FunctionKind::StringToSint => parse_sint(&string_arg(kind, arg)?).map(CqlValue::Sint64),
            FunctionKind::StringToReal => parse_real(&string_arg(kind, arg)?).map(CqlValue::Real),
            FunctionKind::StringToNumeric => {
                let text = string_arg(kind, arg)?;
                parse_uint(&text)
                    .map(CqlValue::Uint64)
                    .or_else(|_| parse_sint(&text).map(CqlValue::Sint64))
                    .or_else(|_| parse_real(&text).map(CqlValue::Real))
                    .map_err(|_| EvalError::conversion(text.as_str(), "numeric"))
            }
            FunctionKind::NumericToString => match arg {
                Some(CqlValue::Uint64(v)) => Ok(CqlValue::String(v.to_string())),
                Some(CqlValue::Sint64(v)) => Ok(CqlValue::String(v.to_string())),
                Some(CqlValue::Real(v)) => Ok(CqlValue::String(v.to_string())),
                other => Err(wrong_type(kind, "numeric", other)),
            },
            FunctionKind::ReferenceToString => match arg {
                Some(CqlValue::Reference(path)) => Ok(CqlValue::String(path.to_string())),
                other => Err(wrong_type(kind, "Reference", other)),
            },
            FunctionKind::DateTimeToMicrosecond => match arg {
                Some(CqlValue::DateTime(dt)) => Ok(CqlValue::Uint64(dt.to_microseconds())),
                other => Err(wrong_type(kind, "DateTime", other)),
            },
            FunctionKind::MicrosecondToTimestamp => {
                let micros = micros_arg(kind, arg)?;
                CimDateTime::from_timestamp_micros(micros)
                    .map(CqlValue::DateTime)
                    .map_err(|_| EvalError::conversion(micros.to_string(), "timestamp"))
            }
            FunctionKind::MicrosecondToInterval => Ok(CqlValue::DateTime(
                CimDateTime::from_interval_micros(micros_arg(kind, arg)?),
            )),
            FunctionKind::DateTime => {
                let text = string_arg(kind, arg)?;
                text.parse::<CimDateTime>()
                    .map(CqlValue::DateTime)
                    .map_err(|_| EvalError::conversion(text, "datetime"))
            }
            FunctionKind::CurrentDateTime => Ok(CqlValue::DateTime(CimDateTime::now())),
        }
    }
}

fn wrong_type(kind: FunctionKind, expected: &str, found: Option<CqlValue>) -> EvalError {
    let found = found.map_or_else(|| "nothing".to_string(), |v| v.type_name());
    EvalError::argument_type(kind.name(), expected, found)
}

fn string_arg(kind: FunctionKind, arg: Option<CqlValue>) -> EvalResult<String> {
    match arg {
        Some(CqlValue::String(s)) => Ok(s),
        other => Err(wrong_type(kind, "String", other)),
    }
}

fn micros_arg(kind: FunctionKind, arg: Option<CqlValue>) -> EvalResult<u64> {
    match arg {
        Some(CqlValue::Uint64(v)) => Ok(v),
        Some(CqlValue::Sint64(v)) => {
            u64::try_from(v).map_err(|_| EvalError::conversion(v.to_string(), "microseconds"))
        }
        other => Err(wrong_type(kind, "unsigned integer", other)),
    }
}

fn parse_uint(text: &str) -> EvalResult<u64> {
    let text = text.trim();
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => text.strip_prefix('+').unwrap_or(text).parse(),
    };
    parsed.map_err(|_| EvalError::conversion(text, "Uint64"))
}

fn parse_sint(text: &str) -> EvalResult<i64> {
    let text = text.trim();
    text.parse().map_err(|_| EvalError::conversion(text, "Sint64"))
}

fn parse_real(text: &str) -> EvalResult<f64> {
    let text = text.trim();
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(EvalError::conversion(text, "Real64")),
    }
}

/// CLASSNAME of the candidate, an embedded object, a reference or a path string
fn class_name(arg: Option<CqlValue>, instance: &Instance) -> EvalResult<CqlValue> {
    let name = match arg {
        None => instance.class_name.clone(),
        Some(CqlValue::Object(object)) => object.class_name().to_string(),
        Some(CqlValue::Reference(path)) => path.class_name,
        Some(CqlValue::String(text)) => parse_path(&text)?.class_name,
        other => return Err(wrong_type(FunctionKind::ClassName, "Object or Reference", other)),
    };
    Ok(CqlValue::String(name))
}

fn parse_path(text: &str) -> EvalResult<ObjectPath> {
    text.parse::<ObjectPath>()
        .map_err(|_| EvalError::conversion(text, "Reference"))
}

/// The object path a path function inspects; the candidate's own by default
fn path_of(kind: FunctionKind, arg: Option<CqlValue>, instance: &Instance) -> EvalResult<ObjectPath> {
    match arg {
        None => Ok(instance_path(instance)),
        Some(CqlValue::Reference(path)) => Ok(path),
        Some(CqlValue::String(text)) => parse_path(&text),
        Some(CqlValue::Object(CimObject::Instance(object))) => Ok(instance_path(&object)),
        other => Err(wrong_type(kind, "Object or Reference", other)),
    }
}

fn instance_path(instance: &Instance) -> ObjectPath {
    instance
        .path
        .clone()
        .unwrap_or_else(|| ObjectPath::new(&instance.class_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SchemaContext;
    use cimql_ast::Expression;
    use cimql_diagnostics::ErrorKind;
    use cimql_types::{CqlValueType, KeyValue};
    use rstest::rstest;

    // ============================================================================
    // Test Helpers
    // ============================================================================

    fn call(kind: FunctionKind, args: Vec<CqlValue>) -> EvalResult<CqlValue> {
        let instance = Instance::new("CIM_Disk").with_path(
            ObjectPath::new("CIM_Disk")
                .with_host("server1")
                .with_namespace("root/cimv2")
                .with_key("DeviceID", KeyValue::String("disk0".into())),
        );
        let ctx = SchemaContext::builder().from_class("CIM_Disk").build();
        let function = Function::new(kind, args.into_iter().map(Expression::value).collect());
        QueryEngine::new().call_function(&function, &instance, &ctx)
    }

    #[rstest]
    #[case(FunctionKind::StringToUint, "42", CqlValue::Uint64(42))]
    #[case(FunctionKind::StringToUint, "0x1F", CqlValue::Uint64(31))]
    #[case(FunctionKind::StringToSint, "-7", CqlValue::Sint64(-7))]
    #[case(FunctionKind::StringToReal, "2.5", CqlValue::Real(2.5))]
    #[case(FunctionKind::StringToNumeric, "12", CqlValue::Uint64(12))]
    #[case(FunctionKind::StringToNumeric, "-12", CqlValue::Sint64(-12))]
    #[case(FunctionKind::StringToNumeric, "1.5", CqlValue::Real(1.5))]
    #[case(FunctionKind::UpperCase, "disk", CqlValue::from("DISK"))]
    fn test_string_conversions(
        #[case] kind: FunctionKind,
        #[case] input: &str,
        #[case] expected: CqlValue,
    ) {
        assert_eq!(call(kind, vec![CqlValue::from(input)]).unwrap(), expected);
    }

    #[test]
    fn test_unparsable_number_is_conversion_error() {
        let err = call(FunctionKind::StringToUint, vec![CqlValue::from("-1")]).unwrap_err();
        assert!(matches!(err, EvalError::ConversionError { .. }));
        assert_eq!(err.kind(), ErrorKind::Runtime);
    }

    #[test]
    fn test_argument_count() {
        let err = call(FunctionKind::UpperCase, vec![]).unwrap_err();
        assert!(matches!(err, EvalError::ArgumentCount { found: 0, .. }));
        let err = call(FunctionKind::CurrentDateTime, vec![CqlValue::Uint64(1)]).unwrap_err();
        assert!(matches!(err, EvalError::ArgumentCount { found: 1, .. }));
    }

    #[test]
    fn test_argument_type() {
        let err = call(FunctionKind::UpperCase, vec![CqlValue::Uint64(1)]).unwrap_err();
        assert!(matches!(err, EvalError::ArgumentType { .. }));
    }

    #[test]
    fn test_null_argument_gives_null() {
        assert_eq!(call(FunctionKind::UpperCase, vec![CqlValue::Null]).unwrap(), CqlValue::Null);
    }

    #[test]
    fn test_path_functions_default_to_candidate() {
        assert_eq!(call(FunctionKind::ClassName, vec![]).unwrap(), CqlValue::from("CIM_Disk"));
        assert_eq!(
            call(FunctionKind::NamespaceName, vec![]).unwrap(),
            CqlValue::from("root/cimv2")
        );
        assert_eq!(call(FunctionKind::HostName, vec![]).unwrap(), CqlValue::from("server1"));
        assert_eq!(
            call(FunctionKind::ModelPath, vec![]).unwrap(),
            CqlValue::from("CIM_Disk.DeviceID=\"disk0\"")
        );
    }

    #[test]
    fn test_classname_of_reference() {
        let path = ObjectPath::new("CIM_Media").with_key("Tag", KeyValue::String("m1".into()));
        assert_eq!(
            call(FunctionKind::ClassName, vec![CqlValue::Reference(path)]).unwrap(),
            CqlValue::from("CIM_Media")
        );
    }

    #[test]
    fn test_microsecond_round_trip() {
        let dt = call(FunctionKind::MicrosecondToInterval, vec![CqlValue::Uint64(90_000_000)]).unwrap();
        assert_eq!(dt.value_type(), CqlValueType::DateTime);
        assert_eq!(
            call(FunctionKind::DateTimeToMicrosecond, vec![dt]).unwrap(),
            CqlValue::Uint64(90_000_000)
        );
    }

    #[test]
    fn test_datetime_parse_failure() {
        let err = call(FunctionKind::DateTime, vec![CqlValue::from("yesterday")]).unwrap_err();
        assert!(matches!(err, EvalError::ConversionError { .. }));
    }
}
