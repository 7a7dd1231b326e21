//! Query values - the normalized runtime representation used by the evaluator
//!
//! CIM property values arrive in many widths ([`CimValue`]); the evaluator
//! works over a narrower set of kinds: 64-bit signed and unsigned integers,
//! reals, strings, booleans, datetimes, references and embedded objects.
//! A value may also hold an unresolved property chain until it is resolved
//! against a candidate instance.

use crate::{ChainedIdentifier, CimDateTime, CimObject, CimType, CimValue, ObjectPath};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a query value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CqlValueType {
    Boolean,
    Sint64,
    Uint64,
    Real,
    String,
    DateTime,
    Reference,
    Object,
    Identifier,
    Null,
}

impl CqlValueType {
    /// Name used in diagnostics
    pub const fn name(&self) -> &'static str {
        match self {
            CqlValueType::Boolean => "Boolean",
            CqlValueType::Sint64 => "Sint64",
            CqlValueType::Uint64 => "Uint64",
            CqlValueType::Real => "Real",
            CqlValueType::String => "String",
            CqlValueType::DateTime => "DateTime",
            CqlValueType::Reference => "Reference",
            CqlValueType::Object => "Object",
            CqlValueType::Identifier => "Identifier",
            CqlValueType::Null => "Null",
        }
    }

    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Sint64 | Self::Uint64 | Self::Real)
    }

    /// The query kind a CIM type normalizes to
    pub const fn from_cim_type(cim_type: CimType) -> Self {
        match cim_type {
            CimType::Boolean => Self::Boolean,
            CimType::Uint8 | CimType::Uint16 | CimType::Uint32 | CimType::Uint64 => Self::Uint64,
            CimType::Sint8 | CimType::Sint16 | CimType::Sint32 | CimType::Sint64 => Self::Sint64,
            CimType::Real32 | CimType::Real64 => Self::Real,
            CimType::Char16 | CimType::String => Self::String,
            CimType::DateTime => Self::DateTime,
            CimType::Reference => Self::Reference,
            CimType::Object | CimType::Instance => Self::Object,
        }
    }
}

impl fmt::Display for CqlValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How array equality treats element order, from the `ArrayType` qualifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ArrayKind {
    #[default]
    Indexed,
    Ordered,
    Bag,
}

impl ArrayKind {
    /// Parse an `ArrayType` qualifier value; unknown values fall back to Indexed
    pub fn from_qualifier(value: &str) -> Self {
        if value.eq_ignore_ascii_case("bag") {
            ArrayKind::Bag
        } else if value.eq_ignore_ascii_case("ordered") {
            ArrayKind::Ordered
        } else {
            ArrayKind::Indexed
        }
    }

    /// Indexed and Ordered arrays compare element by element
    pub const fn is_positional(&self) -> bool {
        matches!(self, Self::Indexed | Self::Ordered)
    }
}

/// A homogeneous array of query values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CqlArray {
    pub element_type: CqlValueType,
    #[serde(default)]
    pub kind: ArrayKind,
    pub items: Vec<CqlValue>,
}

impl CqlArray {
    pub fn new(element_type: CqlValueType, items: Vec<CqlValue>) -> Self {
        Self {
            element_type,
            kind: ArrayKind::Indexed,
            items,
        }
    }

    pub fn with_kind(mut self, kind: ArrayKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A query runtime value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum CqlValue {
    /// No value
    Null,
    Boolean(bool),
    Sint64(i64),
    Uint64(u64),
    Real(f64),
    String(String),
    DateTime(CimDateTime),
    Reference(ObjectPath),
    /// Embedded class or instance
    Object(CimObject),
    Array(CqlArray),
    /// Unresolved property chain
    Identifier(ChainedIdentifier),
}

impl CqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CqlValue::Null)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, CqlValue::Array(_))
    }

    /// True once the value no longer refers to a property chain
    pub fn is_resolved(&self) -> bool {
        !matches!(self, CqlValue::Identifier(_))
    }

    /// The value kind; arrays report their element type
    pub fn value_type(&self) -> CqlValueType {
        match self {
            CqlValue::Null => CqlValueType::Null,
            CqlValue::Boolean(_) => CqlValueType::Boolean,
            CqlValue::Sint64(_) => CqlValueType::Sint64,
            CqlValue::Uint64(_) => CqlValueType::Uint64,
            CqlValue::Real(_) => CqlValueType::Real,
            CqlValue::String(_) => CqlValueType::String,
            CqlValue::DateTime(_) => CqlValueType::DateTime,
            CqlValue::Reference(_) => CqlValueType::Reference,
            CqlValue::Object(_) => CqlValueType::Object,
            CqlValue::Array(array) => array.element_type,
            CqlValue::Identifier(_) => CqlValueType::Identifier,
        }
    }

    /// Type name for diagnostics, with `[]` for arrays
    pub fn type_name(&self) -> String {
        match self {
            CqlValue::Array(array) => format!("{}[]", array.element_type),
            other => other.value_type().name().to_string(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CqlValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CqlValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_identifier(&self) -> Option<&ChainedIdentifier> {
        match self {
            CqlValue::Identifier(chain) => Some(chain),
            _ => None,
        }
    }

    /// Normalize a CIM value: widths collapse to 64 bits, char16 becomes a string
    pub fn from_cim(value: &CimValue) -> Self {
        match value {
            CimValue::Null { .. } => CqlValue::Null,
            CimValue::Boolean(b) => CqlValue::Boolean(*b),
            CimValue::Uint8(v) => CqlValue::Uint64(u64::from(*v)),
            CimValue::Uint16(v) => CqlValue::Uint64(u64::from(*v)),
            CimValue::Uint32(v) => CqlValue::Uint64(u64::from(*v)),
            CimValue::Uint64(v) => CqlValue::Uint64(*v),
            CimValue::Sint8(v) => CqlValue::Sint64(i64::from(*v)),
            CimValue::Sint16(v) => CqlValue::Sint64(i64::from(*v)),
            CimValue::Sint32(v) => CqlValue::Sint64(i64::from(*v)),
            CimValue::Sint64(v) => CqlValue::Sint64(*v),
            CimValue::Real32(v) => CqlValue::Real(f64::from(*v)),
            CimValue::Real64(v) => CqlValue::Real(*v),
            CimValue::Char16(c) => CqlValue::String(c.to_string()),
            CimValue::String(s) => CqlValue::String(s.clone()),
            CimValue::DateTime(dt) => CqlValue::DateTime(*dt),
            CimValue::Reference(path) => CqlValue::Reference(path.clone()),
            CimValue::Object(object) => CqlValue::Object(object.clone()),
            CimValue::Instance(instance) => CqlValue::Object(CimObject::Instance(instance.clone())),
            CimValue::Array(array) => CqlValue::Array(CqlArray::new(
                CqlValueType::from_cim_type(array.element_type),
                array.items.iter().map(CqlValue::from_cim).collect(),
            )),
        }
    }
}

impl From<bool> for CqlValue {
    fn from(b: bool) -> Self {
        CqlValue::Boolean(b)
    }
}

impl From<i64> for CqlValue {
    fn from(v: i64) -> Self {
        CqlValue::Sint64(v)
    }
}

impl From<u64> for CqlValue {
    fn from(v: u64) -> Self {
        CqlValue::Uint64(v)
    }
}

impl From<f64> for CqlValue {
    fn from(v: f64) -> Self {
        CqlValue::Real(v)
    }
}

impl From<&str> for CqlValue {
    fn from(s: &str) -> Self {
        CqlValue::String(s.to_string())
    }
}

impl From<String> for CqlValue {
    fn from(s: String) -> Self {
        CqlValue::String(s)
    }
}

impl From<ChainedIdentifier> for CqlValue {
    fn from(chain: ChainedIdentifier) -> Self {
        CqlValue::Identifier(chain)
    }
}

impl fmt::Display for CqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CqlValue::Null => write!(f, "NULL"),
            CqlValue::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CqlValue::Sint64(v) => write!(f, "{}", v),
            CqlValue::Uint64(v) => write!(f, "{}", v),
            CqlValue::Real(v) => {
                if v.is_finite() && v.fract() == 0.0 {
                    write!(f, "{:.1}", v)
                } else {
                    write!(f, "{}", v)
                }
            }
            CqlValue::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            CqlValue::DateTime(dt) => write!(f, "'{}'", dt),
            CqlValue::Reference(path) => write!(f, "'{}'", path),
            CqlValue::Object(object) => write!(f, "{}", object.class_name()),
            CqlValue::Array(array) => {
                write!(f, "{{")?;
                for (i, item) in array.items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "}}")
            }
            CqlValue::Identifier(chain) => write!(f, "{}", chain),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CimArray, Instance};

    #[test]
    fn test_from_cim_collapses_widths() {
        assert_eq!(CqlValue::from_cim(&CimValue::Uint8(7)), CqlValue::Uint64(7));
        assert_eq!(CqlValue::from_cim(&CimValue::Sint16(-3)), CqlValue::Sint64(-3));
        assert_eq!(CqlValue::from_cim(&CimValue::Real32(1.5)), CqlValue::Real(1.5));
        assert_eq!(CqlValue::from_cim(&CimValue::Char16('x')), CqlValue::String("x".into()));
        assert_eq!(CqlValue::from_cim(&CimValue::null(CimType::String)), CqlValue::Null);
    }

    #[test]
    fn test_from_cim_instance_becomes_object() {
        let value = CqlValue::from_cim(&CimValue::Instance(Instance::new("CIM_Media")));
        assert_eq!(value.value_type(), CqlValueType::Object);
        assert_eq!(value.to_string(), "CIM_Media");
    }

    #[test]
    fn test_from_cim_array() {
        let value = CqlValue::from_cim(&CimValue::Array(CimArray {
            element_type: CimType::Uint16,
            items: vec![CimValue::Uint16(1), CimValue::Uint16(2)],
        }));
        assert!(value.is_array());
        assert_eq!(value.value_type(), CqlValueType::Uint64);
        assert_eq!(value.type_name(), "Uint64[]");
        assert_eq!(value.to_string(), "{1,2}");
    }

    #[test]
    fn test_display_literals() {
        assert_eq!(CqlValue::from("it's").to_string(), "'it''s'");
        assert_eq!(CqlValue::Real(2.0).to_string(), "2.0");
        assert_eq!(CqlValue::Boolean(true).to_string(), "TRUE");
        assert_eq!(CqlValue::Identifier(ChainedIdentifier::from("Status")).to_string(), "Status");
    }

    #[test]
    fn test_array_kind_from_qualifier() {
        assert_eq!(ArrayKind::from_qualifier("Bag"), ArrayKind::Bag);
        assert_eq!(ArrayKind::from_qualifier("ordered"), ArrayKind::Ordered);
        assert_eq!(ArrayKind::from_qualifier("whatever"), ArrayKind::Indexed);
        assert!(!ArrayKind::Bag.is_positional());
    }
}
