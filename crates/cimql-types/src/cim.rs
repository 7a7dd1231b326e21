//! CIM object model
//!
//! Classes, instances and typed property values as delivered by a CIM
//! repository or provider. The evaluator reads these; it never mutates them.

use crate::{CimDateTime, ObjectPath};
use serde::{Deserialize, Serialize};
use std::fmt;

/// CIM property types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CimType {
    Boolean,
    Uint8,
    Sint8,
    Uint16,
    Sint16,
    Uint32,
    Sint32,
    Uint64,
    Sint64,
    Real32,
    Real64,
    Char16,
    String,
    DateTime,
    Reference,
    Object,
    Instance,
}

impl CimType {
    /// The MOF keyword for this type
    pub const fn name(&self) -> &'static str {
        match self {
            CimType::Boolean => "boolean",
            CimType::Uint8 => "uint8",
            CimType::Sint8 => "sint8",
            CimType::Uint16 => "uint16",
            CimType::Sint16 => "sint16",
            CimType::Uint32 => "uint32",
            CimType::Sint32 => "sint32",
            CimType::Uint64 => "uint64",
            CimType::Sint64 => "sint64",
            CimType::Real32 => "real32",
            CimType::Real64 => "real64",
            CimType::Char16 => "char16",
            CimType::String => "string",
            CimType::DateTime => "datetime",
            CimType::Reference => "reference",
            CimType::Object => "object",
            CimType::Instance => "instance",
        }
    }
}

impl fmt::Display for CimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A homogeneous CIM array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CimArray {
    pub element_type: CimType,
    pub items: Vec<CimValue>,
}

/// A typed CIM property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum CimValue {
    /// A property that exists but carries no value
    Null {
        cim_type: CimType,
        #[serde(default)]
        is_array: bool,
    },
    Boolean(bool),
    Uint8(u8),
    Sint8(i8),
    Uint16(u16),
    Sint16(i16),
    Uint32(u32),
    Sint32(i32),
    Uint64(u64),
    Sint64(i64),
    Real32(f32),
    Real64(f64),
    Char16(char),
    String(String),
    DateTime(CimDateTime),
    Reference(ObjectPath),
    Object(CimObject),
    Instance(Instance),
    Array(CimArray),
}

impl CimValue {
    /// A typed null
    pub fn null(cim_type: CimType) -> Self {
        Self::Null {
            cim_type,
            is_array: false,
        }
    }

    /// An array of strings, the shape of `Values`/`ValueMap` qualifiers
    pub fn string_array<S: Into<String>>(items: impl IntoIterator<Item = S>) -> Self {
        Self::Array(CimArray {
            element_type: CimType::String,
            items: items.into_iter().map(|s| Self::String(s.into())).collect(),
        })
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null { .. })
    }

    pub fn is_array(&self) -> bool {
        match self {
            Self::Null { is_array, .. } => *is_array,
            Self::Array(_) => true,
            _ => false,
        }
    }

    /// Declared type, element type for arrays
    pub fn cim_type(&self) -> CimType {
        match self {
            Self::Null { cim_type, .. } => *cim_type,
            Self::Boolean(_) => CimType::Boolean,
            Self::Uint8(_) => CimType::Uint8,
            Self::Sint8(_) => CimType::Sint8,
            Self::Uint16(_) => CimType::Uint16,
            Self::Sint16(_) => CimType::Sint16,
            Self::Uint32(_) => CimType::Uint32,
            Self::Sint32(_) => CimType::Sint32,
            Self::Uint64(_) => CimType::Uint64,
            Self::Sint64(_) => CimType::Sint64,
            Self::Real32(_) => CimType::Real32,
            Self::Real64(_) => CimType::Real64,
            Self::Char16(_) => CimType::Char16,
            Self::String(_) => CimType::String,
            Self::DateTime(_) => CimType::DateTime,
            Self::Reference(_) => CimType::Reference,
            Self::Object(_) => CimType::Object,
            Self::Instance(_) => CimType::Instance,
            Self::Array(array) => array.element_type,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// String elements of a string array
    pub fn as_string_items(&self) -> Option<Vec<&str>> {
        match self {
            Self::Array(array) => array.items.iter().map(|v| v.as_str()).collect(),
            _ => None,
        }
    }
}

impl From<bool> for CimValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<u16> for CimValue {
    fn from(v: u16) -> Self {
        Self::Uint16(v)
    }
}

impl From<u32> for CimValue {
    fn from(v: u32) -> Self {
        Self::Uint32(v)
    }
}

impl From<u64> for CimValue {
    fn from(v: u64) -> Self {
        Self::Uint64(v)
    }
}

impl From<i32> for CimValue {
    fn from(v: i32) -> Self {
        Self::Sint32(v)
    }
}

impl From<i64> for CimValue {
    fn from(v: i64) -> Self {
        Self::Sint64(v)
    }
}

impl From<f64> for CimValue {
    fn from(v: f64) -> Self {
        Self::Real64(v)
    }
}

impl From<&str> for CimValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for CimValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Instance> for CimValue {
    fn from(instance: Instance) -> Self {
        Self::Instance(instance)
    }
}

impl From<ObjectPath> for CimValue {
    fn from(path: ObjectPath) -> Self {
        Self::Reference(path)
    }
}

/// A named qualifier, e.g. `Values`, `ValueMap`, `ArrayType`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Qualifier {
    pub name: String,
    pub value: CimValue,
}

impl Qualifier {
    pub fn new(name: impl Into<String>, value: impl Into<CimValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Case-insensitive qualifier lookup
pub fn find_qualifier<'a>(qualifiers: &'a [Qualifier], name: &str) -> Option<&'a Qualifier> {
    qualifiers.iter().find(|q| q.name.eq_ignore_ascii_case(name))
}

/// A property value on an instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub value: CimValue,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub qualifiers: Vec<Qualifier>,
}

impl Property {
    pub fn new(name: impl Into<String>, value: impl Into<CimValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            qualifiers: Vec::new(),
        }
    }

    pub fn qualifier(&self, name: &str) -> Option<&Qualifier> {
        find_qualifier(&self.qualifiers, name)
    }
}

/// A CIM instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub class_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<ObjectPath>,
    #[serde(default)]
    pub properties: Vec<Property>,
}

impl Instance {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            path: None,
            properties: Vec::new(),
        }
    }

    pub fn with_path(mut self, path: ObjectPath) -> Self {
        self.path = Some(path);
        self
    }

    /// Add or replace a property
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<CimValue>) -> Self {
        self.set_property(Property::new(name, value));
        self
    }

    pub fn set_property(&mut self, property: Property) {
        match self
            .properties
            .iter_mut()
            .find(|p| p.name.eq_ignore_ascii_case(&property.name))
        {
            Some(existing) => *existing = property,
            None => self.properties.push(property),
        }
    }

    /// Case-insensitive property lookup
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }
}

/// A property declaration on a class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDecl {
    pub name: String,
    pub cim_type: CimType,
    #[serde(default)]
    pub is_array: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub qualifiers: Vec<Qualifier>,
}

impl PropertyDecl {
    pub fn new(name: impl Into<String>, cim_type: CimType) -> Self {
        Self {
            name: name.into(),
            cim_type,
            is_array: false,
            qualifiers: Vec::new(),
        }
    }

    pub fn array(mut self) -> Self {
        self.is_array = true;
        self
    }

    pub fn with_qualifier(mut self, qualifier: Qualifier) -> Self {
        self.qualifiers.push(qualifier);
        self
    }

    pub fn qualifier(&self, name: &str) -> Option<&Qualifier> {
        find_qualifier(&self.qualifiers, name)
    }
}

/// A CIM class definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superclass: Option<String>,
    #[serde(default)]
    pub properties: Vec<PropertyDecl>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub qualifiers: Vec<Qualifier>,
}

impl ClassDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            superclass: None,
            properties: Vec::new(),
            qualifiers: Vec::new(),
        }
    }

    pub fn with_superclass(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    pub fn with_property(mut self, property: PropertyDecl) -> Self {
        self.properties.push(property);
        self
    }

    /// Property declared directly on this class (not inherited)
    pub fn property(&self, name: &str) -> Option<&PropertyDecl> {
        self.properties
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }
}

/// An embedded object: a class or an instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "object")]
pub enum CimObject {
    Class(ClassDef),
    Instance(Instance),
}

impl CimObject {
    pub fn class_name(&self) -> &str {
        match self {
            CimObject::Class(class) => &class.name,
            CimObject::Instance(instance) => &instance.class_name,
        }
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            CimObject::Instance(instance) => Some(instance),
            CimObject::Class(_) => None,
        }
    }
}

impl From<Instance> for CimObject {
    fn from(instance: Instance) -> Self {
        CimObject::Instance(instance)
    }
}
