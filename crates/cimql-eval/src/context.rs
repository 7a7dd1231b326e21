//! Query context: FROM-class scoping, schema lookups and symbolic constants
//!
//! The evaluator never reaches a CIM repository directly. Everything it needs
//! beyond the candidate instance comes through [`QueryContext`]: the FROM class
//! that unscoped identifiers bind to, class definitions for hierarchy and
//! schema checks, symbolic constant values, and dereferencing of object paths.
//! [`SchemaContext`] is the in-memory implementation.

use crate::error::{EvalError, EvalResult};
use cimql_types::{
    ChainedIdentifier, CimValue, ClassDef, CqlValue, Instance, ObjectPath, PropertyDecl,
    find_qualifier,
};
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// How two classes relate in the schema hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassRelation {
    SameClass,
    /// The second class derives from the first
    SubClass,
    /// The first class derives from the second
    SuperClass,
    NotRelated,
}

/// Everything the evaluator needs beyond the candidate instance
///
/// `apply_context` calls the appending methods through a shared reference, so
/// implementations keep the WHERE-identifier list behind interior mutability.
pub trait QueryContext: Send + Sync {
    /// Class named in the FROM clause
    fn from_class(&self) -> Option<&str>;

    /// Alias given to the FROM class, if any
    fn from_alias(&self) -> Option<&str> {
        None
    }

    /// Namespace the query runs in
    fn namespace(&self) -> Option<&str> {
        None
    }

    /// Class definition lookup, case-insensitive
    fn class(&self, name: &str) -> Option<&ClassDef>;

    /// Explicit constant binding for `class.property#'constant'`
    fn constant_binding(&self, _class: &str, _property: &str, _constant: &str) -> Option<CqlValue> {
        None
    }

    /// Instance an object path points at, if the context holds it
    fn dereference(&self, _path: &ObjectPath) -> Option<&Instance> {
        None
    }

    /// Record an identifier seen in the WHERE clause
    fn add_where_identifier(&self, chain: ChainedIdentifier);

    /// Identifiers recorded so far, in insertion order
    fn where_identifiers(&self) -> Vec<ChainedIdentifier>;

    /// Relation of `b` to `a`, walking superclass chains
    fn class_relation(&self, a: &str, b: &str) -> ClassRelation {
        if a.eq_ignore_ascii_case(b) {
            ClassRelation::SameClass
        } else if ancestors(self, b).any(|c| c.name.eq_ignore_ascii_case(a)) {
            ClassRelation::SubClass
        } else if ancestors(self, a).any(|c| c.name.eq_ignore_ascii_case(b)) {
            ClassRelation::SuperClass
        } else {
            ClassRelation::NotRelated
        }
    }

    /// True when `class` is `ancestor` or derives from it
    fn is_subclass_of(&self, class: &str, ancestor: &str) -> bool {
        matches!(
            self.class_relation(ancestor, class),
            ClassRelation::SameClass | ClassRelation::SubClass
        )
    }

    /// Declaration of `property` on `class` or the nearest superclass declaring it
    fn property_decl(&self, class: &str, property: &str) -> Option<&PropertyDecl> {
        ancestors(self, class).find_map(|c| c.property(property))
    }

    /// Value of `class.property#'constant'`
    ///
    /// An explicit binding wins. Otherwise the constant is looked up in the
    /// property's `Values` qualifier; its position selects the matching
    /// `ValueMap` entry, or is the value itself when there is no `ValueMap`.
    fn symbolic_constant(&self, class: &str, property: &str, constant: &str) -> EvalResult<CqlValue> {
        if let Some(value) = self.constant_binding(class, property, constant) {
            return Ok(value);
        }
        if self.class(class).is_none() {
            return Err(EvalError::invalid_constant(class, property, constant, "class not found"));
        }
        let decl = self
            .property_decl(class, property)
            .ok_or_else(|| EvalError::invalid_constant(class, property, constant, "property not found"))?;

        let values = decl
            .qualifier("Values")
            .and_then(|q| q.value.as_string_items())
            .ok_or_else(|| EvalError::QualifierNotFound {
                qualifier: "Values".to_string(),
                class: class.to_string(),
                property: property.to_string(),
            })?;
        let index = values
            .iter()
            .position(|v| v.eq_ignore_ascii_case(constant))
            .ok_or_else(|| {
                EvalError::invalid_constant(class, property, constant, "not listed in Values")
            })?;

        let Some(value_map) = decl.qualifier("ValueMap").and_then(|q| q.value.as_string_items())
        else {
            return Ok(CqlValue::Uint64(index as u64));
        };
        let entry = value_map.get(index).ok_or_else(|| {
            EvalError::invalid_constant(class, property, constant, "no matching ValueMap entry")
        })?;
        if entry.contains("..") {
            return Err(EvalError::invalid_constant(
                class,
                property,
                constant,
                format!("ValueMap entry '{}' is a range", entry),
            ));
        }
        entry.trim().parse::<i64>().map(CqlValue::Sint64).map_err(|_| {
            EvalError::invalid_constant(
                class,
                property,
                constant,
                format!("ValueMap entry '{}' is not an integer", entry),
            )
        })
    }
}

/// `class` followed by its superclasses, as far as the schema knows them
pub fn ancestors<'a, C: QueryContext + ?Sized>(
    ctx: &'a C,
    class: &str,
) -> impl Iterator<Item = &'a ClassDef> + 'a {
    let mut next = ctx.class(class);
    let mut seen: Vec<String> = Vec::new();
    std::iter::from_fn(move || {
        let current = next?;
        let key = current.name.to_ascii_lowercase();
        if seen.contains(&key) {
            return None;
        }
        seen.push(key);
        next = current.superclass.as_deref().and_then(|s| ctx.class(s));
        Some(current)
    })
}

/// The `ArrayType` qualifier value for a property, from the instance or the schema
pub(crate) fn array_type_qualifier<'a>(
    ctx: &'a dyn QueryContext,
    class: &str,
    property: &'a cimql_types::Property,
) -> Option<&'a str> {
    property
        .qualifier("ArrayType")
        .or_else(|| ctx.property_decl(class, &property.name).and_then(|d| d.qualifier("ArrayType")))
        .and_then(|q| match &q.value {
            CimValue::String(s) => Some(s.as_str()),
            _ => None,
        })
}

fn constant_key(class: &str, property: &str, constant: &str) -> String {
    format!("{}.{}#{}", class, property, constant).to_ascii_lowercase()
}

/// In-memory query context
#[derive(Debug, Default)]
pub struct SchemaContext {
    classes: IndexMap<String, ClassDef>,
    from_class: Option<String>,
    from_alias: Option<String>,
    namespace: Option<String>,
    constants: IndexMap<String, CqlValue>,
    instances: Vec<Instance>,
    where_identifiers: Mutex<Vec<ChainedIdentifier>>,
}

impl SchemaContext {
    pub fn builder() -> SchemaContextBuilder {
        SchemaContextBuilder::new()
    }

    /// All classes, in insertion order
    pub fn classes(&self) -> impl Iterator<Item = &ClassDef> {
        self.classes.values()
    }

    /// Forget recorded WHERE identifiers, e.g. before binding another query
    pub fn clear_where_identifiers(&self) {
        self.where_identifiers.lock().clear();
    }
}

impl QueryContext for SchemaContext {
    fn from_class(&self) -> Option<&str> {
        self.from_class.as_deref()
    }

    fn from_alias(&self) -> Option<&str> {
        self.from_alias.as_deref()
    }

    fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    fn class(&self, name: &str) -> Option<&ClassDef> {
        self.classes.get(&name.to_ascii_lowercase())
    }

    fn constant_binding(&self, class: &str, property: &str, constant: &str) -> Option<CqlValue> {
        if let Some(value) = self.constants.get(&constant_key(class, property, constant)) {
            return Some(value.clone());
        }
        // bindings made on a superclass apply to subclasses
        ancestors(self, class).skip(1).find_map(|ancestor| {
            self.constants
                .get(&constant_key(&ancestor.name, property, constant))
                .cloned()
        })
    }

    fn dereference(&self, path: &ObjectPath) -> Option<&Instance> {
        self.instances
            .iter()
            .find(|instance| instance.path.as_ref() == Some(path))
    }

    fn add_where_identifier(&self, chain: ChainedIdentifier) {
        let mut identifiers = self.where_identifiers.lock();
        if !identifiers.contains(&chain) {
            identifiers.push(chain);
        }
    }

    fn where_identifiers(&self) -> Vec<ChainedIdentifier> {
        self.where_identifiers.lock().clone()
    }
}

/// Builder for [`SchemaContext`]
#[derive(Debug, Default)]
pub struct SchemaContextBuilder {
    context: SchemaContext,
}

impl SchemaContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class definition, replacing any class of the same name
    pub fn class(mut self, class: ClassDef) -> Self {
        self.context
            .classes
            .insert(class.name.to_ascii_lowercase(), class);
        self
    }

    pub fn classes(self, classes: impl IntoIterator<Item = ClassDef>) -> Self {
        classes.into_iter().fold(self, Self::class)
    }

    pub fn from_class(mut self, class: impl Into<String>) -> Self {
        self.context.from_class = Some(class.into());
        self
    }

    pub fn from_alias(mut self, alias: impl Into<String>) -> Self {
        self.context.from_alias = Some(alias.into());
        self
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.context.namespace = Some(namespace.into());
        self
    }

    /// Bind `class.property#'constant'` to a value
    pub fn constant(
        mut self,
        class: &str,
        property: &str,
        constant: &str,
        value: impl Into<CqlValue>,
    ) -> Self {
        self.context
            .constants
            .insert(constant_key(class, property, constant), value.into());
        self
    }

    /// Add an instance that references can be dereferenced to
    pub fn instance(mut self, instance: Instance) -> Self {
        self.context.instances.push(instance);
        self
    }

    pub fn instances(self, instances: impl IntoIterator<Item = Instance>) -> Self {
        instances.into_iter().fold(self, Self::instance)
    }

    pub fn build(self) -> SchemaContext {
        self.context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cimql_types::{CimType, Qualifier};

    fn schema() -> SchemaContext {
        SchemaContext::builder()
            .class(ClassDef::new("CIM_ManagedElement").with_property(
                PropertyDecl::new("Status", CimType::Uint16)
                    .with_qualifier(Qualifier::new(
                        "Values",
                        CimValue::string_array(["Unknown", "OK", "Degraded"]),
                    ))
                    .with_qualifier(Qualifier::new(
                        "ValueMap",
                        CimValue::string_array(["0", "2", "3"]),
                    )),
            ))
            .class(ClassDef::new("CIM_Device").with_superclass("CIM_ManagedElement"))
            .class(
                ClassDef::new("CIM_Disk")
                    .with_superclass("CIM_Device")
                    .with_property(PropertyDecl::new("Mode", CimType::Uint16).with_qualifier(
                        Qualifier::new("Values", CimValue::string_array(["Off", "On"])),
                    )),
            )
            .class(ClassDef::new("CIM_Unrelated"))
            .from_class("CIM_Disk")
            .build()
    }

    #[test]
    fn test_class_relation() {
        let ctx = schema();
        assert_eq!(ctx.class_relation("CIM_Disk", "cim_disk"), ClassRelation::SameClass);
        assert_eq!(ctx.class_relation("CIM_ManagedElement", "CIM_Disk"), ClassRelation::SubClass);
        assert_eq!(ctx.class_relation("CIM_Disk", "CIM_Device"), ClassRelation::SuperClass);
        assert_eq!(ctx.class_relation("CIM_Disk", "CIM_Unrelated"), ClassRelation::NotRelated);
        assert!(ctx.is_subclass_of("CIM_Disk", "CIM_ManagedElement"));
        assert!(!ctx.is_subclass_of("CIM_ManagedElement", "CIM_Disk"));
    }

    #[test]
    fn test_constant_through_value_map() {
        let ctx = schema();
        assert_eq!(
            ctx.symbolic_constant("CIM_Disk", "Status", "degraded").unwrap(),
            CqlValue::Sint64(3)
        );
        assert_eq!(
            ctx.symbolic_constant("CIM_Disk", "Mode", "On").unwrap(),
            CqlValue::Uint64(1)
        );
        assert!(ctx.symbolic_constant("CIM_Disk", "Status", "Missing").is_err());
        assert!(ctx.symbolic_constant("CIM_Nope", "Status", "OK").is_err());
    }

    #[test]
    fn test_explicit_binding_wins() {
        let ctx = SchemaContext::builder()
            .class(ClassDef::new("CIM_Base"))
            .class(ClassDef::new("CIM_Disk").with_superclass("CIM_Base"))
            .constant("CIM_Base", "Status", "OK", 42u64)
            .build();
        assert_eq!(
            ctx.symbolic_constant("CIM_Disk", "Status", "ok").unwrap(),
            CqlValue::Uint64(42)
        );
    }

    #[test]
    fn test_where_identifiers_deduplicate() {
        let ctx = schema();
        ctx.add_where_identifier(ChainedIdentifier::from_names(&["CIM_Disk", "Status"]));
        ctx.add_where_identifier(ChainedIdentifier::from_names(&["CIM_Disk", "Status"]));
        assert_eq!(ctx.where_identifiers().len(), 1);
        ctx.clear_where_identifiers();
        assert!(ctx.where_identifiers().is_empty());
    }

    #[test]
    fn test_cyclic_hierarchy_terminates() {
        let ctx = SchemaContext::builder()
            .class(ClassDef::new("A").with_superclass("B"))
            .class(ClassDef::new("B").with_superclass("A"))
            .build();
        assert_eq!(ancestors(&ctx, "A").count(), 2);
        assert_eq!(ctx.class_relation("A", "C"), ClassRelation::NotRelated);
    }
}
