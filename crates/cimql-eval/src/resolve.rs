//! Property chain resolution
//!
//! A scoped chain `From.a.Scope::b[i]` is walked from the candidate instance:
//! the first segment names the FROM class and stands for the candidate
//! itself, each later segment selects a property. Embedded objects and
//! references are followed; anything else part-way along yields null.

use crate::context::{QueryContext, array_type_qualifier};
use crate::engine::QueryEngine;
use crate::error::{EvalError, EvalResult};
use cimql_diagnostics::CIMQL0002;
use cimql_types::{
    ArrayKind, ChainedIdentifier, CimObject, CimValue, CqlValue, Identifier, Instance, Property,
};
use log::trace;

impl QueryEngine {
    /// Resolve a chain that has been bound to the FROM class
    pub fn resolve_chain<'a>(
        &self,
        chain: &ChainedIdentifier,
        instance: &'a Instance,
        ctx: &'a dyn QueryContext,
    ) -> EvalResult<CqlValue> {
        trace!("resolving {} on {}", chain, instance.class_name);

        let segments = chain.segments();
        let Some(first) = segments.first() else {
            return Err(EvalError::malformed("ChainedIdentifier"));
        };
        if chain.is_standalone_constant() {
            return Err(EvalError::syntax(
                CIMQL0002,
                format!("{} has no property to anchor it", chain),
            ));
        }
        if segments.len() == 1 {
            return Ok(CqlValue::Object(CimObject::Instance(instance.clone())));
        }
        if let [_, property] = segments {
            if let Some(constant) = property.symbolic_constant() {
                let class = property.scope().unwrap_or(first.name());
                return ctx.symbolic_constant(class, property.name(), constant);
            }
        }

        let last = segments.len() - 1;
        let mut current = instance;
        for (position, segment) in segments.iter().enumerate().skip(1) {
            if let Some(scope) = segment.scope() {
                if !ctx.is_subclass_of(&current.class_name, scope) {
                    return Ok(CqlValue::Null);
                }
            }
            if position == last {
                if let Some(constant) = segment.symbolic_constant() {
                    return ctx.symbolic_constant(&current.class_name, segment.name(), constant);
                }
            }

            let Some(property) = current.property(segment.name()) else {
                return if ctx.property_decl(&current.class_name, segment.name()).is_some() {
                    Ok(CqlValue::Null)
                } else {
                    Err(EvalError::property_not_found(segment.name(), &current.class_name))
                };
            };

            if position == last {
                return terminal_value(segment, property, &current.class_name, ctx);
            }

            let value = match (segment.index(), &property.value) {
                (None, value) => value,
                (Some(index), CimValue::Array(array)) => {
                    array.items.get(index).ok_or(EvalError::IndexOutOfBounds {
                        index,
                        length: array.items.len(),
                    })?
                }
                (Some(_), CimValue::Null { .. }) => return Ok(CqlValue::Null),
                (Some(_), other) => {
                    return Err(EvalError::type_mismatch(
                        "[]",
                        format!("{:?}", other.cim_type()),
                        "array",
                    ));
                }
            };

            current = match value {
                CimValue::Instance(inner) | CimValue::Object(CimObject::Instance(inner)) => inner,
                CimValue::Reference(path) => match ctx.dereference(path) {
                    Some(target) => target,
                    None => return Ok(CqlValue::Null),
                },
                _ => return Ok(CqlValue::Null),
            };
        }

        Err(EvalError::malformed("ChainedIdentifier"))
    }
}

/// Normalize the final property, applying its `ArrayType` and any index
fn terminal_value(
    segment: &Identifier,
    property: &Property,
    class: &str,
    ctx: &dyn QueryContext,
) -> EvalResult<CqlValue> {
    let value = match CqlValue::from_cim(&property.value) {
        CqlValue::Array(array) => {
            let kind = array_type_qualifier(ctx, class, property)
                .map(ArrayKind::from_qualifier)
                .unwrap_or_default();
            CqlValue::Array(array.with_kind(kind))
        }
        value => value,
    };

    let Some(index) = segment.index() else {
        return Ok(value);
    };
    match value {
        CqlValue::Array(array) => {
            let length = array.len();
            array
                .items
                .into_iter()
                .nth(index)
                .ok_or(EvalError::IndexOutOfBounds { index, length })
        }
        CqlValue::Null => Ok(CqlValue::Null),
        other => Err(EvalError::type_mismatch("[]", other.type_name(), "array")),
    }
}
