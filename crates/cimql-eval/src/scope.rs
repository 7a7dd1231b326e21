//! Binding a WHERE clause to its FROM class
//!
//! Before evaluation every property chain is rewritten to start at the FROM
//! class, so `Status` becomes `CIM_Disk.Status`. A standalone symbolic
//! constant (`#'OK'`) is anchored to the property it is compared with.

use crate::context::QueryContext;
use crate::engine::QueryEngine;
use crate::error::{EvalError, EvalResult};
use cimql_ast::{ComparisonOp, Expression, Predicate, SimplePredicate};
use cimql_diagnostics::{CIMQL0002, CIMQL0005, CIMQL0015};
use cimql_types::{ChainedIdentifier, CqlValue, Identifier};
use log::debug;

const EMBEDDED_INSTANCE: &str = "EmbeddedInstance";

impl QueryEngine {
    /// Bind every leaf of a WHERE clause to the context's FROM class
    pub fn apply_context(&self, predicate: &mut Predicate, ctx: &dyn QueryContext) -> EvalResult<()> {
        predicate.try_for_each_leaf_mut(&mut |leaf| self.apply_context_simple(leaf, ctx))?;
        debug!("bound WHERE clause: {}", predicate);
        Ok(())
    }

    /// Bind one simple predicate
    pub fn apply_context_simple(
        &self,
        predicate: &mut SimplePredicate,
        ctx: &dyn QueryContext,
    ) -> EvalResult<()> {
        if is_standalone_constant(predicate.left())
            || predicate.right().is_some_and(is_standalone_constant)
        {
            return self.anchor_constant(predicate, ctx);
        }

        let op = predicate.operator();
        self.apply_context_expression(predicate.left_mut(), ctx)?;
        match (op, predicate.right_mut()) {
            // The class name on the right of ISA is not a property of the FROM class
            (ComparisonOp::Isa, Some(right)) => {
                if let Some(chain) = right.as_simple_value().and_then(CqlValue::as_identifier) {
                    ctx.add_where_identifier(chain.clone());
                }
                Ok(())
            }
            (_, Some(right)) => self.apply_context_expression(right, ctx),
            (_, None) => Ok(()),
        }
    }

    /// Bind every chain inside an expression, including function arguments
    pub fn apply_context_expression(
        &self,
        expression: &mut Expression,
        ctx: &dyn QueryContext,
    ) -> EvalResult<()> {
        expression.try_for_each_value_mut(&mut |value| {
            if let CqlValue::Identifier(chain) = value {
                let scoped = self.scope_chain(chain, ctx)?;
                ctx.add_where_identifier(scoped.clone());
                *chain = scoped;
            }
            Ok(())
        })
    }

    /// Rewrite `chain` to start at the FROM class
    ///
    /// A chain already led by the FROM class or its alias has that segment
    /// replaced by the canonical class name; any other chain gets the class
    /// prepended.
    pub fn scope_chain(
        &self,
        chain: &ChainedIdentifier,
        ctx: &dyn QueryContext,
    ) -> EvalResult<ChainedIdentifier> {
        let Some(first) = chain.first() else {
            return Err(EvalError::syntax(CIMQL0005, "empty property chain"));
        };
        if chain.is_standalone_constant() {
            return Err(EvalError::syntax(
                CIMQL0002,
                format!("{} must be compared directly with a property", chain),
            ));
        }
        let from = ctx
            .from_class()
            .ok_or_else(|| EvalError::syntax(CIMQL0015, "no FROM class to bind identifiers to"))?;

        let names_from = first.name_matches(from)
            || ctx.from_alias().is_some_and(|alias| first.name_matches(alias));
        let plain = !first.is_scoped()
            && !first.is_array()
            && !first.is_symbolic_constant()
            && !first.is_wildcard();

        let mut scoped = chain.clone();
        if plain && names_from {
            scoped.replace_first(Identifier::new(from));
        } else {
            scoped.prepend(Identifier::new(from));
        }
        Ok(scoped)
    }

    fn anchor_constant(
        &self,
        predicate: &mut SimplePredicate,
        ctx: &dyn QueryContext,
    ) -> EvalResult<()> {
        let constant_on_left = is_standalone_constant(predicate.left());
        let (constant_side, partner_side) = if constant_on_left {
            (Some(predicate.left()), predicate.right())
        } else {
            (predicate.right(), Some(predicate.left()))
        };

        let constant = constant_side
            .and_then(simple_identifier)
            .and_then(ChainedIdentifier::first)
            .and_then(Identifier::symbolic_constant)
            .map(str::to_string);
        let partner = partner_side
            .and_then(simple_identifier)
            .filter(|chain| chain.last().is_some_and(|last| !last.is_symbolic_constant()))
            .cloned();
        let (Some(constant), Some(partner)) = (constant, partner) else {
            return Err(EvalError::syntax(
                CIMQL0002,
                format!("{} has no property to scope its symbolic constant", predicate),
            ));
        };

        let partner = self.scope_chain(&partner, ctx)?;
        if let Some((class, property)) = constant_owner(&partner, ctx) {
            ctx.symbolic_constant(&class, property, &constant)?;
        }
        let anchored = partner.with_terminal_constant(constant);
        debug!("anchored symbolic constant as {}", anchored);
        ctx.add_where_identifier(partner.clone());

        let (left, right) = if constant_on_left {
            (anchored, partner)
        } else {
            (partner, anchored)
        };
        *predicate.left_mut() = Expression::identifier(left);
        if let Some(slot) = predicate.right_mut() {
            *slot = Expression::identifier(right);
        }
        Ok(())
    }
}

fn simple_identifier(expression: &Expression) -> Option<&ChainedIdentifier> {
    expression.as_simple_value().and_then(CqlValue::as_identifier)
}

fn is_standalone_constant(expression: &Expression) -> bool {
    simple_identifier(expression).is_some_and(ChainedIdentifier::is_standalone_constant)
}

/// Class and property that declare a constant anchored at the end of `chain`
///
/// Unscoped embedded segments are followed through the `EmbeddedInstance`
/// qualifier of their declaration. Without one the owner stays unknown and
/// the constant is checked against the candidate's class at evaluation.
fn constant_owner<'c>(
    chain: &'c ChainedIdentifier,
    ctx: &dyn QueryContext,
) -> Option<(String, &'c str)> {
    let (last, path) = chain.segments().split_last()?;
    if let Some(scope) = last.scope() {
        return Some((scope.to_string(), last.name()));
    }
    let (first, embedded) = path.split_first()?;
    let mut class = first.name().to_string();
    for segment in embedded {
        let owner = segment.scope().unwrap_or(&class);
        let decl = ctx.property_decl(owner, segment.name())?;
        class = decl.qualifier(EMBEDDED_INSTANCE)?.value.as_str()?.to_string();
    }
    Some((class, last.name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SchemaContext;
    use cimql_diagnostics::ErrorKind;
    use cimql_types::{ClassDef, CimType, CimValue, PropertyDecl, Qualifier};
    use pretty_assertions::assert_eq;

    // ============================================================================
    // Test Helpers
    // ============================================================================

    fn context() -> SchemaContext {
        SchemaContext::builder()
            .class(
                ClassDef::new("CIM_Disk").with_property(
                    PropertyDecl::new("Status", CimType::Uint16).with_qualifier(Qualifier::new(
                        "Values",
                        CimValue::string_array(["Unknown", "OK", "Degraded"]),
                    )),
                ),
            )
            .from_class("CIM_Disk")
            .from_alias("d")
            .build()
    }

    fn scoped(text: &str) -> String {
        let chain: ChainedIdentifier = text.parse().unwrap();
        QueryEngine::new()
            .scope_chain(&chain, &context())
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_scope_chain() {
        assert_eq!(scoped("Status"), "CIM_Disk.Status");
        assert_eq!(scoped("cim_disk.Status"), "CIM_Disk.Status");
        assert_eq!(scoped("d.Status"), "CIM_Disk.Status");
        assert_eq!(scoped("CIM_Disk"), "CIM_Disk");
        assert_eq!(scoped("CIM_Disk[0].Status"), "CIM_Disk.CIM_Disk[0].Status");
        assert_eq!(scoped("CIM_Sub::Mode"), "CIM_Disk.CIM_Sub::Mode");
    }

    #[test]
    fn test_scoping_is_idempotent() {
        let ctx = context();
        let engine = QueryEngine::new();
        let once = engine.scope_chain(&"Status".parse().unwrap(), &ctx).unwrap();
        let twice = engine.scope_chain(&once, &ctx).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_missing_from_class() {
        let ctx = SchemaContext::builder().build();
        let err = QueryEngine::new()
            .scope_chain(&"Status".parse().unwrap(), &ctx)
            .unwrap_err();
        assert_eq!(err.code(), CIMQL0015);
    }

    #[test]
    fn test_anchor_constant_on_either_side() {
        let ctx = context();
        let engine = QueryEngine::new();

        let mut left = SimplePredicate::compare(
            Expression::identifier("Status"),
            ComparisonOp::Eq,
            Expression::identifier(Identifier::standalone_constant("OK")),
        );
        engine.apply_context_simple(&mut left, &ctx).unwrap();
        assert_eq!(left.to_string(), "CIM_Disk.Status = CIM_Disk.Status#'OK'");

        let mut right = SimplePredicate::compare(
            Expression::identifier(Identifier::standalone_constant("Degraded")),
            ComparisonOp::Ne,
            Expression::identifier("Status"),
        );
        engine.apply_context_simple(&mut right, &ctx).unwrap();
        assert_eq!(right.to_string(), "CIM_Disk.Status#'Degraded' <> CIM_Disk.Status");
    }

    #[test]
    fn test_unknown_constant_fails_at_bind_time() {
        let mut predicate = SimplePredicate::compare(
            Expression::identifier("Status"),
            ComparisonOp::Eq,
            Expression::identifier(Identifier::standalone_constant("Melted")),
        );
        let err = QueryEngine::new()
            .apply_context_simple(&mut predicate, &context())
            .unwrap_err();
        assert!(matches!(err, EvalError::InvalidSymbolicConstant { .. }));
    }

    #[test]
    fn test_constant_without_partner() {
        let engine = QueryEngine::new();
        let ctx = context();
        let both = SimplePredicate::compare(
            Expression::identifier(Identifier::standalone_constant("OK")),
            ComparisonOp::Eq,
            Expression::identifier(Identifier::standalone_constant("OK")),
        );
        let literal = SimplePredicate::compare(
            Expression::value(2u64),
            ComparisonOp::Eq,
            Expression::identifier(Identifier::standalone_constant("OK")),
        );
        for mut predicate in [both, literal] {
            let err = engine.apply_context_simple(&mut predicate, &ctx).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Syntax);
            assert_eq!(err.code(), CIMQL0002);
        }
    }

    #[test]
    fn test_isa_right_side_is_registered_unscoped() {
        let ctx = context();
        let mut predicate = SimplePredicate::isa(Expression::identifier("CIM_Disk"), "CIM_Device");
        QueryEngine::new().apply_context_simple(&mut predicate, &ctx).unwrap();
        assert_eq!(predicate.to_string(), "CIM_Disk ISA CIM_Device");
        let names: Vec<String> = ctx.where_identifiers().iter().map(ToString::to_string).collect();
        assert_eq!(names, vec!["CIM_Disk".to_string(), "CIM_Device".to_string()]);
    }

    #[test]
    fn test_constant_behind_embedded_instance_fails_at_bind_time() {
        let ctx = SchemaContext::builder()
            .class(ClassDef::new("CIM_Disk").with_property(
                PropertyDecl::new("Media", CimType::Instance)
                    .with_qualifier(Qualifier::new("EmbeddedInstance", "CIM_Media")),
            ))
            .class(ClassDef::new("CIM_Media").with_property(
                PropertyDecl::new("Kind", CimType::Uint16).with_qualifier(Qualifier::new(
                    "Values",
                    CimValue::string_array(["Tape", "Optical"]),
                )),
            ))
            .from_class("CIM_Disk")
            .build();
        let engine = QueryEngine::new();
        let kind_is = |constant: &str| {
            SimplePredicate::compare(
                Expression::identifier("Media.Kind".parse::<ChainedIdentifier>().unwrap()),
                ComparisonOp::Eq,
                Expression::identifier(Identifier::standalone_constant(constant)),
            )
        };

        let mut unknown = kind_is("Melted");
        let err = engine.apply_context_simple(&mut unknown, &ctx).unwrap_err();
        assert!(matches!(err, EvalError::InvalidSymbolicConstant { .. }));

        let mut known = kind_is("Optical");
        engine.apply_context_simple(&mut known, &ctx).unwrap();
        assert_eq!(
            known.to_string(),
            "CIM_Disk.Media.Kind = CIM_Disk.Media.Kind#'Optical'"
        );
    }
}
