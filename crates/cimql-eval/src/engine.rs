//! CIM Query Language evaluation engine
//!
//! [`QueryEngine`] evaluates WHERE-clause trees against a candidate instance.
//! Evaluation is split across modules as `impl QueryEngine` blocks:
//! - this module: predicates and the expression/term/factor fold
//! - [`crate::resolve`]: property chain resolution
//! - [`crate::functions`]: built-in functions
//! - [`crate::scope`]: binding a tree to the FROM class

use crate::context::QueryContext;
use crate::error::{EvalError, EvalResult};
use crate::operators::{PatternCache, apply_expression_op, apply_term_op, compare_values, invert};
use cimql_ast::{
    BooleanOp, ComparisonOp, Expression, Factor, FactorKind, Predicate, PredicateBody,
    SimplePredicate, Term,
};
use cimql_diagnostics::{CIMQL0003, CIMQL0004};
use cimql_types::{CimObject, CqlValue, Instance};
use log::trace;

/// The WHERE-clause evaluation engine
///
/// The engine holds no per-query state apart from a cache of compiled LIKE
/// patterns, so one engine can serve any number of threads. The cache lives
/// only as long as the engine that owns it.
#[derive(Debug, Default)]
pub struct QueryEngine {
    patterns: PatternCache,
}

impl QueryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiled LIKE patterns seen so far
    pub fn pattern_cache(&self) -> &PatternCache {
        &self.patterns
    }

    /// Evaluate a predicate tree to a truth value
    ///
    /// Children are folded left to right. AND stops at the first false
    /// accumulator and OR at the first true one; skipped children are never
    /// resolved. The node's own inversion is applied last.
    pub fn evaluate(
        &self,
        predicate: &Predicate,
        instance: &Instance,
        ctx: &dyn QueryContext,
    ) -> EvalResult<bool> {
        let result = match predicate.body() {
            PredicateBody::Simple { predicate: simple } => {
                self.evaluate_simple(simple, instance, ctx)?
            }
            PredicateBody::Compound { children, operators } => {
                let Some((first, rest)) = children.split_first() else {
                    return Err(EvalError::malformed("Predicate"));
                };
                if operators.len() != rest.len() {
                    return Err(EvalError::malformed("Predicate"));
                }

                let mut acc = self.evaluate(first, instance, ctx)?;
                for (op, child) in operators.iter().zip(rest) {
                    acc = match op {
                        BooleanOp::And if !acc => false,
                        BooleanOp::Or if acc => true,
                        _ => self.evaluate(child, instance, ctx)?,
                    };
                }
                acc
            }
        };
        Ok(result != predicate.is_inverted())
    }

    /// Evaluate one comparison, null test, ISA, LIKE or bare boolean test
    pub fn evaluate_simple(
        &self,
        predicate: &SimplePredicate,
        instance: &Instance,
        ctx: &dyn QueryContext,
    ) -> EvalResult<bool> {
        let op = predicate.operator();
        if op.is_unary() != predicate.right().is_none() {
            return Err(EvalError::malformed("SimplePredicate"));
        }

        let left = self.resolve_expression(predicate.left(), instance, ctx)?;
        trace!("{} resolved left side to {}", predicate, left);

        match (op, predicate.right()) {
            (ComparisonOp::IsNull, _) => Ok(left.is_null()),
            (ComparisonOp::IsNotNull, _) => Ok(!left.is_null()),
            (ComparisonOp::NoOp, _) => match left {
                CqlValue::Boolean(b) => Ok(b),
                CqlValue::Null => Err(EvalError::null_operand("bare test")),
                other => Err(EvalError::type_mismatch("bare test", other.type_name(), "Boolean")),
            },
            (ComparisonOp::Isa, Some(right)) => self.evaluate_isa(left, right, ctx),
            (ComparisonOp::Like, Some(right)) => self.evaluate_like(left, right),
            (_, Some(right)) => {
                let right = self.resolve_expression(right, instance, ctx)?;
                compare_values(op, &left, &right)
            }
            (_, None) => Err(EvalError::malformed("SimplePredicate")),
        }
    }

    fn evaluate_isa(
        &self,
        left: CqlValue,
        right: &Expression,
        ctx: &dyn QueryContext,
    ) -> EvalResult<bool> {
        let class = right
            .as_simple_value()
            .and_then(CqlValue::as_identifier)
            .and_then(|chain| chain.last())
            .ok_or_else(|| {
                EvalError::syntax(CIMQL0003, format!("ISA expects a class name, found {}", right))
            })?;

        match left {
            CqlValue::Object(CimObject::Instance(object)) => {
                Ok(ctx.is_subclass_of(&object.class_name, class.name()))
            }
            CqlValue::Object(CimObject::Class(object)) => {
                Ok(ctx.is_subclass_of(&object.name, class.name()))
            }
            CqlValue::Null => Err(EvalError::null_operand("ISA")),
            other => Err(EvalError::type_mismatch("ISA", other.type_name(), "Object")),
        }
    }

    fn evaluate_like(&self, left: CqlValue, right: &Expression) -> EvalResult<bool> {
        let pattern = right.as_simple_value().ok_or_else(|| {
            EvalError::syntax(CIMQL0003, format!("LIKE expects a pattern literal, found {}", right))
        })?;
        let pattern = match pattern {
            CqlValue::Identifier(chain) => {
                return Err(EvalError::syntax(
                    CIMQL0004,
                    format!("LIKE pattern must be a literal, found {}", chain),
                ));
            }
            CqlValue::String(pattern) => pattern,
            other => return Err(EvalError::type_mismatch("LIKE", "String", other.type_name())),
        };

        match left {
            CqlValue::String(value) => self.patterns.is_match(&value, pattern),
            CqlValue::Null => Err(EvalError::null_operand("LIKE")),
            other => Err(EvalError::type_mismatch("LIKE", other.type_name(), "String")),
        }
    }

    /// Resolve an additive expression to a value
    pub fn resolve_expression(
        &self,
        expression: &Expression,
        instance: &Instance,
        ctx: &dyn QueryContext,
    ) -> EvalResult<CqlValue> {
        let Some((first, rest)) = expression.terms().split_first() else {
            return Err(EvalError::malformed("Expression"));
        };
        if expression.operators().len() != rest.len() {
            return Err(EvalError::malformed("Expression"));
        }

        let mut value = self.resolve_term(first, instance, ctx)?;
        for (op, term) in expression.operators().iter().zip(rest) {
            let right = self.resolve_term(term, instance, ctx)?;
            value = apply_expression_op(*op, value, right)?;
        }
        Ok(value)
    }

    /// Resolve a multiplicative/concatenation term to a value
    pub fn resolve_term(
        &self,
        term: &Term,
        instance: &Instance,
        ctx: &dyn QueryContext,
    ) -> EvalResult<CqlValue> {
        let Some((first, rest)) = term.factors().split_first() else {
            return Err(EvalError::malformed("Term"));
        };
        if term.operators().len() != rest.len() {
            return Err(EvalError::malformed("Term"));
        }

        let mut value = self.resolve_factor(first, instance, ctx)?;
        for (op, factor) in term.operators().iter().zip(rest) {
            let right = self.resolve_factor(factor, instance, ctx)?;
            value = apply_term_op(*op, value, right)?;
        }
        Ok(value)
    }

    /// Resolve a factor, applying its unary inversion last
    pub fn resolve_factor(
        &self,
        factor: &Factor,
        instance: &Instance,
        ctx: &dyn QueryContext,
    ) -> EvalResult<CqlValue> {
        let value = match factor.kind() {
            FactorKind::Value(value) => self.resolve_value(value, instance, ctx)?,
            FactorKind::Function(function) => self.call_function(function, instance, ctx)?,
            FactorKind::Expression(expression) => self.resolve_expression(expression, instance, ctx)?,
        };
        if factor.is_inverted() {
            invert(value)
        } else {
            Ok(value)
        }
    }

    /// Literals resolve to themselves; identifiers are looked up on the instance
    pub fn resolve_value(
        &self,
        value: &CqlValue,
        instance: &Instance,
        ctx: &dyn QueryContext,
    ) -> EvalResult<CqlValue> {
        match value {
            CqlValue::Identifier(chain) => self.resolve_chain(chain, instance, ctx),
            literal => Ok(literal.clone()),
        }
    }
}
