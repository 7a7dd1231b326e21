//! CIM Query Language WHERE-clause evaluation
//!
//! This crate evaluates CQL WHERE clauses against CIM instances:
//!
//! - **Context binding**: property chains are scoped to the FROM class and
//!   standalone symbolic constants are anchored to their partner property
//! - **Resolution**: chains walk embedded objects, references and array
//!   elements on the candidate instance
//! - **Comparison**: numeric comparison across signedness, ordinal strings,
//!   datetimes, references, embedded objects and arrays
//! - **Boolean folding**: left-to-right AND/OR with short-circuit
//! - **Functions**: the CQL built-ins such as `CLASSNAME` and `DATETIME`
//! - **Statements**: select statements, DNF normalization and scanning
//!
//! # Example
//!
//! ```ignore
//! use cimql_eval::{Evaluate, ApplyContext, SchemaContext};
//!
//! let ctx = SchemaContext::builder().classes(classes).from_class("CIM_Disk").build();
//! predicate.apply_context(&ctx)?;
//! let matched = predicate.evaluate(&instance, &ctx)?;
//! ```
//!
//! # Null handling
//!
//! Null does not compare. Any comparison, arithmetic or LIKE with a null
//! operand is a runtime error; only IS NULL and IS NOT NULL test for null.

pub mod context;
pub mod dnf;
pub mod document;
pub mod engine;
pub mod error;
pub mod functions;
pub mod operators;
pub mod resolve;
pub mod scan;
pub mod scope;
pub mod select;

pub use context::{ClassRelation, QueryContext, SchemaContext, SchemaContextBuilder, ancestors};
pub use dnf::Dnf;
pub use document::{ConstantBinding, QueryDocument, SchemaDocument, instances_from_json};
pub use engine::QueryEngine;
pub use error::{EvalError, EvalResult};
pub use scan::{ScanErrorPolicy, Scanner};
pub use select::SelectStatement;

use cimql_ast::{Expression, Factor, Predicate, SimplePredicate, Term};
use cimql_types::{CqlValue, Instance};

/// Binding a node's property chains to the FROM class
pub trait ApplyContext {
    fn apply_context(&mut self, ctx: &dyn QueryContext) -> EvalResult<()>;
}

/// Evaluating a boolean node against a candidate instance
///
/// Each call runs on a fresh [`QueryEngine`]. Hold an engine, or a
/// [`Scanner`], to reuse compiled LIKE patterns across candidates.
pub trait Evaluate {
    fn evaluate(&self, instance: &Instance, ctx: &dyn QueryContext) -> EvalResult<bool>;
}

/// Resolving a value node against a candidate instance
pub trait ResolveValue {
    fn resolve_value(&self, instance: &Instance, ctx: &dyn QueryContext) -> EvalResult<CqlValue>;
}

impl ApplyContext for Predicate {
    fn apply_context(&mut self, ctx: &dyn QueryContext) -> EvalResult<()> {
        QueryEngine::new().apply_context(self, ctx)
    }
}

impl ApplyContext for SimplePredicate {
    fn apply_context(&mut self, ctx: &dyn QueryContext) -> EvalResult<()> {
        QueryEngine::new().apply_context_simple(self, ctx)
    }
}

impl ApplyContext for Expression {
    fn apply_context(&mut self, ctx: &dyn QueryContext) -> EvalResult<()> {
        QueryEngine::new().apply_context_expression(self, ctx)
    }
}

impl ApplyContext for SelectStatement {
    fn apply_context(&mut self, ctx: &dyn QueryContext) -> EvalResult<()> {
        SelectStatement::apply_context(self, ctx)
    }
}

impl Evaluate for Predicate {
    fn evaluate(&self, instance: &Instance, ctx: &dyn QueryContext) -> EvalResult<bool> {
        QueryEngine::new().evaluate(self, instance, ctx)
    }
}

impl Evaluate for SimplePredicate {
    fn evaluate(&self, instance: &Instance, ctx: &dyn QueryContext) -> EvalResult<bool> {
        QueryEngine::new().evaluate_simple(self, instance, ctx)
    }
}

impl Evaluate for SelectStatement {
    fn evaluate(&self, instance: &Instance, ctx: &dyn QueryContext) -> EvalResult<bool> {
        SelectStatement::evaluate(self, instance, ctx)
    }
}

impl ResolveValue for Expression {
    fn resolve_value(&self, instance: &Instance, ctx: &dyn QueryContext) -> EvalResult<CqlValue> {
        QueryEngine::new().resolve_expression(self, instance, ctx)
    }
}

impl ResolveValue for Term {
    fn resolve_value(&self, instance: &Instance, ctx: &dyn QueryContext) -> EvalResult<CqlValue> {
        QueryEngine::new().resolve_term(self, instance, ctx)
    }
}

impl ResolveValue for Factor {
    fn resolve_value(&self, instance: &Instance, ctx: &dyn QueryContext) -> EvalResult<CqlValue> {
        QueryEngine::new().resolve_factor(self, instance, ctx)
    }
}
