//! CIM Query Language expression and predicate trees
//!
//! This crate defines the nodes a WHERE clause is built from. Trees are built
//! bottom-up: values and function calls into [`Factor`]s, factors into
//! [`Term`]s, terms into [`Expression`]s, expressions into
//! [`SimplePredicate`]s, and those into a root [`Predicate`]. Every node owns
//! its children by value, renders back to query text through `Display`, and
//! round-trips through serde.
//!
//! Evaluation lives in `cimql-eval`.

mod expression;
mod function;
mod node;
mod operator;
mod predicate;

pub use expression::*;
pub use function::*;
pub use node::*;
pub use operator::*;
pub use predicate::*;

pub use cimql_types::{ChainedIdentifier, CqlValue, Identifier};
