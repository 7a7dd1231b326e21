//! Closed sum type over every query node kind
//!
//! Builders that assemble trees from heterogeneous pieces (a parser, a JSON
//! document loader) hold nodes as [`QueryNode`] and convert between kinds with
//! the pattern-matched methods below. Lifting a node upward (a value into a
//! factor, a factor into an expression, an expression into a predicate) always
//! succeeds. Extracting a narrower node succeeds only when the wrapper is
//! simple at every level; otherwise the conversion fails with `CIMQL0003`.

use crate::{Expression, Factor, FactorKind, Function, Predicate, SimplePredicate, Term};
use cimql_diagnostics::{CIMQL0003, QueryError};
use cimql_types::{ChainedIdentifier, CqlValue, Identifier};
use serde::{Deserialize, Serialize};

/// Any node of a query tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", content = "body")]
pub enum QueryNode {
    Identifier(Identifier),
    ChainedIdentifier(ChainedIdentifier),
    Value(CqlValue),
    Function(Function),
    Factor(Factor),
    Term(Term),
    Expression(Expression),
    SimplePredicate(SimplePredicate),
    Predicate(Predicate),
}

impl QueryNode {
    /// Node kind name for diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Identifier(_) => "Identifier",
            Self::ChainedIdentifier(_) => "ChainedIdentifier",
            Self::Value(_) => "Value",
            Self::Function(_) => "Function",
            Self::Factor(_) => "Factor",
            Self::Term(_) => "Term",
            Self::Expression(_) => "Expression",
            Self::SimplePredicate(_) => "SimplePredicate",
            Self::Predicate(_) => "Predicate",
        }
    }

    /// Narrow to a single property chain
    pub fn into_chained_identifier(self) -> Result<ChainedIdentifier, QueryError> {
        match self {
            Self::Identifier(identifier) => Ok(identifier.into()),
            Self::ChainedIdentifier(chain) => Ok(chain),
            other => match other.into_value()? {
                CqlValue::Identifier(chain) => Ok(chain),
                value => Err(not_simple("ChainedIdentifier", &value.type_name())),
            },
        }
    }

    /// Narrow to a bare value; identifiers become unresolved chain values
    pub fn into_value(self) -> Result<CqlValue, QueryError> {
        match self {
            Self::Identifier(identifier) => Ok(CqlValue::Identifier(identifier.into())),
            Self::ChainedIdentifier(chain) => Ok(CqlValue::Identifier(chain)),
            Self::Value(value) => Ok(value),
            Self::Function(_) => Err(not_simple("Value", "Function")),
            Self::Factor(factor) => factor_value(factor),
            Self::Term(term) => Self::Factor(single_factor(term)?).into_value(),
            other => Self::Term(other.into_term()?).into_value(),
        }
    }

    /// Lift into a factor, or narrow a simple term or expression to one
    pub fn into_factor(self) -> Result<Factor, QueryError> {
        match self {
            Self::Factor(factor) => Ok(factor),
            Self::Function(function) => Ok(Factor::function(function)),
            Self::Term(term) => single_factor(term),
            Self::Expression(_) | Self::SimplePredicate(_) | Self::Predicate(_) => {
                Self::Term(self.into_term()?).into_factor()
            }
            other => Ok(Factor::value(other.into_value()?)),
        }
    }

    /// Lift into a term, or narrow a simple expression to one
    pub fn into_term(self) -> Result<Term, QueryError> {
        match self {
            Self::Term(term) => Ok(term),
            Self::Expression(expression) => single_term(expression),
            Self::SimplePredicate(_) | Self::Predicate(_) => {
                Self::Expression(self.into_expression()?).into_term()
            }
            other => Ok(Term::new(other.into_factor()?)),
        }
    }

    /// Lift into an expression, or narrow a bare-test predicate to its operand
    pub fn into_expression(self) -> Result<Expression, QueryError> {
        match self {
            Self::Expression(expression) => Ok(expression),
            Self::SimplePredicate(predicate) => bare_operand(predicate),
            Self::Predicate(predicate) => {
                Self::SimplePredicate(predicate.into_simple()?).into_expression()
            }
            other => Ok(Expression::new(other.into_term()?)),
        }
    }

    /// Lift into a simple predicate; a bare expression becomes a boolean test
    pub fn into_simple_predicate(self) -> Result<SimplePredicate, QueryError> {
        match self {
            Self::SimplePredicate(predicate) => Ok(predicate),
            Self::Predicate(predicate) => predicate.into_simple(),
            other => Ok(SimplePredicate::bare(other.into_expression()?)),
        }
    }

    /// Lift into a predicate; always succeeds
    pub fn into_predicate(self) -> Result<Predicate, QueryError> {
        match self {
            Self::Predicate(predicate) => Ok(predicate),
            other => Ok(Predicate::simple(other.into_simple_predicate()?)),
        }
    }
}

impl Predicate {
    /// The simple predicate of a non-inverted leaf
    fn into_simple(self) -> Result<SimplePredicate, QueryError> {
        match self.into_parts() {
            (crate::PredicateBody::Simple { predicate }, false) => Ok(predicate),
            (_, true) => Err(not_simple("SimplePredicate", "inverted Predicate")),
            (_, false) => Err(not_simple("SimplePredicate", "compound Predicate")),
        }
    }
}

fn not_simple(target: &str, found: &str) -> QueryError {
    QueryError::syntax(
        CIMQL0003,
        format!("Cannot convert {} to {}: not a simple value", found, target),
    )
}

fn factor_value(factor: Factor) -> Result<CqlValue, QueryError> {
    if factor.is_inverted() {
        return Err(not_simple("Value", "inverted Factor"));
    }
    match factor.into_kind() {
        FactorKind::Value(value) => Ok(value),
        FactorKind::Function(_) => Err(not_simple("Value", "Function")),
        FactorKind::Expression(inner) => QueryNode::Expression(*inner).into_value(),
    }
}

fn single_factor(term: Term) -> Result<Factor, QueryError> {
    let mut factors = term.into_factors();
    match (factors.pop(), factors.is_empty()) {
        (Some(factor), true) => Ok(factor),
        _ => Err(not_simple("Factor", "Term")),
    }
}

fn single_term(expression: Expression) -> Result<Term, QueryError> {
    let mut terms = expression.into_terms();
    match (terms.pop(), terms.is_empty()) {
        (Some(term), true) => Ok(term),
        _ => Err(not_simple("Term", "Expression")),
    }
}

fn bare_operand(predicate: SimplePredicate) -> Result<Expression, QueryError> {
    if predicate.operator() != crate::ComparisonOp::NoOp {
        return Err(not_simple("Expression", "SimplePredicate"));
    }
    Ok(predicate.into_left())
}

macro_rules! impl_node_conversions {
    ($($variant:ident => $ty:ty, $into:ident;)*) => {
        $(
            impl From<$ty> for QueryNode {
                fn from(node: $ty) -> Self {
                    Self::$variant(node)
                }
            }

            impl TryFrom<QueryNode> for $ty {
                type Error = QueryError;

                fn try_from(node: QueryNode) -> Result<Self, Self::Error> {
                    node.$into()
                }
            }
        )*
    };
}

impl_node_conversions! {
    ChainedIdentifier => ChainedIdentifier, into_chained_identifier;
    Value => CqlValue, into_value;
    Factor => Factor, into_factor;
    Term => Term, into_term;
    Expression => Expression, into_expression;
    SimplePredicate => SimplePredicate, into_simple_predicate;
    Predicate => Predicate, into_predicate;
}

impl From<Identifier> for QueryNode {
    fn from(identifier: Identifier) -> Self {
        Self::Identifier(identifier)
    }
}

impl From<Function> for QueryNode {
    fn from(function: Function) -> Self {
        Self::Function(function)
    }
}

impl TryFrom<QueryNode> for Function {
    type Error = QueryError;

    fn try_from(node: QueryNode) -> Result<Self, Self::Error> {
        let found = node.kind_name();
        match node.into_factor() {
            Ok(factor) if !factor.is_inverted() => match factor.into_kind() {
                FactorKind::Function(function) => Ok(function),
                _ => Err(not_simple("Function", found)),
            },
            _ => Err(not_simple("Function", found)),
        }
    }
}
