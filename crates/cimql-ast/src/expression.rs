//! Arithmetic chains: factors, terms and expressions
//!
//! An [`Expression`] is a left-to-right chain of [`Term`]s joined by additive
//! operators; a term is a chain of [`Factor`]s joined by multiplicative and
//! concatenation operators. Each chain keeps `operators.len() == children.len() - 1`.
//! The constructors uphold that; deserialized trees are checked with
//! [`Expression::is_well_formed`] before evaluation.

use crate::{ExpressionOp, Function, TermOp};
use cimql_types::{ChainedIdentifier, CqlValue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The single payload of a factor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "node")]
pub enum FactorKind {
    /// Literal or unresolved property chain
    Value(CqlValue),
    /// Function call
    Function(Function),
    /// Parenthesized expression
    Expression(Box<Expression>),
}

/// A value, function call or nested expression, optionally inverted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Factor {
    kind: FactorKind,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    invert: bool,
}

impl Factor {
    pub fn new(kind: FactorKind) -> Self {
        Self {
            kind,
            invert: false,
        }
    }

    pub fn value(value: impl Into<CqlValue>) -> Self {
        Self::new(FactorKind::Value(value.into()))
    }

    pub fn function(function: Function) -> Self {
        Self::new(FactorKind::Function(function))
    }

    pub fn nested(expression: Expression) -> Self {
        Self::new(FactorKind::Expression(Box::new(expression)))
    }

    /// Toggle the unary NOT flag
    pub fn inverted(mut self) -> Self {
        self.invert = !self.invert;
        self
    }

    pub fn kind(&self) -> &FactorKind {
        &self.kind
    }

    pub fn into_kind(self) -> FactorKind {
        self.kind
    }

    pub fn is_inverted(&self) -> bool {
        self.invert
    }

    /// A bare, non-inverted value
    pub fn is_simple_value(&self) -> bool {
        !self.invert && matches!(self.kind, FactorKind::Value(_))
    }

    fn is_well_formed(&self) -> bool {
        match &self.kind {
            FactorKind::Value(_) => true,
            FactorKind::Function(function) => function.args().iter().all(Expression::is_well_formed),
            FactorKind::Expression(inner) => inner.is_well_formed(),
        }
    }

    fn try_for_each_value_mut<E, F>(&mut self, f: &mut F) -> Result<(), E>
    where
        F: FnMut(&mut CqlValue) -> Result<(), E>,
    {
        match &mut self.kind {
            FactorKind::Value(value) => f(value),
            FactorKind::Function(function) => {
                for arg in function.args_mut() {
                    arg.try_for_each_value_mut(f)?;
                }
                Ok(())
            }
            FactorKind::Expression(inner) => inner.try_for_each_value_mut(f),
        }
    }

    fn collect_identifiers<'a>(&'a self, out: &mut Vec<&'a ChainedIdentifier>) {
        match &self.kind {
            FactorKind::Value(CqlValue::Identifier(chain)) => out.push(chain),
            FactorKind::Value(_) => {}
            FactorKind::Function(function) => {
                for arg in function.args() {
                    arg.collect_identifiers(out);
                }
            }
            FactorKind::Expression(inner) => inner.collect_identifiers(out),
        }
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.invert {
            write!(f, "NOT ")?;
        }
        match &self.kind {
            FactorKind::Value(value) => write!(f, "{}", value),
            FactorKind::Function(function) => write!(f, "{}", function),
            FactorKind::Expression(inner) => write!(f, "({})", inner),
        }
    }
}

/// Factors joined by `*`, `/` or `||`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    factors: Vec<Factor>,
    #[serde(default)]
    operators: Vec<TermOp>,
}

impl Term {
    pub fn new(factor: Factor) -> Self {
        Self {
            factors: vec![factor],
            operators: Vec::new(),
        }
    }

    /// Extend the chain on the right
    pub fn append(mut self, op: TermOp, factor: Factor) -> Self {
        self.operators.push(op);
        self.factors.push(factor);
        self
    }

    pub fn factors(&self) -> &[Factor] {
        &self.factors
    }

    pub fn operators(&self) -> &[TermOp] {
        &self.operators
    }

    pub fn into_factors(self) -> Vec<Factor> {
        self.factors
    }

    pub fn is_simple(&self) -> bool {
        self.factors.len() == 1
    }

    pub fn is_simple_value(&self) -> bool {
        self.is_simple() && self.factors[0].is_simple_value()
    }

    pub fn is_well_formed(&self) -> bool {
        !self.factors.is_empty()
            && self.operators.len() + 1 == self.factors.len()
            && self.factors.iter().all(Factor::is_well_formed)
    }

    fn try_for_each_value_mut<E, F>(&mut self, f: &mut F) -> Result<(), E>
    where
        F: FnMut(&mut CqlValue) -> Result<(), E>,
    {
        for factor in &mut self.factors {
            factor.try_for_each_value_mut(f)?;
        }
        Ok(())
    }

    fn collect_identifiers<'a>(&'a self, out: &mut Vec<&'a ChainedIdentifier>) {
        for factor in &self.factors {
            factor.collect_identifiers(out);
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, factor) in self.factors.iter().enumerate() {
            if i > 0 {
                match self.operators.get(i - 1) {
                    Some(op) => write!(f, " {} ", op)?,
                    None => write!(f, " ? ")?,
                }
            }
            write!(f, "{}", factor)?;
        }
        Ok(())
    }
}

/// Terms joined by `+` or `-`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    terms: Vec<Term>,
    #[serde(default)]
    operators: Vec<ExpressionOp>,
}

impl Expression {
    pub fn new(term: Term) -> Self {
        Self {
            terms: vec![term],
            operators: Vec::new(),
        }
    }

    /// Single-value expression
    pub fn value(value: impl Into<CqlValue>) -> Self {
        Self::new(Term::new(Factor::value(value)))
    }

    /// Single property-chain expression
    pub fn identifier(chain: impl Into<ChainedIdentifier>) -> Self {
        Self::value(CqlValue::Identifier(chain.into()))
    }

    /// Single function-call expression
    pub fn function(function: Function) -> Self {
        Self::new(Term::new(Factor::function(function)))
    }

    /// Extend the chain on the right
    pub fn append(mut self, op: ExpressionOp, term: Term) -> Self {
        self.operators.push(op);
        self.terms.push(term);
        self
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn operators(&self) -> &[ExpressionOp] {
        &self.operators
    }

    pub fn into_terms(self) -> Vec<Term> {
        self.terms
    }

    pub fn is_simple(&self) -> bool {
        self.terms.len() == 1
    }

    /// Exactly one child at every level down to a bare value
    pub fn is_simple_value(&self) -> bool {
        self.is_simple() && self.terms[0].is_simple_value()
    }

    /// The bare value when [`Expression::is_simple_value`] holds
    pub fn as_simple_value(&self) -> Option<&CqlValue> {
        if !self.is_simple_value() {
            return None;
        }
        match self.terms[0].factors[0].kind() {
            FactorKind::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Mutable access to the bare value when [`Expression::is_simple_value`] holds
    pub fn as_simple_value_mut(&mut self) -> Option<&mut CqlValue> {
        if !self.is_simple_value() {
            return None;
        }
        match &mut self.terms[0].factors[0].kind {
            FactorKind::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Chain invariants hold at every level
    pub fn is_well_formed(&self) -> bool {
        !self.terms.is_empty()
            && self.operators.len() + 1 == self.terms.len()
            && self.terms.iter().all(Term::is_well_formed)
    }

    /// Visit every value in the tree, including function arguments, stopping at the first error
    pub fn try_for_each_value_mut<E, F>(&mut self, f: &mut F) -> Result<(), E>
    where
        F: FnMut(&mut CqlValue) -> Result<(), E>,
    {
        for term in &mut self.terms {
            term.try_for_each_value_mut(f)?;
        }
        Ok(())
    }

    /// Every property chain in the tree, in source order
    pub fn identifiers(&self) -> Vec<&ChainedIdentifier> {
        let mut out = Vec::new();
        self.collect_identifiers(&mut out);
        out
    }

    fn collect_identifiers<'a>(&'a self, out: &mut Vec<&'a ChainedIdentifier>) {
        for term in &self.terms {
            term.collect_identifiers(out);
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                match self.operators.get(i - 1) {
                    Some(op) => write!(f, " {} ", op)?,
                    None => write!(f, " ? ")?,
                }
            }
            write!(f, "{}", term)?;
        }
        Ok(())
    }
}
