//! Predicates: the boolean layer of a WHERE clause

use crate::{BooleanOp, ComparisonOp, Expression};
use cimql_types::{ChainedIdentifier, CqlValue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One comparison, null test, ISA, LIKE or bare boolean expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimplePredicate {
    left: Expression,
    op: ComparisonOp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    right: Option<Expression>,
}

impl SimplePredicate {
    /// Raw constructor; evaluation rejects operator/operand mismatches
    pub fn new(left: Expression, op: ComparisonOp, right: Option<Expression>) -> Self {
        Self { left, op, right }
    }

    /// Binary comparison (`<`, `>`, `=`, `<=`, `>=`, `<>`)
    pub fn compare(left: Expression, op: ComparisonOp, right: Expression) -> Self {
        Self::new(left, op, Some(right))
    }

    pub fn is_null(left: Expression) -> Self {
        Self::new(left, ComparisonOp::IsNull, None)
    }

    pub fn is_not_null(left: Expression) -> Self {
        Self::new(left, ComparisonOp::IsNotNull, None)
    }

    /// Bare boolean test
    pub fn bare(left: Expression) -> Self {
        Self::new(left, ComparisonOp::NoOp, None)
    }

    /// `left ISA class_name`
    pub fn isa(left: Expression, class_name: impl Into<String>) -> Self {
        let class = ChainedIdentifier::from(class_name.into().as_str());
        Self::new(left, ComparisonOp::Isa, Some(Expression::identifier(class)))
    }

    /// `left LIKE 'pattern'`
    pub fn like(left: Expression, pattern: impl Into<String>) -> Self {
        Self::new(
            left,
            ComparisonOp::Like,
            Some(Expression::value(CqlValue::String(pattern.into()))),
        )
    }

    pub fn left(&self) -> &Expression {
        &self.left
    }

    pub fn right(&self) -> Option<&Expression> {
        self.right.as_ref()
    }

    pub fn left_mut(&mut self) -> &mut Expression {
        &mut self.left
    }

    pub fn right_mut(&mut self) -> Option<&mut Expression> {
        self.right.as_mut()
    }

    pub fn into_left(self) -> Expression {
        self.left
    }

    pub fn operator(&self) -> ComparisonOp {
        self.op
    }

    /// No right-hand operand
    pub fn is_simple(&self) -> bool {
        self.right.is_none()
    }

    /// The right operand is present exactly when the operator needs one
    pub fn is_well_formed(&self) -> bool {
        self.op.is_unary() == self.right.is_none()
            && self.left.is_well_formed()
            && self.right.as_ref().is_none_or(Expression::is_well_formed)
    }

    /// Same operands with the operator replaced
    pub fn with_operator(mut self, op: ComparisonOp) -> Self {
        self.op = op;
        self
    }
}

impl fmt::Display for SimplePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.left)?;
        match (self.op, &self.right) {
            (ComparisonOp::NoOp, _) => Ok(()),
            (op, None) => write!(f, " {}", op),
            (op, Some(right)) => write!(f, " {} {}", op, right),
        }
    }
}

/// Body of a predicate: a leaf or a left-to-right boolean chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum PredicateBody {
    Simple {
        predicate: SimplePredicate,
    },
    Compound {
        children: Vec<Predicate>,
        operators: Vec<BooleanOp>,
    },
}

/// Root of a WHERE clause
///
/// Compound predicates fold left to right over their children: `A OR B AND C`
/// as a single chain means `(A OR B) AND C`. The builders [`Predicate::and`]
/// and [`Predicate::or`] keep each chain to one connective, nesting when the
/// connective changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    body: PredicateBody,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    inverted: bool,
}

impl Predicate {
    pub fn simple(predicate: SimplePredicate) -> Self {
        Self {
            body: PredicateBody::Simple { predicate },
            inverted: false,
        }
    }

    /// Compound predicate from explicit children and connectives
    pub fn compound(children: Vec<Predicate>, operators: Vec<BooleanOp>) -> Self {
        Self {
            body: PredicateBody::Compound {
                children,
                operators,
            },
            inverted: false,
        }
    }

    /// Append `other` with a connective
    pub fn append(self, op: BooleanOp, other: Predicate) -> Self {
        match self {
            Self {
                body:
                    PredicateBody::Compound {
                        mut children,
                        mut operators,
                    },
                inverted: false,
            } if operators.iter().all(|existing| *existing == op) => {
                children.push(other);
                operators.push(op);
                Self::compound(children, operators)
            }
            lhs => Self::compound(vec![lhs, other], vec![op]),
        }
    }

    pub fn and(self, other: Predicate) -> Self {
        self.append(BooleanOp::And, other)
    }

    pub fn or(self, other: Predicate) -> Self {
        self.append(BooleanOp::Or, other)
    }

    /// Toggle the NOT flag
    pub fn inverted(mut self) -> Self {
        self.inverted = !self.inverted;
        self
    }

    pub fn set_inverted(&mut self, inverted: bool) {
        self.inverted = inverted;
    }

    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    /// A single simple predicate, no boolean composition
    pub fn is_simple(&self) -> bool {
        matches!(self.body, PredicateBody::Simple { .. })
    }

    pub fn body(&self) -> &PredicateBody {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut PredicateBody {
        &mut self.body
    }

    pub fn into_parts(self) -> (PredicateBody, bool) {
        (self.body, self.inverted)
    }

    pub fn simple_predicate(&self) -> Option<&SimplePredicate> {
        match &self.body {
            PredicateBody::Simple { predicate } => Some(predicate),
            PredicateBody::Compound { .. } => None,
        }
    }

    pub fn children(&self) -> &[Predicate] {
        match &self.body {
            PredicateBody::Simple { .. } => &[],
            PredicateBody::Compound { children, .. } => children,
        }
    }

    pub fn operators(&self) -> &[BooleanOp] {
        match &self.body {
            PredicateBody::Simple { .. } => &[],
            PredicateBody::Compound { operators, .. } => operators,
        }
    }

    /// Chain invariants hold throughout the tree
    pub fn is_well_formed(&self) -> bool {
        match &self.body {
            PredicateBody::Simple { predicate } => predicate.is_well_formed(),
            PredicateBody::Compound {
                children,
                operators,
            } => {
                !children.is_empty()
                    && operators.len() + 1 == children.len()
                    && children.iter().all(Predicate::is_well_formed)
            }
        }
    }

    /// Simple predicates at the leaves, left to right
    pub fn leaves(&self) -> Vec<&SimplePredicate> {
        match &self.body {
            PredicateBody::Simple { predicate } => vec![predicate],
            PredicateBody::Compound { children, .. } => {
                children.iter().flat_map(Predicate::leaves).collect()
            }
        }
    }

    /// Visit every leaf mutably, stopping at the first error
    pub fn try_for_each_leaf_mut<E, F>(&mut self, f: &mut F) -> Result<(), E>
    where
        F: FnMut(&mut SimplePredicate) -> Result<(), E>,
    {
        match &mut self.body {
            PredicateBody::Simple { predicate } => f(predicate),
            PredicateBody::Compound { children, .. } => {
                for child in children {
                    child.try_for_each_leaf_mut(f)?;
                }
                Ok(())
            }
        }
    }

    fn fmt_child(child: &Predicate) -> String {
        match child.body {
            PredicateBody::Compound { .. } if !child.inverted => format!("({})", child),
            _ => child.to_string(),
        }
    }
}

impl From<SimplePredicate> for Predicate {
    fn from(predicate: SimplePredicate) -> Self {
        Self::simple(predicate)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.body {
            PredicateBody::Simple { predicate } => {
                if self.inverted {
                    write!(f, "NOT ")?;
                }
                write!(f, "{}", predicate)
            }
            PredicateBody::Compound {
                children,
                operators,
            } => {
                let mut text = children.first().map(Self::fmt_child).unwrap_or_default();
                for (i, child) in children.iter().enumerate().skip(1) {
                    let op = operators.get(i - 1).copied();
                    // a change of connective closes the folded prefix
                    if i > 1 && op != operators.get(i - 2).copied() {
                        text = format!("({})", text);
                    }
                    match op {
                        Some(op) => text.push_str(&format!(" {} ", op)),
                        None => text.push_str(" ? "),
                    }
                    text.push_str(&Self::fmt_child(child));
                }
                if self.inverted {
                    write!(f, "NOT ({})", text)
                } else {
                    f.write_str(&text)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eq(name: &str, value: u64) -> Predicate {
        SimplePredicate::compare(Expression::identifier(name), ComparisonOp::Eq, Expression::value(value))
            .into()
    }

    #[test]
    fn test_simple_display() {
        assert_eq!(eq("A", 1).to_string(), "A = 1");
        assert_eq!(eq("A", 1).inverted().to_string(), "NOT A = 1");
        assert_eq!(
            Predicate::from(SimplePredicate::is_not_null(Expression::identifier("Size"))).to_string(),
            "Size IS NOT NULL"
        );
        assert_eq!(
            Predicate::from(SimplePredicate::isa(Expression::identifier("CIM_Disk"), "CIM_Device"))
                .to_string(),
            "CIM_Disk ISA CIM_Device"
        );
    }

    #[test]
    fn test_builders_keep_one_connective_per_chain() {
        let chain = eq("A", 1).and(eq("B", 2)).and(eq("C", 3));
        assert_eq!(chain.children().len(), 3);
        assert_eq!(chain.to_string(), "A = 1 AND B = 2 AND C = 3");

        let mixed = eq("A", 1).or(eq("B", 2)).and(eq("C", 3));
        assert_eq!(mixed.children().len(), 2);
        assert_eq!(mixed.to_string(), "(A = 1 OR B = 2) AND C = 3");
    }

    #[test]
    fn test_mixed_chain_display_preserves_fold() {
        let chain = Predicate::compound(
            vec![eq("A", 1), eq("B", 2), eq("C", 3)],
            vec![BooleanOp::Or, BooleanOp::And],
        );
        assert_eq!(chain.to_string(), "(A = 1 OR B = 2) AND C = 3");
    }

    #[test]
    fn test_inverted_compound() {
        let p = eq("A", 1).or(eq("B", 2)).inverted();
        assert_eq!(p.to_string(), "NOT (A = 1 OR B = 2)");
        let nested = eq("C", 3).and(p);
        assert_eq!(nested.to_string(), "C = 3 AND NOT (A = 1 OR B = 2)");
    }

    #[test]
    fn test_well_formed() {
        assert!(eq("A", 1).is_well_formed());
        let bad = SimplePredicate::new(Expression::identifier("A"), ComparisonOp::Eq, None);
        assert!(!bad.is_well_formed());
        let empty = Predicate::compound(vec![], vec![]);
        assert!(!empty.is_well_formed());
    }
}
