//! Disjunctive normal form
//!
//! NOT is pushed down to the leaves first. Comparisons and null tests absorb
//! it by flipping their operator; ISA, LIKE and bare tests keep it as an
//! inverted leaf. AND is then distributed over OR, giving an OR of AND-chains.

use crate::error::{EvalError, EvalResult};
use cimql_ast::{BooleanOp, Predicate, PredicateBody};

/// One conjunction of leaves
type Conjunction = Vec<Predicate>;

/// Rewrites predicates into disjunctive normal form
pub struct Dnf;

impl Dnf {
    /// Equivalent predicate in disjunctive normal form
    pub fn normalize(predicate: &Predicate) -> EvalResult<Predicate> {
        if !predicate.is_well_formed() {
            return Err(EvalError::malformed("Predicate"));
        }
        let pushed = push_not(predicate.clone(), false);
        Ok(rebuild(distribute(&pushed)))
    }

    /// An OR of AND-chains of leaves, with no inverted compound node
    pub fn is_normalized(predicate: &Predicate) -> bool {
        fn conjunction(p: &Predicate) -> bool {
            match p.body() {
                PredicateBody::Simple { .. } => true,
                PredicateBody::Compound { children, operators } => {
                    !p.is_inverted()
                        && operators.iter().all(|op| *op == BooleanOp::And)
                        && children.iter().all(Predicate::is_simple)
                }
            }
        }
        match predicate.body() {
            PredicateBody::Simple { .. } => true,
            PredicateBody::Compound { children, operators } => {
                !predicate.is_inverted()
                    && if operators.iter().all(|op| *op == BooleanOp::Or) {
                        children.iter().all(conjunction)
                    } else {
                        conjunction(predicate)
                    }
            }
        }
    }
}

fn dual(op: BooleanOp) -> BooleanOp {
    match op {
        BooleanOp::And => BooleanOp::Or,
        BooleanOp::Or => BooleanOp::And,
    }
}

/// Push negation to the leaves with De Morgan's laws
fn push_not(predicate: Predicate, negate: bool) -> Predicate {
    let negate = negate != predicate.is_inverted();
    let (body, _) = predicate.into_parts();
    match body {
        PredicateBody::Simple { predicate: leaf } => {
            if !negate {
                return Predicate::simple(leaf);
            }
            match leaf.operator().negated() {
                Some(op) => Predicate::simple(leaf.with_operator(op)),
                None => Predicate::simple(leaf).inverted(),
            }
        }
        PredicateBody::Compound { children, operators } => {
            let mut children = children.into_iter();
            let Some(first) = children.next() else {
                return Predicate::compound(Vec::new(), Vec::new());
            };
            let mut acc = push_not(first, negate);
            for (op, child) in operators.into_iter().zip(children) {
                let op = if negate { dual(op) } else { op };
                acc = Predicate::compound(vec![acc, push_not(child, negate)], vec![op]);
            }
            acc
        }
    }
}

/// Expand a negation-free tree into its conjunctions
fn distribute(predicate: &Predicate) -> Vec<Conjunction> {
    match predicate.body() {
        PredicateBody::Simple { .. } => vec![vec![predicate.clone()]],
        PredicateBody::Compound { children, operators } => {
            let Some((first, rest)) = children.split_first() else {
                return Vec::new();
            };
            let mut acc = distribute(first);
            for (op, child) in operators.iter().zip(rest) {
                let rhs = distribute(child);
                acc = match op {
                    BooleanOp::Or => acc.into_iter().chain(rhs).collect(),
                    BooleanOp::And => acc
                        .iter()
                        .flat_map(|left| {
                            rhs.iter().map(move |right| {
                                left.iter().chain(right).cloned().collect::<Conjunction>()
                            })
                        })
                        .collect(),
                };
            }
            acc
        }
    }
}

fn join(mut parts: Vec<Predicate>, op: BooleanOp) -> Predicate {
    if parts.len() == 1 {
        if let Some(only) = parts.pop() {
            return only;
        }
    }
    let operators = vec![op; parts.len().saturating_sub(1)];
    Predicate::compound(parts, operators)
}

fn rebuild(conjunctions: Vec<Conjunction>) -> Predicate {
    let disjuncts = conjunctions
        .into_iter()
        .map(|leaves| join(leaves, BooleanOp::And))
        .collect();
    join(disjuncts, BooleanOp::Or)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cimql_ast::{ComparisonOp, Expression, SimplePredicate};
    use pretty_assertions::assert_eq;

    // ============================================================================
    // Test Helpers
    // ============================================================================

    fn eq(name: &str, value: u64) -> Predicate {
        SimplePredicate::compare(Expression::identifier(name), ComparisonOp::Eq, Expression::value(value))
            .into()
    }

    fn normalized(predicate: &Predicate) -> String {
        let dnf = Dnf::normalize(predicate).unwrap();
        assert!(Dnf::is_normalized(&dnf), "{}", dnf);
        dnf.to_string()
    }

    #[test]
    fn test_distributes_and_over_or() {
        let predicate = eq("A", 1).or(eq("B", 2)).and(eq("C", 3));
        assert_eq!(normalized(&predicate), "(A = 1 AND C = 3) OR (B = 2 AND C = 3)");
    }

    #[test]
    fn test_de_morgan_flips_operators() {
        let predicate = eq("A", 1).and(eq("B", 2)).inverted();
        assert_eq!(normalized(&predicate), "A <> 1 OR B <> 2");
    }

    #[test]
    fn test_double_negation() {
        let predicate = eq("A", 1).inverted().inverted();
        assert_eq!(normalized(&predicate), "A = 1");
    }

    #[test]
    fn test_like_keeps_inversion() {
        let like: Predicate = SimplePredicate::like(Expression::identifier("Name"), "Disk%").into();
        let null: Predicate = SimplePredicate::is_null(Expression::identifier("Size")).into();
        let predicate = like.or(null).inverted();
        assert_eq!(normalized(&predicate), "NOT Name LIKE 'Disk%' AND Size IS NOT NULL");
    }

    #[test]
    fn test_malformed_input() {
        let empty = Predicate::compound(Vec::new(), Vec::new());
        assert!(matches!(
            Dnf::normalize(&empty).unwrap_err(),
            EvalError::MalformedTree { .. }
        ));
    }
}
