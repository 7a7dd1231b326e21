//! Query operators with precedence information

use serde::{Deserialize, Serialize};
use std::fmt;

/// Multiplicative and string operators joining the factors of a term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TermOp {
    /// Multiplication (reserved)
    Multiply,
    /// Division (reserved)
    Divide,
    /// String concatenation `||`
    Concat,
}

impl TermOp {
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Concat => "||",
        }
    }
}

/// Additive operators joining the terms of an expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExpressionOp {
    /// Numeric addition or string concatenation
    Plus,
    /// Subtraction (reserved)
    Minus,
}

impl ExpressionOp {
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Minus => "-",
        }
    }
}

/// Operators of a simple predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOp {
    /// Less than
    Lt,
    /// Greater than
    Gt,
    /// Equality
    Eq,
    /// Less than or equal
    Le,
    /// Greater than or equal
    Ge,
    /// Inequality
    Ne,
    /// Null test
    IsNull,
    /// Non-null test
    IsNotNull,
    /// Class membership, `x ISA Class`
    Isa,
    /// Wildcard match
    Like,
    /// Bare boolean expression
    NoOp,
}

impl ComparisonOp {
    /// Operators that take no right-hand operand
    pub const fn is_unary(&self) -> bool {
        matches!(self, Self::IsNull | Self::IsNotNull | Self::NoOp)
    }

    /// Ordering and equality operators
    pub const fn is_comparison(&self) -> bool {
        matches!(
            self,
            Self::Lt | Self::Gt | Self::Eq | Self::Le | Self::Ge | Self::Ne
        )
    }

    /// Operator with the opposite truth value, where one exists
    pub const fn negated(&self) -> Option<Self> {
        match self {
            Self::Lt => Some(Self::Ge),
            Self::Ge => Some(Self::Lt),
            Self::Gt => Some(Self::Le),
            Self::Le => Some(Self::Gt),
            Self::Eq => Some(Self::Ne),
            Self::Ne => Some(Self::Eq),
            Self::IsNull => Some(Self::IsNotNull),
            Self::IsNotNull => Some(Self::IsNull),
            Self::Isa | Self::Like | Self::NoOp => None,
        }
    }

    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Eq => "=",
            Self::Le => "<=",
            Self::Ge => ">=",
            Self::Ne => "<>",
            Self::IsNull => "IS NULL",
            Self::IsNotNull => "IS NOT NULL",
            Self::Isa => "ISA",
            Self::Like => "LIKE",
            Self::NoOp => "",
        }
    }
}

/// Boolean connectives between predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BooleanOp {
    And,
    Or,
}

impl BooleanOp {
    /// Binding strength; AND binds tighter than OR
    pub const fn precedence(&self) -> u8 {
        match self {
            Self::Or => 1,
            Self::And => 2,
        }
    }

    /// De Morgan dual
    pub const fn dual(&self) -> Self {
        match self {
            Self::And => Self::Or,
            Self::Or => Self::And,
        }
    }

    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

impl fmt::Display for TermOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl fmt::Display for ExpressionOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl fmt::Display for BooleanOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}
