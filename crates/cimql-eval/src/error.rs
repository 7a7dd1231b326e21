//! Evaluation errors for the query engine

use cimql_diagnostics::{
    CIMQL0100, CIMQL0101, CIMQL0102, CIMQL0103, CIMQL0104, CIMQL0105, CIMQL0106, CIMQL0107,
    CIMQL0108, CIMQL0109, CIMQL0110, CIMQL0111, CIMQL0200, CIMQL0201, ErrorBuilder, ErrorCode,
    ErrorKind, QueryError,
};
use thiserror::Error;

/// Result type for evaluation operations
pub type EvalResult<T> = Result<T, EvalError>;

/// Errors raised while applying context to, or evaluating, a query tree
#[derive(Debug, Error, Clone)]
pub enum EvalError {
    /// Malformed query shape, fatal to the whole query
    #[error("{message}")]
    Syntax { code: ErrorCode, message: String },

    /// Operands of incompatible kinds
    #[error("Type mismatch for {operator}: {left} and {right}")]
    TypeMismatch {
        operator: String,
        left: String,
        right: String,
    },

    /// Null reached an operator that does not accept it
    #[error("Null operand not allowed for {operator}")]
    NullOperand { operator: String },

    /// Operator with no defined evaluation
    #[error("Unsupported operator: {operator} for types {types}")]
    UnsupportedOperator { operator: String, types: String },

    /// Tree built with an empty chain or a mismatched operator list
    #[error("Internal error: factor has no type ({node})")]
    MalformedTree { node: String },

    #[error("{function} expects {expected} argument(s), found {found}")]
    ArgumentCount {
        function: String,
        expected: String,
        found: usize,
    },

    #[error("{function} expects {expected}, found {found}")]
    ArgumentType {
        function: String,
        expected: String,
        found: String,
    },

    #[error("Arithmetic overflow in {operation}")]
    Overflow { operation: String },

    #[error("Index {index} out of bounds for array of length {length}")]
    IndexOutOfBounds { index: usize, length: usize },

    #[error("Invalid symbolic constant #'{constant}' for {class}.{property}: {reason}")]
    InvalidSymbolicConstant {
        class: String,
        property: String,
        constant: String,
        reason: String,
    },

    #[error("Qualifier {qualifier} not found on {class}.{property}")]
    QualifierNotFound {
        qualifier: String,
        class: String,
        property: String,
    },

    #[error("Cannot convert {value} to {to_type}")]
    ConversionError { value: String, to_type: String },

    #[error("Invalid LIKE pattern: {pattern}")]
    InvalidPattern { pattern: String },

    /// Property absent from both the instance and the class schema
    #[error("Property {property} not found on class {class}")]
    PropertyNotFound { property: String, class: String },

    #[error("Class {class} not found")]
    ClassNotFound { class: String },
}

impl EvalError {
    /// Create a syntax error with a `CIMQL00xx` code
    pub fn syntax(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Syntax {
            code,
            message: message.into(),
        }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(
        operator: impl Into<String>,
        left: impl Into<String>,
        right: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            operator: operator.into(),
            left: left.into(),
            right: right.into(),
        }
    }

    /// Create a null operand error
    pub fn null_operand(operator: impl Into<String>) -> Self {
        Self::NullOperand {
            operator: operator.into(),
        }
    }

    /// Create an unsupported operator error
    pub fn unsupported_operator(operator: impl Into<String>, types: impl Into<String>) -> Self {
        Self::UnsupportedOperator {
            operator: operator.into(),
            types: types.into(),
        }
    }

    pub fn malformed(node: impl Into<String>) -> Self {
        Self::MalformedTree { node: node.into() }
    }

    pub fn argument_type(
        function: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::ArgumentType {
            function: function.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn overflow(operation: impl Into<String>) -> Self {
        Self::Overflow {
            operation: operation.into(),
        }
    }

    pub fn conversion(value: impl Into<String>, to_type: impl Into<String>) -> Self {
        Self::ConversionError {
            value: value.into(),
            to_type: to_type.into(),
        }
    }

    pub fn invalid_constant(
        class: impl Into<String>,
        property: impl Into<String>,
        constant: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidSymbolicConstant {
            class: class.into(),
            property: property.into(),
            constant: constant.into(),
            reason: reason.into(),
        }
    }

    pub fn property_not_found(property: impl Into<String>, class: impl Into<String>) -> Self {
        Self::PropertyNotFound {
            property: property.into(),
            class: class.into(),
        }
    }

    /// Structured error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Syntax { code, .. } => *code,
            Self::TypeMismatch { .. } => CIMQL0100,
            Self::NullOperand { .. } => CIMQL0101,
            Self::UnsupportedOperator { .. } => CIMQL0102,
            Self::MalformedTree { .. } => CIMQL0103,
            Self::ArgumentCount { .. } => CIMQL0104,
            Self::ArgumentType { .. } => CIMQL0105,
            Self::Overflow { .. } => CIMQL0106,
            Self::IndexOutOfBounds { .. } => CIMQL0107,
            Self::InvalidSymbolicConstant { .. } => CIMQL0108,
            Self::QualifierNotFound { .. } => CIMQL0109,
            Self::ConversionError { .. } => CIMQL0110,
            Self::InvalidPattern { .. } => CIMQL0111,
            Self::PropertyNotFound { .. } => CIMQL0200,
            Self::ClassNotFound { .. } => CIMQL0201,
        }
    }

    /// Error kind callers match on
    pub fn kind(&self) -> ErrorKind {
        self.code().kind()
    }

    /// Whether the error rejects the query rather than one candidate
    ///
    /// A malformed tree carries a runtime code but is just as broken for
    /// every other candidate, so it is fatal too.
    pub fn is_query_fatal(&self) -> bool {
        matches!(self, Self::MalformedTree { .. }) || self.kind().is_query_fatal()
    }
}

impl From<QueryError> for EvalError {
    fn from(err: QueryError) -> Self {
        match err.kind() {
            ErrorKind::Syntax => Self::syntax(err.code(), err.message()),
            _ => Self::conversion(err.message(), "query value"),
        }
    }
}

impl From<EvalError> for QueryError {
    fn from(err: EvalError) -> Self {
        ErrorBuilder::new(err.code(), err.to_string()).build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cimql_diagnostics::CIMQL0002;

    #[test]
    fn test_kinds_follow_codes() {
        assert_eq!(EvalError::null_operand("=").kind(), ErrorKind::Runtime);
        assert_eq!(EvalError::malformed("Term").code(), CIMQL0103);
        assert_eq!(
            EvalError::property_not_found("Size", "CIM_Disk").kind(),
            ErrorKind::NotFound
        );
        assert!(EvalError::syntax(CIMQL0002, "no partner").is_query_fatal());
    }

    #[test]
    fn test_query_fatal_errors() {
        let malformed = EvalError::malformed("Predicate");
        assert_eq!(malformed.kind(), ErrorKind::Runtime);
        assert!(malformed.is_query_fatal());
        assert!(!EvalError::null_operand("=").is_query_fatal());
        assert!(!EvalError::property_not_found("Size", "CIM_Disk").is_query_fatal());
    }

    #[test]
    fn test_into_query_error() {
        let err: QueryError = EvalError::type_mismatch("<", "String", "Uint64").into();
        assert_eq!(err.kind(), ErrorKind::Runtime);
        assert_eq!(err.code(), CIMQL0100);
        assert_eq!(err.message(), "Type mismatch for <: String and Uint64");
    }

    #[test]
    fn test_malformed_message() {
        assert_eq!(
            EvalError::malformed("Term").to_string(),
            "Internal error: factor has no type (Term)"
        );
    }
}
