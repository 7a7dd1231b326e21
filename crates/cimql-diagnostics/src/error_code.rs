//! Query error codes following a structured numbering system
//!
//! Error code ranges:
//! - CIMQL0001-CIMQL0099: Syntax errors (malformed query trees, scoping)
//! - CIMQL0100-CIMQL0199: Runtime errors (typing, null operands, functions)
//! - CIMQL0200-CIMQL0299: Not-found errors (properties, classes)
//! - CIMQL0400-CIMQL0499: System errors (I/O, documents)

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The class of an error, used by callers to decide how far a failure reaches.
///
/// Syntax errors reject the whole query, runtime and not-found errors are
/// scoped to the candidate being evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The query itself is malformed
    Syntax,
    /// Evaluation against a candidate failed
    Runtime,
    /// A referenced property, segment or class does not exist
    NotFound,
    /// Environment failure outside the evaluator
    System,
}

impl ErrorKind {
    /// Whether an error of this kind invalidates the query for every candidate
    pub const fn is_query_fatal(&self) -> bool {
        matches!(self, Self::Syntax | Self::System)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Syntax => write!(f, "syntax error"),
            ErrorKind::Runtime => write!(f, "runtime error"),
            ErrorKind::NotFound => write!(f, "not found"),
            ErrorKind::System => write!(f, "system error"),
        }
    }
}

/// Error code identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode(u16);

impl ErrorCode {
    /// Create a new error code
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Get the numeric code
    pub const fn code(&self) -> u16 {
        self.0
    }

    /// Get error information for this code
    pub fn info(&self) -> &'static ErrorInfo {
        ERROR_INFO.get(&self.0).unwrap_or(&UNKNOWN_ERROR)
    }

    /// The error kind implied by the code range
    pub const fn kind(&self) -> ErrorKind {
        match self.0 {
            1..=99 => ErrorKind::Syntax,
            100..=199 => ErrorKind::Runtime,
            200..=299 => ErrorKind::NotFound,
            _ => ErrorKind::System,
        }
    }

    /// Check if this is a syntax error (0001-0099)
    pub const fn is_syntax_error(&self) -> bool {
        self.0 >= 1 && self.0 < 100
    }

    /// Check if this is a runtime error (0100-0199)
    pub const fn is_runtime_error(&self) -> bool {
        self.0 >= 100 && self.0 < 200
    }

    /// Check if this is a not-found error (0200-0299)
    pub const fn is_not_found_error(&self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Check if this is a system error (0400-0499)
    pub const fn is_system_error(&self) -> bool {
        self.0 >= 400 && self.0 < 500
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CIMQL{:04}", self.0)
    }
}

/// Information about an error code
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Short description of the error
    pub description: &'static str,
    /// Detailed help text
    pub help: Option<&'static str>,
}

impl ErrorInfo {
    const fn new(description: &'static str) -> Self {
        Self {
            description,
            help: None,
        }
    }

    const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

static UNKNOWN_ERROR: ErrorInfo = ErrorInfo::new("Unknown error");

static ERROR_INFO: Lazy<HashMap<u16, ErrorInfo>> = Lazy::new(|| {
    let mut map = HashMap::new();

    // Syntax errors (0001-0099)
    map.insert(1, ErrorInfo::new("Unsupported function"));
    map.insert(
        2,
        ErrorInfo::new("Standalone symbolic constant with no valid scoping partner").with_help(
            "Compare the constant against a property, e.g. Status = #'OK'",
        ),
    );
    map.insert(3, ErrorInfo::new("Operand is not a simple value"));
    map.insert(
        4,
        ErrorInfo::new("LIKE pattern is not a literal")
            .with_help("The right side of LIKE must be a string literal"),
    );
    map.insert(5, ErrorInfo::new("Empty chained identifier"));
    map.insert(6, ErrorInfo::new("Illegal chained identifier"));
    map.insert(7, ErrorInfo::new("Symbolic constant must be the last element"));
    map.insert(8, ErrorInfo::new("Wildcard not allowed in WHERE clause"));
    map.insert(9, ErrorInfo::new("Wildcard must be the last element"));
    map.insert(
        10,
        ErrorInfo::new("Embedded property must be scoped")
            .with_help("Use the scope operator, e.g. Obj.CIM_Sub::Prop"),
    );
    map.insert(11, ErrorInfo::new("Select list must name a property"));
    map.insert(12, ErrorInfo::new("Invalid element in select list"));
    map.insert(13, ErrorInfo::new("Invalid datetime literal"));
    map.insert(14, ErrorInfo::new("Invalid object path"));
    map.insert(15, ErrorInfo::new("Query has no FROM class"));

    // Runtime errors (0100-0199)
    map.insert(100, ErrorInfo::new("Type mismatch"));
    map.insert(
        101,
        ErrorInfo::new("Null operand").with_help("Test for null with IS NULL or IS NOT NULL"),
    );
    map.insert(102, ErrorInfo::new("Unsupported operator"));
    map.insert(103, ErrorInfo::new("Malformed query tree"));
    map.insert(104, ErrorInfo::new("Invalid argument count"));
    map.insert(105, ErrorInfo::new("Invalid argument type"));
    map.insert(106, ErrorInfo::new("Arithmetic overflow"));
    map.insert(107, ErrorInfo::new("Array index out of range"));
    map.insert(108, ErrorInfo::new("Invalid symbolic constant"));
    map.insert(109, ErrorInfo::new("Required qualifier not found"));
    map.insert(110, ErrorInfo::new("Conversion failed"));
    map.insert(111, ErrorInfo::new("Invalid LIKE pattern"));

    // Not-found errors (0200-0299)
    map.insert(200, ErrorInfo::new("Property not found"));
    map.insert(201, ErrorInfo::new("Class not found"));

    // System errors (0400-0499)
    map.insert(400, ErrorInfo::new("I/O error"));
    map.insert(401, ErrorInfo::new("Invalid document"));

    map
});

// Syntax errors
pub const CIMQL0001: ErrorCode = ErrorCode::new(1);
pub const CIMQL0002: ErrorCode = ErrorCode::new(2);
pub const CIMQL0003: ErrorCode = ErrorCode::new(3);
pub const CIMQL0004: ErrorCode = ErrorCode::new(4);
pub const CIMQL0005: ErrorCode = ErrorCode::new(5);
pub const CIMQL0006: ErrorCode = ErrorCode::new(6);
pub const CIMQL0007: ErrorCode = ErrorCode::new(7);
pub const CIMQL0008: ErrorCode = ErrorCode::new(8);
pub const CIMQL0009: ErrorCode = ErrorCode::new(9);
pub const CIMQL0010: ErrorCode = ErrorCode::new(10);
pub const CIMQL0011: ErrorCode = ErrorCode::new(11);
pub const CIMQL0012: ErrorCode = ErrorCode::new(12);
pub const CIMQL0013: ErrorCode = ErrorCode::new(13);
pub const CIMQL0014: ErrorCode = ErrorCode::new(14);
pub const CIMQL0015: ErrorCode = ErrorCode::new(15);

// Runtime errors
pub const CIMQL0100: ErrorCode = ErrorCode::new(100);
pub const CIMQL0101: ErrorCode = ErrorCode::new(101);
pub const CIMQL0102: ErrorCode = ErrorCode::new(102);
pub const CIMQL0103: ErrorCode = ErrorCode::new(103);
pub const CIMQL0104: ErrorCode = ErrorCode::new(104);
pub const CIMQL0105: ErrorCode = ErrorCode::new(105);
pub const CIMQL0106: ErrorCode = ErrorCode::new(106);
pub const CIMQL0107: ErrorCode = ErrorCode::new(107);
pub const CIMQL0108: ErrorCode = ErrorCode::new(108);
pub const CIMQL0109: ErrorCode = ErrorCode::new(109);
pub const CIMQL0110: ErrorCode = ErrorCode::new(110);
pub const CIMQL0111: ErrorCode = ErrorCode::new(111);

// Not-found errors
pub const CIMQL0200: ErrorCode = ErrorCode::new(200);
pub const CIMQL0201: ErrorCode = ErrorCode::new(201);

// System errors
pub const CIMQL0400: ErrorCode = ErrorCode::new(400);
pub const CIMQL0401: ErrorCode = ErrorCode::new(401);
