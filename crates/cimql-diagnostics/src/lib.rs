//! CIM Query Language diagnostics and error handling
//!
//! This crate provides the error infrastructure shared by the query crates:
//! the [`ErrorKind`] taxonomy callers match on, structured error codes, and
//! diagnostic reporting.

mod error;
mod error_code;

pub use error::*;
pub use error_code::*;

/// Result type for query operations
pub type Result<T> = std::result::Result<T, QueryError>;
