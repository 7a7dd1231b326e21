//! Operator implementations over resolved values
//!
//! - Comparison (`=`, `<>`, `<`, `<=`, `>`, `>=`)
//! - Arithmetic (`+`, `||`, factor inversion)
//! - LIKE pattern matching

pub mod arithmetic;
pub mod comparison;
pub mod like;

pub use arithmetic::*;
pub use comparison::*;
pub use like::*;
