//! CIM Query Language type system
//!
//! This crate defines the data the evaluator works over:
//! - The CIM object model (classes, instances, typed property values)
//! - Object paths and CIM datetime values
//! - Identifiers and property chains
//! - [`CqlValue`], the normalized runtime value used during evaluation

pub mod cim;
pub mod datetime;
pub mod identifier;
pub mod path;
pub mod value;

pub use cim::*;
pub use datetime::CimDateTime;
pub use identifier::{ChainedIdentifier, Identifier};
pub use path::{KeyBinding, KeyValue, ObjectPath};
pub use value::*;
