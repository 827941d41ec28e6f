//! Core scalar values, errors, and persistent collections for CLQL.
//!
//! This crate provides:
//! - [`Value`] - The closed scalar type carried by fact attributes and bindings
//! - [`ScalarType`] - Tag descriptors used in diagnostics
//! - [`Error`] - Rich error types with source locations
//! - Persistent collections ([`PersistentVec`], [`PersistentMap`])

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod collections;
pub mod error;
pub mod types;
pub mod value;

pub use collections::{PersistentMap, PersistentVec};
pub use error::{Error, ErrorContext, ErrorKind, ParseErrorKind, TraversalLimit};
pub use types::ScalarType;
pub use value::Value;

/// Result type alias using the CLQL error type.
pub type Result<T> = std::result::Result<T, Error>;
