//! Fact nodes and flattened fact trees for CLQL.
//!
//! Lexicons hand over a nested [`FactNode`]; the matcher works on a
//! [`FactTree`], an immutable pre-order arena built from it.
//!
//! This crate provides:
//! - [`FactId`] - Pre-order index of a node within its tree
//! - [`FactNode`] - The owned, nested shape produced by lexicons
//! - [`FactTree`] - Flattened, read-only arena with subtree ranges

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod id;
pub mod node;
pub mod tree;

pub use id::FactId;
pub use node::FactNode;
pub use tree::{Fact, FactTree};
