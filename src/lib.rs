//! CLQL - CodeLingo Query Language
//!
//! This crate re-exports all layers of the CLQL system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 3: clql_engine      Compilation, backtracking matcher, collection
//! Layer 2: clql_language    Lexer, parser, import resolution
//! Layer 1: clql_facts       Fact nodes and flattened fact trees
//! Layer 0: clql_foundation  Core types (Value, Error, persistent collections)
//! ```
//!
//! # Example
//!
//! ```
//! use clql::facts::{FactNode, FactTree};
//!
//! let tree = FactTree::from_root(
//!     FactNode::new("go.file")
//!         .with_child(FactNode::new("go.func_decl").with_attr("name", "writeMsg"))
//!         .with_child(FactNode::new("go.func_decl").with_attr("name", "readMsg")),
//! );
//!
//! let outcome = clql::engine::run(
//!     "import codelingo/ast/go\n\
//!      go.file:\n  \
//!        @review comment\n  \
//!        go.func_decl:\n    \
//!          name as funcName, regex(/.*Msg$/, funcName)\n",
//!     &tree,
//! )
//! .unwrap();
//! assert_eq!(outcome.len(), 2);
//! ```

pub use clql_engine as engine;
pub use clql_facts as facts;
pub use clql_foundation as foundation;
pub use clql_language as language;
