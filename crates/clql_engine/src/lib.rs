//! Pattern compilation, matching, and result collection for CLQL.
//!
//! This crate provides:
//! - [`QueryCompiler`] - Validates a parsed query and lowers it into [`PatternTree`]s
//! - [`Matcher`] - Lazy backtracking search over a [`FactTree`](clql_facts::FactTree)
//! - [`MatchCollector`] - Anchors, resolved bindings, and limit hits per fact tree
//! - [`QueryExecutor`] - Runs compiled queries against one or many fact trees
//! - [`Explainer`] - Reports why a pattern does not match at a given fact

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod bindings;
pub mod collector;
pub mod compiler;
pub mod config;
pub mod explain;
pub mod matcher;
pub mod pattern;
pub mod query;

pub use bindings::{Binding, BindingEnvironment};
pub use collector::{MatchCollector, MatchResult, QueryOutcome};
pub use compiler::QueryCompiler;
pub use config::MatchConfig;
pub use explain::{Explainer, Explanation, Reason};
pub use matcher::{MatchedNode, Matcher, PartialMatch};
pub use pattern::{
    Annotation, CompiledQuery, Declaration, DepthMode, Operand, PatternId, PatternNode,
    PatternTree, Predicate,
};
pub use query::{QueryExecutor, run};
