//! Query execution.
//!
//! This module provides:
//! - [`QueryExecutor`] - Runs a compiled query against one or many fact trees
//! - [`run`] - Compile-and-execute convenience for a single tree

use clql_facts::FactTree;
use clql_foundation::Result;
use clql_language::Namespaces;
use rayon::prelude::*;
use tracing::debug;

use crate::collector::{MatchCollector, QueryOutcome};
use crate::compiler::QueryCompiler;
use crate::config::MatchConfig;
use crate::matcher::Matcher;
use crate::pattern::CompiledQuery;

// =============================================================================
// Query Executor
// =============================================================================

/// Executes compiled queries against fact trees.
pub struct QueryExecutor;

impl QueryExecutor {
    /// Runs every pattern tree of `query` against `tree`, in source order.
    ///
    /// # Errors
    ///
    /// Returns `LimitExceeded` if a limit is hit and `config.strict_limits`
    /// is set. Otherwise limit hits are reported on the outcome.
    pub fn execute(
        query: &CompiledQuery,
        tree: &FactTree,
        config: &MatchConfig,
    ) -> Result<QueryOutcome> {
        debug!(trees = query.len(), facts = tree.len(), "executing query");

        let mut collector = MatchCollector::new(config);
        for (index, pattern) in query.iter().enumerate() {
            let matcher = Matcher::new(tree, pattern, config);
            if !collector.collect(index, pattern, tree, matcher) {
                break;
            }
        }

        let outcome = collector.finish()?;
        debug!(
            results = outcome.len(),
            limits = outcome.limits.len(),
            "query finished"
        );
        Ok(outcome)
    }

    /// Runs `query` against independent fact trees in parallel.
    ///
    /// Outcomes are returned in the same order as `trees`.
    ///
    /// # Errors
    ///
    /// Returns the first error from [`QueryExecutor::execute`].
    pub fn execute_many(
        query: &CompiledQuery,
        trees: &[FactTree],
        config: &MatchConfig,
    ) -> Result<Vec<QueryOutcome>> {
        debug!(fact_trees = trees.len(), "executing query in parallel");
        trees
            .par_iter()
            .map(|tree| Self::execute(query, tree, config))
            .collect()
    }
}

/// Compiles `source` with every lexicon allowed and runs it against `tree`
/// with the default configuration.
///
/// # Errors
///
/// Returns a `ParseError` if the query does not compile, or
/// `LimitExceeded` under strict limits.
pub fn run(source: &str, tree: &FactTree) -> Result<QueryOutcome> {
    let query = QueryCompiler::compile(source, &Namespaces::open())?;
    QueryExecutor::execute(&query, tree, &MatchConfig::default())
}
