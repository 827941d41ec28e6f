//! End-to-end tests
//!
//! Tenet-style queries run through the whole stack: source text is parsed,
//! compiled, matched against lexicon fact trees, and collected.

mod limits;
mod properties;

use clql::engine::{CompiledQuery, MatchConfig, QueryCompiler, QueryExecutor, QueryOutcome};
use clql::facts::FactTree;
use clql::language::Namespaces;

/// Lexicons every test query may import.
pub fn namespaces() -> Namespaces {
    Namespaces::with_lexicons(["codelingo/ast/go", "codelingo/ast/java", "codelingo/vcs/git"])
}

/// Compiles `source` against the test lexicons.
pub fn compile(source: &str) -> CompiledQuery {
    match QueryCompiler::compile(source, &namespaces()) {
        Ok(query) => query,
        Err(e) => panic!("query failed to compile: {e}"),
    }
}

/// Compiles and runs `source` with `config`.
pub fn run_with(source: &str, tree: &FactTree, config: &MatchConfig) -> QueryOutcome {
    QueryExecutor::execute(&compile(source), tree, config).expect("lenient limits never fail")
}

/// Compiles and runs `source` with the default configuration.
pub fn run(source: &str, tree: &FactTree) -> QueryOutcome {
    run_with(source, tree, &MatchConfig::default())
}
