//! Traversal limits
//!
//! Tests that result caps, visit budgets, and depth ceilings stop the
//! search, are reported on lenient outcomes, and fail strict ones.

use clql::engine::{MatchConfig, QueryExecutor};
use clql::facts::{FactNode, FactTree};
use clql::foundation::{ErrorKind, TraversalLimit};

use crate::{compile, run, run_with};

fn functions(count: usize) -> FactTree {
    FactTree::from_root(FactNode::new("go.file").with_children((0..count).map(|i| {
        FactNode::new("go.func_decl")
            .with_attr("name", format!("f{i}"))
            .with_child(
                FactNode::new("go.block_stmt").with_children(
                    (0..4).map(|c| FactNode::new("go.call_expr").with_attr("callee", format!("g{c}"))),
                ),
            )
    })))
}

fn chain(levels: usize) -> FactTree {
    let mut node = FactNode::new("go.ident").with_attr("name", "deep");
    for _ in 0..levels {
        node = FactNode::new("go.block_stmt").with_child(node);
    }
    FactTree::from_root(FactNode::new("go.file").with_child(node))
}

const ALL_FUNCS: &str = "import codelingo/ast/go\ngo.func_decl(depth = any):\n  name as n\n";

// =============================================================================
// Result Cap
// =============================================================================

#[test]
fn result_cap_truncates_and_reports() {
    let config = MatchConfig::default().with_max_results(2);
    let outcome = run_with(ALL_FUNCS, &functions(5), &config);
    assert_eq!(outcome.len(), 2);
    assert_eq!(outcome.limits, vec![TraversalLimit::MaxResults { limit: 2 }]);
    assert!(outcome.hit_limit());
}

#[test]
fn result_cap_reached_exactly_is_not_a_hit() {
    let config = MatchConfig::default().with_max_results(5);
    let outcome = run_with(ALL_FUNCS, &functions(5), &config);
    assert_eq!(outcome.len(), 5);
    assert!(!outcome.hit_limit());
}

#[test]
fn strict_result_cap_fails_the_query() {
    let config = MatchConfig::default()
        .with_max_results(2)
        .with_strict_limits(true);
    let err = QueryExecutor::execute(&compile(ALL_FUNCS), &functions(5), &config).unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::LimitExceeded(TraversalLimit::MaxResults { limit: 2 })
    ));
}

// =============================================================================
// Visit Budget
// =============================================================================

#[test]
fn visit_budget_covers_excluded_searches() {
    let query = "\
import codelingo/ast/go
go.func_decl(depth = any):
  exclude:
    go.call_expr(depth = any):
      callee == \"panic\"
";
    let tree = functions(50);
    assert_eq!(run(query, &tree).len(), 50);

    let config = MatchConfig::unbounded().with_visit_budget(40);
    let outcome = run_with(query, &tree, &config);
    assert!(outcome.len() < 50);
    assert_eq!(outcome.limits, vec![TraversalLimit::VisitBudget { limit: 40 }]);
}

#[test]
fn strict_visit_budget_fails_the_query() {
    let config = MatchConfig::unbounded()
        .with_visit_budget(10)
        .with_strict_limits(true);
    let err = QueryExecutor::execute(&compile(ALL_FUNCS), &functions(20), &config).unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::LimitExceeded(TraversalLimit::VisitBudget { limit: 10 })
    ));
}

// =============================================================================
// Depth
// =============================================================================

const DEEP: &str = "import codelingo/ast/go\ngo.file:\n  go.ident(depth = any):\n    name as n\n";

#[test]
fn deep_chains_match_without_recursion() {
    let outcome = run(DEEP, &chain(50_000));
    assert_eq!(outcome.len(), 1);
}

#[test]
fn depth_ceiling_hides_deep_facts() {
    let config = MatchConfig::default().with_max_depth(100);
    let outcome = run_with(DEEP, &chain(500), &config);
    assert!(outcome.is_empty());
    assert!(matches!(
        outcome.limits.as_slice(),
        [TraversalLimit::DepthCeiling { limit: 100, .. }]
    ));

    let shallow = run_with(DEEP, &chain(50), &config);
    assert_eq!(shallow.len(), 1);
    assert!(shallow.limits.is_empty());
}

#[test]
fn explicit_depth_ignores_the_ceiling() {
    let config = MatchConfig::default().with_max_depth(10);
    let outcome = run_with(
        "import codelingo/ast/go\ngo.file:\n  go.ident(depth = 600):\n    name as n\n",
        &chain(500),
        &config,
    );
    assert_eq!(outcome.len(), 1);
    assert!(outcome.limits.is_empty());
}

// =============================================================================
// Many Trees
// =============================================================================

#[test]
fn limits_are_per_tree() {
    let trees = vec![functions(1), functions(6), functions(2)];
    let config = MatchConfig::default().with_max_results(3);
    let outcomes = QueryExecutor::execute_many(&compile(ALL_FUNCS), &trees, &config).unwrap();
    let counts: Vec<usize> = outcomes.iter().map(|o| o.len()).collect();
    assert_eq!(counts, vec![1, 3, 2]);
    let hits: Vec<bool> = outcomes.iter().map(|o| o.hit_limit()).collect();
    assert_eq!(hits, vec![false, true, false]);
}

#[test]
fn guarded_config_is_quiet_on_ordinary_trees() {
    let outcome = run_with(ALL_FUNCS, &functions(30), &MatchConfig::guarded());
    assert_eq!(outcome.len(), 30);
    assert!(outcome.limits.is_empty());
}
