//! Integration tests for the matcher
//!
//! Tests depth modes, unification across siblings, seeded environments,
//! and visit accounting on a small Go file.

use clql_engine::{Binding, BindingEnvironment, MatchConfig, Matcher, PartialMatch, PatternId};
use clql_facts::FactId;
use clql_foundation::{TraversalLimit, Value};

use crate::{compile, messages};

fn run(body: &str, config: &MatchConfig) -> Vec<PartialMatch> {
    let tree = messages();
    let query = compile(body);
    Matcher::new(&tree, &query.trees[0], config).collect()
}

fn captured(matches: &[PartialMatch], name: &str) -> Vec<Value> {
    matches
        .iter()
        .filter_map(|m| m.env.value(name).cloned())
        .collect()
}

// =============================================================================
// Depth
// =============================================================================

#[test]
fn direct_children_only() {
    let config = MatchConfig::default();
    assert!(run("go.file:\n  go.call_expr\n", &config).is_empty());
    assert_eq!(run("go.file:\n  go.func_decl\n", &config).len(), 2);
}

#[test]
fn any_finds_every_descendant_in_order() {
    let matches = run(
        "go.file:\n  go.call_expr(depth = any):\n    callee as c\n",
        &MatchConfig::default(),
    );
    assert_eq!(
        captured(&matches, "c"),
        vec![Value::from("readMsg"), Value::from("panic")]
    );
}

#[test]
fn bounded_depth_counts_levels_below_the_scope() {
    let config = MatchConfig::default();
    let one = run(
        "go.func_decl(depth = any):\n  go.call_expr(depth = 1)\n",
        &config,
    );
    let two = run(
        "go.func_decl(depth = any):\n  go.call_expr(depth = 2)\n",
        &config,
    );
    assert!(one.is_empty());
    assert_eq!(two.len(), 2);
}

#[test]
fn depth_ceiling_only_limits_any() {
    let config = MatchConfig::default().with_max_depth(1);
    let tree = messages();

    let query = compile("go.file:\n  go.call_expr(depth = any)\n");
    let mut matcher = Matcher::new(&tree, &query.trees[0], &config);
    assert!(matcher.next().is_none());
    assert!(matches!(
        matcher.limits().as_slice(),
        [TraversalLimit::DepthCeiling { limit: 1, .. }]
    ));

    let query = compile("go.file:\n  go.call_expr(depth = 3)\n");
    let mut matcher = Matcher::new(&tree, &query.trees[0], &config);
    assert!(matcher.next().is_some());
}

// =============================================================================
// Bindings
// =============================================================================

#[test]
fn captures_unify_across_sibling_branches() {
    let matches = run(
        "go.file:\n  go.func_decl:\n    name as f\n  go.call_expr(depth = any):\n    callee == $f\n",
        &MatchConfig::default(),
    );
    assert_eq!(matches.len(), 1);
    assert_eq!(captured(&matches, "f"), vec![Value::from("readMsg")]);
    assert_eq!(matches[0].fact_for(PatternId(1)), Some(FactId::new(5)));
    assert_eq!(matches[0].fact_for(PatternId(2)), Some(FactId::new(3)));
}

#[test]
fn seeded_environment_constrains_captures() {
    let tree = messages();
    let query = compile("go.call_expr:\n  callee as target\n");
    let config = MatchConfig::default();
    let seed = BindingEnvironment::new().extend(
        "target",
        Binding::new(Value::from("panic"), FactId::new(0), "seed"),
    );

    let root = &query.trees[0].root;
    assert_eq!(
        Matcher::at(&tree, root, &config, FactId::new(3), seed.clone()).count(),
        0
    );

    let found: Vec<_> = Matcher::at(&tree, root, &config, FactId::new(4), seed).collect();
    assert_eq!(found.len(), 1);
    let binding = found[0].env.get("target").unwrap();
    assert_eq!(binding.fact, FactId::new(0));
    assert_eq!(binding.attribute, "seed");
}

#[test]
fn matched_nodes_follow_pattern_order() {
    let matches = run(
        "go.func_decl(depth = any):\n  go.block_stmt:\n    go.call_expr:\n      callee == \"panic\"\n",
        &MatchConfig::default(),
    );
    assert_eq!(matches.len(), 1);
    let facts: Vec<FactId> = matches[0].matched.iter().map(|m| m.fact).collect();
    assert_eq!(facts, vec![FactId::new(1), FactId::new(2), FactId::new(4)]);
}

// =============================================================================
// Limits
// =============================================================================

#[test]
fn visit_budget_stops_the_search() {
    let tree = messages();
    let query = compile("go.call_expr(depth = any)\n");
    let config = MatchConfig::unbounded().with_visit_budget(3);
    let mut matcher = Matcher::new(&tree, &query.trees[0], &config);
    while matcher.next().is_some() {}
    assert!(matcher.visits() <= 3);
    assert_eq!(
        matcher.limits(),
        vec![TraversalLimit::VisitBudget { limit: 3 }]
    );
}

#[test]
fn unbounded_search_counts_every_visit() {
    let tree = messages();
    let query = compile("go.call_expr(depth = any)\n");
    let config = MatchConfig::unbounded();
    let mut matcher = Matcher::new(&tree, &query.trees[0], &config);
    assert_eq!(matcher.by_ref().count(), 2);
    assert!(matcher.limits().is_empty());
    assert_eq!(matcher.visits(), tree.len() as u64);
}
