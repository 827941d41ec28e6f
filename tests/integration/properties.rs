//! Property tests
//!
//! Checks matcher behaviour against brute-force counts over generated
//! fact trees.

use clql::engine::MatchConfig;
use clql::facts::{FactId, FactNode, FactTree};
use proptest::prelude::*;

use crate::run;

fn arb_node() -> impl Strategy<Value = FactNode> {
    let leaf = ("[a-c]", 0..4_i64)
        .prop_map(|(k, v)| FactNode::new(format!("go.{k}")).with_attr("value", v));
    leaf.prop_recursive(5, 48, 4, |inner| {
        ("[a-c]", 0..4_i64, prop::collection::vec(inner, 0..4)).prop_map(|(k, v, children)| {
            FactNode::new(format!("go.{k}"))
                .with_attr("value", v)
                .with_children(children)
        })
    })
}

fn ids_of<'a>(tree: &'a FactTree, kind: &'a str) -> impl Iterator<Item = FactId> + 'a {
    tree.iter()
        .filter(move |(_, fact)| fact.kind() == kind)
        .map(|(id, _)| id)
}

/// Wraps `inner` in `levels` block statements below a file.
fn nested(levels: usize, inner: FactNode) -> FactTree {
    let mut node = inner;
    for _ in 0..levels {
        node = FactNode::new("go.block_stmt").with_child(node);
    }
    FactTree::from_root(FactNode::new("go.file").with_child(node))
}

fn target() -> FactNode {
    FactNode::new("go.ident").with_attr("name", "target")
}

fn noise(width: usize) -> impl Iterator<Item = FactNode> {
    (0..width).map(|i| {
        FactNode::new("go.comment")
            .with_attr("text", format!("c{i}"))
            .with_child(FactNode::new("go.ident").with_attr("name", "other"))
    })
}

const FIND_TARGET: &str = "\
import codelingo/ast/go
go.file:
  go.ident(depth = any):
    name == \"target\"
";

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn any_counts_every_ancestor_descendant_pair(root in arb_node()) {
        let tree = FactTree::from_root(root);
        let facts = &tree;
        let expected = ids_of(facts, "go.a")
            .flat_map(|a| ids_of(facts, "go.b").map(move |b| (a, b)))
            .filter(|&(a, b)| tree.is_descendant(a, b))
            .count();
        let outcome = run(
            "import codelingo/ast/go\ngo.a(depth = any):\n  go.b(depth = any)\n",
            &tree,
        );
        prop_assert_eq!(outcome.len(), expected);
    }

    #[test]
    fn direct_counts_parent_child_pairs(root in arb_node()) {
        let tree = FactTree::from_root(root);
        let expected = ids_of(&tree, "go.b")
            .filter(|&b| tree.parent(b).is_some_and(|p| tree.kind(p) == "go.a"))
            .count();
        let outcome = run(
            "import codelingo/ast/go\ngo.a(depth = any):\n  go.b\n",
            &tree,
        );
        prop_assert_eq!(outcome.len(), expected);
    }

    #[test]
    fn direct_never_reaches_below_one_level(levels in 1_usize..8) {
        let tree = nested(levels, target());
        let direct = "import codelingo/ast/go\ngo.file:\n  go.ident:\n    name == \"target\"\n";
        prop_assert!(run(direct, &tree).is_empty());
        prop_assert_eq!(run(FIND_TARGET, &tree).len(), 1);
    }

    #[test]
    fn irrelevant_siblings_do_not_change_the_count(levels in 0_usize..6, width in 0_usize..12) {
        let bare = nested(levels, target());
        let crowded = FactTree::from_root(
            FactNode::new("go.file")
                .with_children(noise(width))
                .with_child(
                    (0..levels).fold(target(), |node, _| {
                        FactNode::new("go.block_stmt").with_child(node)
                    }),
                )
                .with_children(noise(width)),
        );
        prop_assert_eq!(run(FIND_TARGET, &bare).len(), 1);
        prop_assert_eq!(run(FIND_TARGET, &crowded).len(), 1);
    }

    #[test]
    fn exclude_tracks_the_disqualifying_fact(
        calls in prop::collection::vec("[a-e]{1,3}", 0..6),
        position in 0_usize..6,
    ) {
        let query = "\
import codelingo/ast/go
go.func_decl:
  exclude:
    go.call_expr(depth = any):
      callee == \"panic\"
";
        let body = |with_panic: bool| {
            let mut names = calls.clone();
            if with_panic {
                names.insert(position.min(names.len()), "panic".to_string());
            }
            FactTree::from_root(
                FactNode::new("go.func_decl").with_child(
                    FactNode::new("go.block_stmt").with_children(
                        names
                            .into_iter()
                            .map(|n| FactNode::new("go.call_expr").with_attr("callee", n)),
                    ),
                ),
            )
        };
        prop_assert_eq!(run(query, &body(false)).len(), 1);
        prop_assert!(run(query, &body(true)).is_empty());
    }

    #[test]
    fn sibling_unification_counts_equal_pairs(
        consts in prop::collection::vec(0..4_i64, 0..5),
        vars in prop::collection::vec(0..4_i64, 0..5),
    ) {
        let tree = FactTree::from_root(
            FactNode::new("go.file")
                .with_children(consts.iter().map(|v| FactNode::new("go.const").with_attr("value", *v)))
                .with_children(vars.iter().map(|v| FactNode::new("go.var").with_attr("value", *v))),
        );
        let outcome = run(
            "import codelingo/ast/go\ngo.file:\n  go.const:\n    value as x\n  go.var:\n    value == $x\n",
            &tree,
        );
        let expected: Vec<i64> = consts
            .iter()
            .flat_map(|c| vars.iter().filter(move |v| *v == c).map(move |_| *c))
            .collect();
        let found: Vec<i64> = outcome
            .iter()
            .filter_map(|r| r.binding("x").and_then(|v| v.as_int()))
            .collect();
        prop_assert_eq!(found, expected);
    }

    #[test]
    fn matching_is_idempotent(root in arb_node()) {
        let tree = FactTree::from_root(root);
        let query = "\
import codelingo/ast/go
go.a(depth = any):
  value as v
  go.b(depth = any):
    value == $v
  exclude:
    go.c:
      value == $v
";
        let config = MatchConfig::default();
        let first = crate::run_with(query, &tree, &config);
        let second = crate::run_with(query, &tree, &config);
        prop_assert_eq!(first, second);
    }
}
