//! Integration tests for query compilation
//!
//! Tests that parsed CLQL folds into pattern trees with resolved kinds,
//! depth modes, declarations, and anchors.

use clql_engine::{DepthMode, Operand, PatternId, Predicate, QueryCompiler};
use clql_foundation::{ParseErrorKind, Value};
use clql_language::{CompareOp, Namespaces, parse};

use crate::compile;

const RACE: &str = "\
java.class:
  java.method(depth = any):
    name == \"updateUser\"
    block_start as startUpdate
    block_exit as exitUpdate
  @review comment
  java.method(depth = any):
    name == \"getUser\"
    $startUpdate < block_start < $exitUpdate
";

#[test]
fn compiles_race_tenet() {
    let query = QueryCompiler::compile(
        &format!("import codelingo/ast/java\n{RACE}"),
        &Namespaces::with_lexicons(["codelingo/ast/java"]),
    )
    .unwrap();
    assert_eq!(query.len(), 1);

    let tree = &query.trees[0];
    assert_eq!(tree.size, 3);
    assert_eq!(tree.variables, vec!["startUpdate", "exitUpdate"]);
    assert_eq!(tree.anchor, PatternId(2));

    let getter = tree.anchor_node();
    assert_eq!(getter.kind, "java.method");
    assert_eq!(getter.depth, DepthMode::Any);
    assert_eq!(getter.annotations[0].name, "review");
    assert_eq!(getter.predicates.len(), 3);

    let Predicate::Compare { left, op, right } = &getter.predicates[1] else {
        panic!("expected comparison");
    };
    assert_eq!(left, &Operand::Variable("startUpdate".into()));
    assert_eq!(*op, CompareOp::Lt);
    assert_eq!(right, &Operand::Attribute("block_start".into()));
}

#[test]
fn compile_file_reuses_a_parsed_query() {
    let source = "import codelingo/ast/go\ngo.file:\n  go.func_decl(depth = 3)\n";
    let file = parse(source).unwrap();
    let query = QueryCompiler::compile_file(&file, source, &Namespaces::open()).unwrap();
    assert_eq!(query.trees[0].root.children[0].depth, DepthMode::Bounded(3));
}

#[test]
fn literal_kinds_survive_compilation() {
    let query = compile("go.func_decl:\n  exported == true, arity >= 2, ratio < 0.5\n");
    let literals: Vec<&Value> = query.trees[0]
        .root
        .predicates
        .iter()
        .filter_map(|p| match p {
            Predicate::Compare {
                right: Operand::Literal(value),
                ..
            } => Some(value),
            _ => None,
        })
        .collect();
    assert_eq!(
        literals,
        vec![&Value::Bool(true), &Value::Int(2), &Value::Float(0.5)]
    );
}

#[test]
fn compile_errors_carry_location() {
    let err = QueryCompiler::compile(
        "import codelingo/ast/go\ngo.file:\n  go.func_decl:\n    name == $missing\n",
        &Namespaces::open(),
    )
    .unwrap_err();
    assert_eq!(err.parse_kind(), Some(ParseErrorKind::UndeclaredVariable));
    assert_eq!(err.position().map(|(line, _)| line), Some(4));
}

#[test]
fn conflicting_depth_modifiers() {
    let err = QueryCompiler::compile(
        "import codelingo/ast/go\ngo.func_decl(depth = any, depth = 2)\n",
        &Namespaces::open(),
    )
    .unwrap_err();
    assert_eq!(err.parse_kind(), Some(ParseErrorKind::InvalidDepthSpec));
}

#[test]
fn unimported_namespace_is_rejected() {
    let err = QueryCompiler::compile("import codelingo/ast/go\nphp.class\n", &Namespaces::open())
        .unwrap_err();
    assert_eq!(err.parse_kind(), Some(ParseErrorKind::UnresolvedImport));
}
