//! Integration tests for the parser
//!
//! Tests parsing of CLQL source into the query AST, and error positions.

use clql_foundation::{ParseErrorKind, Value};
use clql_language::{ArgValue, BlockItem, CompareOp, OperandExpr, PredicateExpr, parse};

// =============================================================================
// Structure
// =============================================================================

#[test]
fn parse_race_query() {
    let source = "\
import codelingo/ast/java

@review comment
java.class:
  java.method(depth = any):
    name == \"updateUser\"
    block_start as startUpdate
    block_exit as exitUpdate
  java.method(depth = any):
    name == \"getUser\"
    $startUpdate < block_start < $exitUpdate
";
    let file = parse(source).unwrap();
    assert_eq!(file.imports.len(), 1);
    assert_eq!(file.blocks.len(), 1);

    let class = &file.blocks[0];
    assert_eq!(class.annotations[0].name, "review");
    let methods: Vec<_> = class.children().collect();
    assert_eq!(methods.len(), 2);
    assert_eq!(methods[0].args[0].value, ArgValue::Ident("any".into()));
    assert_eq!(methods[0].predicates().count(), 3);

    match methods[1].predicates().last() {
        Some(PredicateExpr::Compare { operands, ops, .. }) => {
            assert_eq!(ops, &vec![CompareOp::Lt, CompareOp::Lt]);
            assert!(matches!(&operands[0], OperandExpr::Var(name, _) if name == "startUpdate"));
            assert!(matches!(&operands[2], OperandExpr::Var(name, _) if name == "exitUpdate"));
        }
        other => panic!("expected chained comparison, got {other:?}"),
    }
}

#[test]
fn parse_exclude_with_nested_children() {
    let source = "\
go.func_decl:
  exclude:
    go.call_expr(depth = any):
      callee == \"panic\"
    go.defer_stmt
";
    let file = parse(source).unwrap();
    let BlockItem::Exclude { blocks, .. } = &file.blocks[0].items[0] else {
        panic!("expected exclude");
    };
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].predicates().count(), 1);
    assert_eq!(blocks[1].selector.name, "go.defer_stmt");
}

#[test]
fn parse_literal_kinds() {
    let file = parse("go.x:\n  a == true, b == 1, c == 1.5, d == \"s\"\n").unwrap();
    let literals: Vec<Value> = file.blocks[0]
        .predicates()
        .filter_map(|p| match p {
            PredicateExpr::Compare { operands, .. } => match &operands[1] {
                OperandExpr::Literal(value, _) => Some(value.clone()),
                _ => None,
            },
            _ => None,
        })
        .collect();
    assert_eq!(
        literals,
        vec![
            Value::Bool(true),
            Value::Int(1),
            Value::Float(1.5),
            Value::from("s"),
        ]
    );
}

#[test]
fn comments_and_blank_lines_are_ignored() {
    let source = "\
# find functions
import codelingo/ast/go

go.func_decl:   # any function

  # named
  name == \"x\"
";
    let file = parse(source).unwrap();
    assert_eq!(file.blocks[0].predicates().count(), 1);
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn syntax_errors_report_position_and_line() {
    let err = parse("go.file:\n  go.func_decl:\n    name == \n").unwrap_err();
    assert_eq!(err.parse_kind(), Some(ParseErrorKind::Syntax));
    assert_eq!(err.position().map(|(line, _)| line), Some(3));
    assert!(err.to_string().contains("syntax error"));
}

#[test]
fn unclosed_paren_is_syntax_error() {
    let err = parse("go.file(depth = any\n").unwrap_err();
    assert_eq!(err.parse_kind(), Some(ParseErrorKind::Syntax));
}

#[test]
fn bad_indentation_is_syntax_error() {
    let err = parse("go.a:\n    go.b\n  go.c\n").unwrap_err();
    assert_eq!(err.parse_kind(), Some(ParseErrorKind::Syntax));
}
