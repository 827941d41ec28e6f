//! Integration tests for the lexer
//!
//! Tests indentation tracking and token spans on realistic queries.

use clql_language::{Lexer, TokenKind};
use proptest::prelude::*;

fn kinds(source: &str) -> Vec<TokenKind> {
    Lexer::tokenize_all(source).into_iter().map(|t| t.kind).collect()
}

#[test]
fn race_query_layout_balances() {
    let source = "\
import codelingo/ast/java

java.class:
  java.method(depth = any):
    name == \"updateUser\"
    block_start as startUpdate
  java.method(depth = any):
    $startUpdate < block_start
";
    let kinds = kinds(source);
    let indents = kinds.iter().filter(|k| **k == TokenKind::Indent).count();
    let dedents = kinds.iter().filter(|k| **k == TokenKind::Dedent).count();
    assert_eq!(indents, 3);
    assert_eq!(dedents, 3);
    assert_eq!(kinds.last(), Some(&TokenKind::Eof));
    assert!(!kinds.iter().any(|k| matches!(k, TokenKind::Error(_))));
}

#[test]
fn literals_and_variables() {
    assert_eq!(
        kinds("x == \"a\\\"b\", y < -2.5, $v, /a\\/b/"),
        vec![
            TokenKind::Ident("x".into()),
            TokenKind::EqEq,
            TokenKind::String("a\"b".into()),
            TokenKind::Comma,
            TokenKind::Ident("y".into()),
            TokenKind::Lt,
            TokenKind::Float(-2.5),
            TokenKind::Comma,
            TokenKind::Variable("v".into()),
            TokenKind::Comma,
            TokenKind::Regex("a/b".into()),
            TokenKind::Newline,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn annotation_payload_runs_to_end_of_line() {
    let tokens = Lexer::tokenize_all("@docs summary: value  \ngo.x\n");
    assert_eq!(
        tokens[0].kind,
        TokenKind::Annotation {
            name: "docs".into(),
            payload: "summary: value".into(),
        }
    );
}

#[test]
fn spans_are_one_based() {
    let tokens = Lexer::tokenize_all("go.file:\n  name == 1\n");
    let name = tokens
        .iter()
        .find(|t| t.kind == TokenKind::Ident("name".into()))
        .unwrap();
    assert_eq!((name.span.line, name.span.column), (2, 3));
}

#[test]
fn unterminated_string_is_an_error_token() {
    assert!(kinds("x == \"open").iter().any(|k| matches!(k, TokenKind::Error(_))));
}

proptest! {
    #[test]
    fn lexer_never_panics_and_terminates(source in "[ a-z.:()=<>!$@\"/#,\\n0-9-]{0,80}") {
        let kinds = kinds(&source);
        prop_assert_eq!(kinds.last(), Some(&TokenKind::Eof));
    }
}
