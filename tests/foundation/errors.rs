//! Integration tests for Error types
//!
//! Tests error construction, display, context, and error kinds.

use clql_foundation::{Error, ErrorContext, ErrorKind, ParseErrorKind, TraversalLimit};

// =============================================================================
// Error Construction
// =============================================================================

#[test]
fn parse_error_carries_kind_and_position() {
    let err = Error::parse(
        ParseErrorKind::UndeclaredVariable,
        "variable `$x` is used before it is captured",
        4,
        12,
        "    name == $x",
    );
    assert_eq!(err.parse_kind(), Some(ParseErrorKind::UndeclaredVariable));
    assert_eq!(err.position(), Some((4, 12)));
    let msg = format!("{err}");
    assert!(msg.contains("undeclared variable"));
    assert!(msg.contains("4:12"));
}

#[test]
fn limit_error() {
    let err = Error::limit_exceeded(TraversalLimit::VisitBudget { limit: 100 });
    assert!(matches!(
        err.kind,
        ErrorKind::LimitExceeded(TraversalLimit::VisitBudget { limit: 100 })
    ));
    assert!(err.parse_kind().is_none());
    assert!(err.position().is_none());
    assert!(format!("{err}").contains("100"));
}

#[test]
fn decode_and_internal_errors() {
    let err = Error::decode("truncated payload");
    assert!(matches!(err.kind, ErrorKind::Decode(_)));
    assert!(format!("{err}").contains("truncated payload"));

    let err = Error::internal("oops");
    assert!(matches!(err.kind, ErrorKind::Internal(_)));
}

#[test]
fn error_with_context() {
    let err = Error::internal("x").with_context(
        ErrorContext::new()
            .with_source("tenets/race.clql")
            .with_position(3, 1),
    );
    let context = err.context.expect("context set");
    assert_eq!(context.to_string(), "at tenets/race.clql:3:1");
}

// =============================================================================
// Limits
// =============================================================================

#[test]
fn limit_display() {
    let ceiling = TraversalLimit::DepthCeiling {
        limit: 8,
        pattern: "go.ident".into(),
    };
    assert_eq!(
        ceiling.to_string(),
        "depth ceiling (8) reached while searching for go.ident"
    );
    assert_eq!(
        TraversalLimit::MaxResults { limit: 5 }.to_string(),
        "max results (5) exceeded"
    );
}

#[test]
fn parse_error_kinds_display() {
    assert_eq!(ParseErrorKind::Syntax.to_string(), "syntax error");
    assert_eq!(ParseErrorKind::UnresolvedImport.to_string(), "unresolved import");
    assert_eq!(ParseErrorKind::InvalidDepthSpec.to_string(), "invalid depth spec");
}
