//! Error types for CLQL.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.
//! Only compilation failures and strict traversal limits are errors; a
//! predicate that does not hold is a normal non-match and never surfaces here.

use std::fmt;

use thiserror::Error;

/// The main error type for CLQL operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates a parse error of the given kind at a source position.
    #[must_use]
    pub fn parse(
        kind: ParseErrorKind,
        message: impl Into<String>,
        line: u32,
        column: u32,
        context: impl Into<String>,
    ) -> Self {
        Self::new(ErrorKind::ParseError {
            kind,
            message: message.into(),
            line,
            column,
            context: context.into(),
        })
    }

    /// Creates a traversal limit error.
    #[must_use]
    pub fn limit_exceeded(limit: TraversalLimit) -> Self {
        Self::new(ErrorKind::LimitExceeded(limit))
    }

    /// Creates a fact decode error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Decode(message.into()))
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(message.into()))
    }

    /// Returns the parse error kind, if this is a parse error.
    #[must_use]
    pub fn parse_kind(&self) -> Option<ParseErrorKind> {
        match &self.kind {
            ErrorKind::ParseError { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Returns the 1-based line and column of a parse error.
    #[must_use]
    pub fn position(&self) -> Option<(u32, u32)> {
        match &self.kind {
            ErrorKind::ParseError { line, column, .. } => Some((*line, *column)),
            _ => None,
        }
    }
}

/// Categorized error kinds.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Query text failed to compile. Always fatal to the whole query.
    #[error("{kind} at {line}:{column}: {message}")]
    ParseError {
        /// Which compile-time check failed.
        kind: ParseErrorKind,
        /// Description of the parse error.
        message: String,
        /// Line number (1-indexed).
        line: u32,
        /// Column number (1-indexed).
        column: u32,
        /// The source line where the error occurred.
        context: String,
    },

    /// A traversal limit was hit while matching with strict limits enabled.
    #[error("traversal limit exceeded: {0}")]
    LimitExceeded(TraversalLimit),

    /// A lexicon payload could not be decoded into a fact tree.
    #[error("fact decode error: {0}")]
    Decode(String),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// The compile-time check that rejected a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// Malformed token, predicate, block, or annotation.
    Syntax,
    /// Import of an unknown lexicon, or a selector using an unimported prefix.
    UnresolvedImport,
    /// A `$variable` referenced before any capture declares it.
    UndeclaredVariable,
    /// A malformed or conflicting `depth` modifier.
    InvalidDepthSpec,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax => write!(f, "syntax error"),
            Self::UnresolvedImport => write!(f, "unresolved import"),
            Self::UndeclaredVariable => write!(f, "undeclared variable"),
            Self::InvalidDepthSpec => write!(f, "invalid depth spec"),
        }
    }
}

/// Traversal limits (kill switches) that bound matching on pathological trees.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TraversalLimit {
    /// An unbounded `depth = any` search reached the configured depth ceiling.
    DepthCeiling {
        /// The configured ceiling, in levels below the search scope.
        limit: u32,
        /// Kind of the pattern whose search was cut short.
        pattern: String,
    },
    /// The node-visit budget for one fact tree was exhausted.
    VisitBudget {
        /// The configured budget.
        limit: u64,
    },
    /// More results were produced than the configured maximum.
    MaxResults {
        /// The configured limit.
        limit: usize,
    },
}

impl fmt::Display for TraversalLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DepthCeiling { limit, pattern } => {
                write!(f, "depth ceiling ({limit}) reached while searching for {pattern}")
            }
            Self::VisitBudget { limit } => write!(f, "visit budget ({limit}) exhausted"),
            Self::MaxResults { limit } => write!(f, "max results ({limit}) exceeded"),
        }
    }
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Source name, such as a tenet name or query file.
    pub source: Option<String>,
    /// Line number in source.
    pub line: Option<u32>,
    /// Column number in source.
    pub column: Option<u32>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source name.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets the line and column.
    #[must_use]
    pub fn with_position(mut self, line: u32, column: u32) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.source {
            write!(f, "at {source}")?;
            if let (Some(line), Some(col)) = (self.line, self.column) {
                write!(f, ":{line}:{col}")?;
            }
        }
        Ok(())
    }
}
