//! Token types for CLQL.
//!
//! Tokens are the output of the lexer and input to the parser. Layout is
//! carried by explicit `Newline`, `Indent`, and `Dedent` tokens.

use crate::span::Span;

/// A token from lexical analysis.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    /// The type and value of this token.
    pub kind: TokenKind,
    /// Source location of this token.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns the text this token covers in the given source.
    #[must_use]
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.span.text(source)
    }

    /// Returns true if this token is a comparison operator.
    #[must_use]
    pub const fn is_comparison(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::EqEq
                | TokenKind::NotEq
                | TokenKind::Lt
                | TokenKind::Gt
                | TokenKind::LtEq
                | TokenKind::GtEq
        )
    }
}

/// Token types for CLQL.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    // Layout
    /// End of a logical line
    Newline,
    /// Indentation increased relative to the enclosing block
    Indent,
    /// Indentation returned to an enclosing block
    Dedent,

    // Punctuation
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `=` (block arguments such as `depth = any`)
    Assign,

    // Comparison operators
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    LtEq,
    /// `>=`
    GtEq,

    // Keywords
    /// `import`
    Import,
    /// `exclude`
    Exclude,
    /// `as`
    As,
    /// `true`
    True,
    /// `false`
    False,

    // Literals
    /// Integer literal like `42` or `-17`
    Int(i64),
    /// Float literal like `3.14` or `-0.5`
    Float(f64),
    /// String literal like `"writeMsg"`
    String(String),
    /// Regex literal like `/.*Msg$/` (delimiters stripped)
    Regex(String),

    // Names
    /// Identifier like `name`, `go.func_decl`, or `codelingo/ast/go`
    Ident(String),
    /// Variable reference like `$funcName` (without the `$`)
    Variable(String),
    /// Annotation like `@review comment` with its payload to end of line
    Annotation {
        /// The annotation name (`review`, `docs`, ...)
        name: String,
        /// Trimmed text following the name on the same line
        payload: String,
    },

    // Meta
    /// End of input
    Eof,
    /// Lexer error
    Error(String),
}

impl TokenKind {
    /// Returns a human-readable name for this token kind.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Newline => "end of line",
            Self::Indent => "indent",
            Self::Dedent => "dedent",
            Self::LParen => "'('",
            Self::RParen => "')'",
            Self::Comma => "','",
            Self::Colon => "':'",
            Self::Assign => "'='",
            Self::EqEq => "'=='",
            Self::NotEq => "'!='",
            Self::Lt => "'<'",
            Self::Gt => "'>'",
            Self::LtEq => "'<='",
            Self::GtEq => "'>='",
            Self::Import => "import",
            Self::Exclude => "exclude",
            Self::As => "as",
            Self::True => "true",
            Self::False => "false",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Regex(_) => "regex",
            Self::Ident(_) => "identifier",
            Self::Variable(_) => "variable",
            Self::Annotation { .. } => "annotation",
            Self::Eof => "end of input",
            Self::Error(_) => "error",
        }
    }

    /// Returns true for tokens that close a logical line.
    #[must_use]
    pub const fn ends_line(&self) -> bool {
        matches!(self, Self::Newline | Self::Eof)
    }
}
