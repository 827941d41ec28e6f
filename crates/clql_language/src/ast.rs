//! Abstract syntax tree for CLQL.
//!
//! The AST mirrors the block structure of a query file. Name resolution,
//! depth folding, and variable scoping happen later, when the engine
//! compiles a `QueryFile` into pattern trees.

use std::fmt;

use clql_foundation::Value;

use crate::span::Span;

/// A parsed query file: imports followed by top-level pattern blocks.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryFile {
    /// `import` statements, in source order.
    pub imports: Vec<Import>,
    /// Top-level blocks. Each becomes one pattern tree.
    pub blocks: Vec<Block>,
}

/// `import codelingo/ast/go [as alias]`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Import {
    /// Slash-separated lexicon path.
    pub path: String,
    /// Explicit alias, if given.
    pub alias: Option<String>,
    /// Location of the whole statement.
    pub span: Span,
}

/// A fact selector like `go.func_decl`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector {
    /// The selector text as written.
    pub name: String,
    /// Location of the selector.
    pub span: Span,
}

impl Selector {
    /// Splits the selector at its first `.` into `(prefix, kind)`.
    #[must_use]
    pub fn split(&self) -> Option<(&str, &str)> {
        self.name.split_once('.')
    }
}

/// One `name = value` argument in a block header, e.g. `depth = any`.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockArg {
    /// Argument name.
    pub name: String,
    /// Argument value.
    pub value: ArgValue,
    /// Location of the argument.
    pub span: Span,
}

/// The value side of a block argument.
#[derive(Clone, Debug, PartialEq)]
pub enum ArgValue {
    /// A bare word such as `any`.
    Ident(String),
    /// A literal such as `3`.
    Literal(Value),
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(name) => write!(f, "{name}"),
            Self::Literal(value) => write!(f, "{value}"),
        }
    }
}

/// An `@name payload` marker preceding a block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Annotation {
    /// Annotation name, e.g. `review` or `docs`.
    pub name: String,
    /// Uninterpreted text following the name.
    pub payload: String,
    /// Location of the annotation.
    pub span: Span,
}

/// A selector with its arguments, annotations, and body.
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    /// The fact kind this block selects.
    pub selector: Selector,
    /// Header arguments, e.g. `(depth = any)`.
    pub args: Vec<BlockArg>,
    /// Annotations written on the lines before the selector.
    pub annotations: Vec<Annotation>,
    /// Body items in source order.
    pub items: Vec<BlockItem>,
    /// Location of the block header.
    pub span: Span,
}

impl Block {
    /// Iterates over the predicates of this block, skipping children.
    pub fn predicates(&self) -> impl Iterator<Item = &PredicateExpr> {
        self.items.iter().filter_map(|item| match item {
            BlockItem::Predicate(predicate) => Some(predicate),
            _ => None,
        })
    }

    /// Iterates over nested child blocks, skipping predicates and excludes.
    pub fn children(&self) -> impl Iterator<Item = &Block> {
        self.items.iter().filter_map(|item| match item {
            BlockItem::Child(block) => Some(block),
            _ => None,
        })
    }
}

/// One item in a block body.
#[derive(Clone, Debug, PartialEq)]
pub enum BlockItem {
    /// An attribute test or capture.
    Predicate(PredicateExpr),
    /// A nested child selector.
    Child(Block),
    /// `exclude:` with its negated child selectors.
    Exclude {
        /// The negated blocks.
        blocks: Vec<Block>,
        /// Location of the `exclude` keyword.
        span: Span,
    },
}

/// Comparison operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    Le,
    /// `>=`
    Ge,
}

impl CompareOp {
    /// Returns true for the ordering operators `< > <= >=`.
    #[must_use]
    pub const fn is_ordering(self) -> bool {
        matches!(self, Self::Lt | Self::Gt | Self::Le | Self::Ge)
    }

    /// Returns the operator as written in source.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A predicate as written in a block body.
#[derive(Clone, Debug, PartialEq)]
pub enum PredicateExpr {
    /// `a op b [op c ...]`. A chain `a < b < c` holds when every adjacent
    /// pair holds, so `operands.len() == ops.len() + 1`.
    Compare {
        /// Operands in source order.
        operands: Vec<OperandExpr>,
        /// Operators between adjacent operands.
        ops: Vec<CompareOp>,
        /// Location of the whole comparison.
        span: Span,
    },
    /// `field as var`
    Capture {
        /// Attribute being captured.
        field: String,
        /// Variable receiving the value.
        var: String,
        /// Location of the capture.
        span: Span,
    },
    /// `regex(/pattern/, target)`
    Regex {
        /// Pattern text, delimiters stripped.
        pattern: String,
        /// Location of the pattern literal.
        pattern_span: Span,
        /// The operand the pattern is applied to.
        target: OperandExpr,
        /// Location of the whole call.
        span: Span,
    },
}

impl PredicateExpr {
    /// Returns the source location of this predicate.
    #[must_use]
    pub const fn span(&self) -> Span {
        match self {
            Self::Compare { span, .. } | Self::Capture { span, .. } | Self::Regex { span, .. } => {
                *span
            }
        }
    }
}

/// An operand inside a predicate.
#[derive(Clone, Debug, PartialEq)]
pub enum OperandExpr {
    /// A bare name: an attribute of the current fact.
    Ident(String, Span),
    /// A `$name` variable reference.
    Var(String, Span),
    /// A literal scalar.
    Literal(Value, Span),
}

impl OperandExpr {
    /// Returns the source location of this operand.
    #[must_use]
    pub const fn span(&self) -> Span {
        match self {
            Self::Ident(_, span) | Self::Var(_, span) | Self::Literal(_, span) => *span,
        }
    }
}
