//! Lexer, parser, and namespace resolution for the CLQL query language.
//!
//! This crate provides:
//! - `Lexer` - Indentation-aware tokenization of CLQL source
//! - `Parser` - Parsing tokens into a `QueryFile` AST
//! - `Namespaces` / `ImportTable` - Resolution of lexicon imports and selector prefixes

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ast;
pub mod lexer;
pub mod namespace;
pub mod parser;
pub mod span;
pub mod token;

pub use ast::{
    Annotation, ArgValue, Block, BlockArg, BlockItem, CompareOp, Import, OperandExpr,
    PredicateExpr, QueryFile, Selector,
};
pub use lexer::Lexer;
pub use namespace::{ImportTable, LexiconPath, Namespaces, ResolvedImport};
pub use parser::{Parser, parse, parse_error_at};
pub use span::Span;
pub use token::{Token, TokenKind};
