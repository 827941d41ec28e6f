//! Integration tests for Layer 2: Language
//!
//! Tests for the lexer, parser, and import resolution.

mod lexer;
mod parser;
