//! Parser for CLQL.
//!
//! The parser converts a stream of tokens into a `QueryFile`. It is a
//! recursive descent over the block structure, with one token of extra
//! lookahead to tell a nested selector from a predicate line.

use clql_foundation::{Error, ParseErrorKind, Result, Value};

use crate::ast::{
    Annotation, ArgValue, Block, BlockArg, BlockItem, CompareOp, Import, OperandExpr,
    PredicateExpr, QueryFile, Selector,
};
use crate::lexer::Lexer;
use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Parser for CLQL source code.
pub struct Parser<'src> {
    /// The lexer providing tokens.
    lexer: Lexer<'src>,
    /// Current token (lookahead).
    current: Token,
    /// Second token of lookahead, filled on demand.
    next: Option<Token>,
    /// Source text (for error messages).
    source: &'src str,
}

impl<'src> Parser<'src> {
    /// Creates a new parser for the given source.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            next: None,
            source,
        }
    }

    /// Parses a whole query file.
    ///
    /// # Errors
    /// Returns a `Syntax` parse error if the source is malformed.
    pub fn parse_file(&mut self) -> Result<QueryFile> {
        let mut imports = Vec::new();
        let mut blocks = Vec::new();

        self.skip_newlines();
        while self.current.kind == TokenKind::Import {
            imports.push(self.parse_import()?);
            self.skip_newlines();
        }

        while self.current.kind != TokenKind::Eof {
            match &self.current.kind {
                TokenKind::Import => {
                    return Err(self.error("imports must precede every pattern block"));
                }
                TokenKind::Indent => return Err(self.error("unexpected indentation")),
                _ => {}
            }
            let annotations = self.parse_annotations()?;
            blocks.push(self.parse_block(annotations)?);
            self.skip_newlines();
        }

        Ok(QueryFile { imports, blocks })
    }

    /// Parses `import path [as alias]`.
    fn parse_import(&mut self) -> Result<Import> {
        let start = self.current.span;
        self.expect(&TokenKind::Import)?;
        let (path, mut end) = self.expect_ident("a lexicon path after 'import'")?;

        let alias = if self.current.kind == TokenKind::As {
            self.advance();
            let (alias, alias_span) = self.expect_ident("an alias after 'as'")?;
            if alias.contains(['.', '/']) {
                return Err(self.error_at(alias_span, "import alias must be a plain name"));
            }
            end = alias_span;
            Some(alias)
        } else {
            None
        };

        self.expect_line_end()?;
        Ok(Import {
            path,
            alias,
            span: start.to(end),
        })
    }

    /// Parses zero or more annotation lines.
    fn parse_annotations(&mut self) -> Result<Vec<Annotation>> {
        let mut annotations = Vec::new();
        while let TokenKind::Annotation { name, payload } = &self.current.kind {
            annotations.push(Annotation {
                name: name.clone(),
                payload: payload.clone(),
                span: self.current.span,
            });
            self.advance();
            self.expect_line_end()?;
            self.skip_newlines();
        }
        if let Some(last) = annotations.last() {
            let span = last.span;
            if !self.at_selector() {
                return Err(self.error_at(span, "annotation must precede a fact selector"));
            }
        }
        Ok(annotations)
    }

    /// Parses a selector block: header, optional arguments, optional body.
    fn parse_block(&mut self, annotations: Vec<Annotation>) -> Result<Block> {
        let (name, selector_span) =
            self.expect_ident("a fact selector like `namespace.kind`")?;
        if !name.contains('.') {
            return Err(self.error_at(
                selector_span,
                &format!("expected a fact selector like `namespace.kind`, found `{name}`"),
            ));
        }

        let mut header_end = selector_span;
        let args = if self.current.kind == TokenKind::LParen {
            let (args, close) = self.parse_args()?;
            header_end = close;
            args
        } else {
            Vec::new()
        };

        let items = if self.current.kind == TokenKind::Colon {
            header_end = self.current.span;
            self.advance();
            if self.current.kind != TokenKind::Newline {
                return Err(self.error("expected end of line after ':'"));
            }
            self.advance();
            if self.current.kind != TokenKind::Indent {
                return Err(self.error_at(header_end, "expected an indented block after ':'"));
            }
            self.parse_body()?
        } else {
            self.expect_line_end()?;
            Vec::new()
        };

        Ok(Block {
            selector: Selector {
                name,
                span: selector_span,
            },
            args,
            annotations,
            items,
            span: selector_span.to(header_end),
        })
    }

    /// Parses `(name = value, ...)` and returns the arguments plus the
    /// span of the closing paren.
    fn parse_args(&mut self) -> Result<(Vec<BlockArg>, Span)> {
        self.expect(&TokenKind::LParen)?;
        let mut args = Vec::new();

        loop {
            let (name, name_span) = self.expect_ident("an argument name such as `depth`")?;
            self.expect(&TokenKind::Assign)?;
            let value_span = self.current.span;
            let value = match &self.current.kind {
                TokenKind::Ident(word) => ArgValue::Ident(word.clone()),
                TokenKind::Int(n) => ArgValue::Literal(Value::Int(*n)),
                TokenKind::Float(n) => ArgValue::Literal(Value::Float(*n)),
                TokenKind::String(s) => ArgValue::Literal(Value::from(s.as_str())),
                TokenKind::True => ArgValue::Literal(Value::Bool(true)),
                TokenKind::False => ArgValue::Literal(Value::Bool(false)),
                _ => {
                    return Err(self.error(&format!(
                        "expected a value for `{name}`, found {}",
                        self.current.kind.name()
                    )));
                }
            };
            self.advance();
            args.push(BlockArg {
                name,
                value,
                span: name_span.to(value_span),
            });

            if self.current.kind == TokenKind::Comma {
                self.advance();
            } else {
                break;
            }
        }

        let close = self.current.span;
        self.expect(&TokenKind::RParen)?;
        Ok((args, close))
    }

    /// Parses an indented block body up to and including its `Dedent`.
    fn parse_body(&mut self) -> Result<Vec<BlockItem>> {
        self.expect(&TokenKind::Indent)?;
        let mut items = Vec::new();

        loop {
            self.skip_newlines();
            if self.at_selector() {
                items.push(BlockItem::Child(self.parse_block(Vec::new())?));
                continue;
            }
            match &self.current.kind {
                TokenKind::Dedent => {
                    self.advance();
                    break;
                }
                TokenKind::Eof => break,
                TokenKind::Indent => return Err(self.error("unexpected indentation")),
                TokenKind::Annotation { .. } => {
                    let annotations = self.parse_annotations()?;
                    items.push(BlockItem::Child(self.parse_block(annotations)?));
                }
                TokenKind::Exclude => items.push(self.parse_exclude()?),
                _ => items.extend(self.parse_predicate_line()?),
            }
        }

        Ok(items)
    }

    /// Parses `exclude:` and its indented selector blocks.
    fn parse_exclude(&mut self) -> Result<BlockItem> {
        let span = self.current.span;
        self.expect(&TokenKind::Exclude)?;
        self.expect(&TokenKind::Colon)?;
        if self.current.kind != TokenKind::Newline {
            return Err(self.error("expected end of line after 'exclude:'"));
        }
        self.advance();
        if self.current.kind != TokenKind::Indent {
            return Err(self.error_at(span, "expected an indented block after 'exclude:'"));
        }
        self.advance();

        let mut blocks = Vec::new();
        loop {
            self.skip_newlines();
            if self.at_selector() {
                blocks.push(self.parse_block(Vec::new())?);
                continue;
            }
            match &self.current.kind {
                TokenKind::Dedent => {
                    self.advance();
                    break;
                }
                TokenKind::Eof => break,
                TokenKind::Annotation { .. } => {
                    let annotations = self.parse_annotations()?;
                    blocks.push(self.parse_block(annotations)?);
                }
                _ => return Err(self.error("'exclude' may only contain fact selectors")),
            }
        }

        Ok(BlockItem::Exclude { blocks, span })
    }

    /// Returns true if the current line starts a nested selector block.
    fn at_selector(&mut self) -> bool {
        let TokenKind::Ident(name) = &self.current.kind else {
            return false;
        };
        if !name.contains('.') {
            return false;
        }
        matches!(
            self.peek(),
            TokenKind::LParen | TokenKind::Colon | TokenKind::Newline | TokenKind::Eof
        )
    }

    /// Parses comma-separated predicates up to the end of the line.
    fn parse_predicate_line(&mut self) -> Result<Vec<BlockItem>> {
        let mut items = vec![BlockItem::Predicate(self.parse_predicate()?)];
        while self.current.kind == TokenKind::Comma {
            self.advance();
            items.push(BlockItem::Predicate(self.parse_predicate()?));
        }
        self.expect_line_end()?;
        Ok(items)
    }

    /// Parses one predicate: a regex call, a capture, or a comparison chain.
    fn parse_predicate(&mut self) -> Result<PredicateExpr> {
        if let TokenKind::Ident(name) = &self.current.kind {
            let name = name.clone();
            let span = self.current.span;
            let next = self.peek();
            let is_call = *next == TokenKind::LParen;
            let is_capture = *next == TokenKind::As;

            if is_call && name == "regex" {
                return self.parse_regex();
            }
            if is_capture {
                self.advance();
                self.advance();
                let var_span = self.current.span;
                let var = match &self.current.kind {
                    TokenKind::Ident(var) | TokenKind::Variable(var) => var.clone(),
                    _ => {
                        return Err(self.error(&format!(
                            "expected a variable name after 'as', found {}",
                            self.current.kind.name()
                        )));
                    }
                };
                self.advance();
                return Ok(PredicateExpr::Capture {
                    field: name,
                    var,
                    span: span.to(var_span),
                });
            }
        }

        let first = self.parse_operand()?;
        let start = first.span();
        let mut operands = vec![first];
        let mut ops = Vec::new();

        while let Some(op) = compare_op(&self.current.kind) {
            self.advance();
            ops.push(op);
            operands.push(self.parse_operand()?);
        }

        if ops.is_empty() {
            return Err(self.error(&format!(
                "expected a comparison operator, found {}",
                self.current.kind.name()
            )));
        }

        let end = operands.last().map_or(start, OperandExpr::span);
        Ok(PredicateExpr::Compare {
            operands,
            ops,
            span: start.to(end),
        })
    }

    /// Parses `regex(/pattern/, target)`.
    fn parse_regex(&mut self) -> Result<PredicateExpr> {
        let start = self.current.span;
        self.advance(); // consume 'regex'
        self.expect(&TokenKind::LParen)?;

        let TokenKind::Regex(pattern) = &self.current.kind else {
            return Err(self.error("expected /pattern/ as the first argument to regex"));
        };
        let pattern = pattern.clone();
        let pattern_span = self.current.span;
        self.advance();

        self.expect(&TokenKind::Comma)?;
        let target = self.parse_operand()?;
        let end = self.current.span;
        self.expect(&TokenKind::RParen)?;

        Ok(PredicateExpr::Regex {
            pattern,
            pattern_span,
            target,
            span: start.to(end),
        })
    }

    /// Parses an attribute name, variable reference, or literal.
    fn parse_operand(&mut self) -> Result<OperandExpr> {
        let span = self.current.span;
        let operand = match &self.current.kind {
            TokenKind::Ident(name) => OperandExpr::Ident(name.clone(), span),
            TokenKind::Variable(name) => OperandExpr::Var(name.clone(), span),
            TokenKind::Int(n) => OperandExpr::Literal(Value::Int(*n), span),
            TokenKind::Float(n) => OperandExpr::Literal(Value::Float(*n), span),
            TokenKind::String(s) => OperandExpr::Literal(Value::from(s.as_str()), span),
            TokenKind::True => OperandExpr::Literal(Value::Bool(true), span),
            TokenKind::False => OperandExpr::Literal(Value::Bool(false), span),
            _ => {
                return Err(self.error(&format!(
                    "expected an attribute, variable, or literal, found {}",
                    self.current.kind.name()
                )));
            }
        };
        self.advance();
        Ok(operand)
    }

    /// Skips blank logical lines.
    fn skip_newlines(&mut self) {
        while self.current.kind == TokenKind::Newline {
            self.advance();
        }
    }

    /// Advances to the next token.
    fn advance(&mut self) {
        self.current = self
            .next
            .take()
            .unwrap_or_else(|| self.lexer.next_token());
    }

    /// Returns the kind of the token after the current one.
    fn peek(&mut self) -> &TokenKind {
        let lexer = &mut self.lexer;
        &self.next.get_or_insert_with(|| lexer.next_token()).kind
    }

    /// Expects the current token to be of a specific kind, then advances.
    fn expect(&mut self, expected: &TokenKind) -> Result<()> {
        let matches =
            std::mem::discriminant(&self.current.kind) == std::mem::discriminant(expected);

        if matches {
            self.advance();
            Ok(())
        } else {
            let expected_name = expected.name();
            Err(self.error(&format!(
                "expected {expected_name}, found {}",
                self.current.kind.name()
            )))
        }
    }

    /// Expects an identifier and returns its text and span.
    fn expect_ident(&mut self, what: &str) -> Result<(String, Span)> {
        if let TokenKind::Ident(name) = &self.current.kind {
            let result = (name.clone(), self.current.span);
            self.advance();
            Ok(result)
        } else {
            Err(self.error(&format!(
                "expected {what}, found {}",
                self.current.kind.name()
            )))
        }
    }

    /// Expects the end of a logical line.
    fn expect_line_end(&mut self) -> Result<()> {
        match self.current.kind {
            TokenKind::Newline => {
                self.advance();
                Ok(())
            }
            TokenKind::Eof | TokenKind::Dedent => Ok(()),
            _ => Err(self.error(&format!(
                "unexpected {} at end of line",
                self.current.kind.name()
            ))),
        }
    }

    /// Creates a syntax error at the current position. A lexer error token
    /// reports its own message.
    fn error(&self, message: &str) -> Error {
        if let TokenKind::Error(lex_message) = &self.current.kind {
            return self.error_at(self.current.span, lex_message);
        }
        self.error_at(self.current.span, message)
    }

    /// Creates a syntax error at a specific span.
    fn error_at(&self, span: Span, message: &str) -> Error {
        parse_error_at(self.source, span, ParseErrorKind::Syntax, message)
    }
}

/// Maps a comparison token to its operator.
fn compare_op(kind: &TokenKind) -> Option<CompareOp> {
    match kind {
        TokenKind::EqEq => Some(CompareOp::Eq),
        TokenKind::NotEq => Some(CompareOp::Ne),
        TokenKind::Lt => Some(CompareOp::Lt),
        TokenKind::Gt => Some(CompareOp::Gt),
        TokenKind::LtEq => Some(CompareOp::Le),
        TokenKind::GtEq => Some(CompareOp::Ge),
        _ => None,
    }
}

/// Builds a parse error of `kind` located at `span`, carrying the source
/// line for display.
#[must_use]
pub fn parse_error_at(source: &str, span: Span, kind: ParseErrorKind, message: &str) -> Error {
    Error::parse(kind, message, span.line, span.column, span.line_text(source))
}

/// Parses CLQL source into a `QueryFile`.
///
/// # Errors
/// Returns a `Syntax` parse error if the source is malformed.
pub fn parse(source: &str) -> Result<QueryFile> {
    Parser::new(source).parse_file()
}
