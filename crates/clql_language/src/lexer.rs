//! Lexer for CLQL.
//!
//! The lexer converts source text into a stream of tokens. Block structure
//! follows the off-side rule: a line indented deeper than the enclosing
//! block produces an `Indent` token, returning to an enclosing level
//! produces one `Dedent` per closed block. Blank lines and `#` comments do
//! not affect layout, and newlines inside parentheses are not significant.

use std::collections::VecDeque;

use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Lexer for CLQL source code.
pub struct Lexer<'src> {
    /// Source text being tokenized.
    source: &'src str,
    /// Remaining source text.
    rest: &'src str,
    /// Current byte offset in source.
    position: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based).
    column: u32,
    /// Open indentation widths. The bottom entry is always zero.
    indents: Vec<u32>,
    /// Layout tokens waiting to be handed out.
    pending: VecDeque<Token>,
    /// Nesting depth of open parentheses.
    paren_depth: u32,
    /// True when the next token is the first on a physical line.
    at_line_start: bool,
    /// True once the current logical line has produced a token.
    line_has_content: bool,
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer for the given source.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            rest: source,
            position: 0,
            line: 1,
            column: 1,
            indents: vec![0],
            pending: VecDeque::new(),
            paren_depth: 0,
            at_line_start: true,
            line_has_content: false,
        }
    }

    /// Returns the next token from the source.
    ///
    /// Once the end of input is reached, every further call returns `Eof`.
    pub fn next_token(&mut self) -> Token {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return token;
            }

            if self.at_line_start {
                self.at_line_start = false;
                if self.paren_depth == 0 {
                    self.measure_indentation();
                    continue;
                }
            }

            self.skip_inline_whitespace();

            let start = self.position;
            let start_line = self.line;
            let start_column = self.column;

            let Some(c) = self.peek_char() else {
                return self.finish();
            };

            let kind = match c {
                '\n' => {
                    self.advance();
                    self.at_line_start = true;
                    if self.paren_depth > 0 || !self.line_has_content {
                        continue;
                    }
                    self.line_has_content = false;
                    return Token::new(
                        TokenKind::Newline,
                        Span::new(start, self.position, start_line, start_column),
                    );
                }
                '(' => {
                    self.advance();
                    self.paren_depth += 1;
                    TokenKind::LParen
                }
                ')' => {
                    self.advance();
                    self.paren_depth = self.paren_depth.saturating_sub(1);
                    TokenKind::RParen
                }
                ',' => {
                    self.advance();
                    TokenKind::Comma
                }
                ':' => {
                    self.advance();
                    TokenKind::Colon
                }
                '=' => {
                    self.advance();
                    if self.eat('=') {
                        TokenKind::EqEq
                    } else {
                        TokenKind::Assign
                    }
                }
                '!' => {
                    self.advance();
                    if self.eat('=') {
                        TokenKind::NotEq
                    } else {
                        TokenKind::Error("expected '=' after '!'".into())
                    }
                }
                '<' => {
                    self.advance();
                    if self.eat('=') {
                        TokenKind::LtEq
                    } else {
                        TokenKind::Lt
                    }
                }
                '>' => {
                    self.advance();
                    if self.eat('=') {
                        TokenKind::GtEq
                    } else {
                        TokenKind::Gt
                    }
                }
                '"' => self.scan_string(),
                '/' => self.scan_regex(),
                '$' => self.scan_variable(),
                '@' => self.scan_annotation(),
                c if c.is_ascii_digit() => self.scan_number(),
                '-' | '+' if self.peek_char_n(1).is_some_and(|c| c.is_ascii_digit()) => {
                    self.scan_number()
                }
                c if is_ident_start(c) => self.scan_word(),
                c => {
                    self.advance();
                    TokenKind::Error(format!("unexpected character: {c}"))
                }
            };

            self.line_has_content = true;
            return Token::new(
                kind,
                Span::new(start, self.position, start_line, start_column),
            );
        }
    }

    /// Tokenizes all source and returns a vector of tokens ending in `Eof`.
    #[must_use]
    pub fn tokenize_all(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    /// Closes the final logical line and every open block, then yields `Eof`.
    fn finish(&mut self) -> Token {
        let span = Span::new(self.position, self.position, self.line, self.column);
        if self.line_has_content {
            self.line_has_content = false;
            return Token::new(TokenKind::Newline, span);
        }
        if self.indents.len() > 1 {
            self.indents.pop();
            return Token::new(TokenKind::Dedent, span);
        }
        Token::new(TokenKind::Eof, span)
    }

    /// Consumes leading whitespace of the next non-blank line and queues
    /// the layout tokens its indentation implies.
    fn measure_indentation(&mut self) {
        loop {
            let mut width = 0u32;
            while let Some(' ' | '\t') = self.peek_char() {
                width += 1;
                self.advance();
            }
            match self.peek_char() {
                None => return,
                Some('\n') => self.advance(),
                Some('\r') if self.peek_char_n(1) == Some('\n') => {
                    self.advance();
                    self.advance();
                }
                Some('#') => self.skip_comment(),
                Some(_) => {
                    self.apply_indentation(width);
                    return;
                }
            }
        }
    }

    fn apply_indentation(&mut self, width: u32) {
        let span = Span::new(self.position, self.position, self.line, self.column);
        let current = self.indents.last().copied().unwrap_or(0);

        if width > current {
            self.indents.push(width);
            self.pending.push_back(Token::new(TokenKind::Indent, span));
            return;
        }

        while self.indents.last().is_some_and(|&top| top > width) {
            self.indents.pop();
            self.pending.push_back(Token::new(TokenKind::Dedent, span));
        }

        if self.indents.last().copied().unwrap_or(0) != width {
            self.pending.push_back(Token::new(
                TokenKind::Error(format!(
                    "inconsistent indentation: column {} matches no enclosing block",
                    width + 1
                )),
                span,
            ));
            self.indents.push(width);
        }
    }

    /// Peeks at the next character without consuming it.
    fn peek_char(&self) -> Option<char> {
        self.rest.chars().next()
    }

    /// Peeks `n` characters ahead.
    fn peek_char_n(&self, n: usize) -> Option<char> {
        self.rest.chars().nth(n)
    }

    /// Advances past the next character.
    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            let len = c.len_utf8();
            self.rest = &self.rest[len..];
            self.position += len;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    /// Consumes `expected` if it is the next character.
    fn eat(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Skips spaces, tabs, carriage returns, and comments within a line.
    fn skip_inline_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            match c {
                ' ' | '\t' | '\r' => self.advance(),
                '#' => self.skip_comment(),
                _ => break,
            }
        }
    }

    /// Skips a `#` comment up to, but not including, the newline.
    fn skip_comment(&mut self) {
        while let Some(c) = self.peek_char() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    /// Scans a string literal.
    fn scan_string(&mut self) -> TokenKind {
        self.advance(); // consume opening '"'
        let mut text = String::new();
        loop {
            match self.peek_char() {
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    let escaped = match self.peek_char() {
                        Some('n') => '\n',
                        Some('r') => '\r',
                        Some('t') => '\t',
                        Some('\\') => '\\',
                        Some('"') => '"',
                        Some(c) => {
                            return TokenKind::Error(format!("invalid escape sequence: \\{c}"));
                        }
                        None => {
                            return TokenKind::Error(
                                "unexpected end of input in string escape".into(),
                            );
                        }
                    };
                    self.advance();
                    text.push(escaped);
                }
                Some('\n') | None => {
                    return TokenKind::Error("unterminated string literal".into());
                }
                Some(c) => {
                    self.advance();
                    text.push(c);
                }
            }
        }
        TokenKind::String(text)
    }

    /// Scans a `/regex/` literal. `\/` yields a literal slash; every other
    /// escape is kept verbatim for the regex engine.
    fn scan_regex(&mut self) -> TokenKind {
        self.advance(); // consume opening '/'
        let mut pattern = String::new();
        loop {
            match self.peek_char() {
                Some('/') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    match self.peek_char() {
                        Some('/') => pattern.push('/'),
                        Some('\n') | None => {
                            return TokenKind::Error("unterminated regex literal".into());
                        }
                        Some(c) => {
                            pattern.push('\\');
                            pattern.push(c);
                        }
                    }
                    self.advance();
                }
                Some('\n') | None => {
                    return TokenKind::Error("unterminated regex literal".into());
                }
                Some(c) => {
                    self.advance();
                    pattern.push(c);
                }
            }
        }
        TokenKind::Regex(pattern)
    }

    /// Scans a `$variable` reference.
    fn scan_variable(&mut self) -> TokenKind {
        self.advance(); // consume '$'
        if !self.peek_char().is_some_and(is_ident_start) {
            return TokenKind::Error("expected variable name after '$'".into());
        }
        TokenKind::Variable(self.scan_ident_text())
    }

    /// Scans an `@name payload` annotation. The payload runs to end of line.
    fn scan_annotation(&mut self) -> TokenKind {
        self.advance(); // consume '@'
        if !self.peek_char().is_some_and(is_ident_start) {
            return TokenKind::Error("expected annotation name after '@'".into());
        }
        let name = self.scan_ident_text();
        let start = self.position;
        while self.peek_char().is_some_and(|c| c != '\n') {
            self.advance();
        }
        let payload = self.source[start..self.position].trim().to_string();
        TokenKind::Annotation { name, payload }
    }

    /// Scans a number (integer or float).
    fn scan_number(&mut self) -> TokenKind {
        let start = self.position;
        let mut has_dot = false;

        if self.peek_char() == Some('-') || self.peek_char() == Some('+') {
            self.advance();
        }

        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                self.advance();
            } else if c == '.'
                && !has_dot
                && self.peek_char_n(1).is_some_and(|c| c.is_ascii_digit())
            {
                has_dot = true;
                self.advance();
            } else {
                break;
            }
        }

        let text = &self.source[start..self.position];

        if has_dot {
            match text.parse::<f64>() {
                Ok(n) => TokenKind::Float(n),
                Err(e) => TokenKind::Error(format!("invalid float: {e}")),
            }
        } else {
            match text.parse::<i64>() {
                Ok(n) => TokenKind::Int(n),
                Err(e) => TokenKind::Error(format!("invalid integer: {e}")),
            }
        }
    }

    /// Scans an identifier or keyword.
    fn scan_word(&mut self) -> TokenKind {
        let name = self.scan_ident_text();
        match name.as_str() {
            "import" => TokenKind::Import,
            "exclude" => TokenKind::Exclude,
            "as" => TokenKind::As,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            _ => TokenKind::Ident(name),
        }
    }

    fn scan_ident_text(&mut self) -> String {
        let start = self.position;
        while self.peek_char().is_some_and(is_ident_char) {
            self.advance();
        }
        self.source[start..self.position].to_string()
    }
}

/// Returns true if `c` can start an identifier.
fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

/// Returns true if `c` can appear in an identifier after the first character.
fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | '/' | '-')
}
